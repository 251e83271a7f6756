//! Embeddable PDF page view
//!
//! Binds a caller-facing configuration to a native page-rendering surface and
//! bridges the surface's events back into application callbacks. Decoding and
//! rasterization stay on the native side.

mod adapter;
mod component;
mod config;
mod error;
pub mod loopback;
mod params;
mod style;
mod surface;
mod translator;

pub use adapter::{MountOutcome, ParamsUpdate, SurfaceAdapter};
pub use component::{PageState, PdfRendererView, RenderOutcome};
pub use config::{Limitation, ParamsMemo, ResolvedConfiguration, ViewConfiguration, normalize};
pub use error::{SourceError, SurfaceError, ViewError};
pub use params::{
    NATIVE_PARAMS_VERSION, ResolvedParameters, SourceLocator, StructuralParameters,
};
pub use style::{ResolvedStyle, ViewStyle};
pub use surface::{
    DecodeEventError, LoadId, NativeEnvelope, NativeEvent, NativeSurface, PageChangePayload, SurfaceEvents,
    SurfaceFactory, SurfaceId, SurfaceSetup,
};
pub use translator::{EventTranslator, LoadFailure, LoadState, Notification, PageChange, Signal};

/// Default spacing between pages, in display units
pub const DEFAULT_DISTANCE_BETWEEN_PAGES: f32 = 16.0;

/// Default maximum zoom factor
pub const DEFAULT_MAX_ZOOM: f32 = 5.0;

/// Default ceiling for rasterized page bitmaps while zooming, in pixels
pub const DEFAULT_MAX_PAGE_RESOLUTION: f32 = 2048.0;

/// Zoom level the native surface starts at; a max zoom below it is meaningless
pub const MIN_ZOOM: f32 = 1.0;

/// Smallest resolution ceiling the normalizer lets through
pub const MIN_PAGE_RESOLUTION: f32 = 1.0;
