// Export modules for use in tests
pub mod acquisition;
pub mod command_source;
pub mod sample_app;
pub mod settings;
pub mod view;

pub mod test_utils;

// Re-export the view's public surface
pub use view::{
    LoadFailure, LoadState, PageState, PdfRendererView, ViewConfiguration, ViewError, ViewStyle,
};
