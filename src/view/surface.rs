//! Boundary with the native page-rendering surface

use flume::Sender;
use serde::Deserialize;

use super::error::SurfaceError;
use super::params::{ResolvedParameters, StructuralParameters};
use super::style::ResolvedStyle;

const PAGE_CHANGE_EVENT: &str = "onPageChange";
const ERROR_EVENT: &str = "onError";

/// Identifies one native surface instance for the lifetime of an adapter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Identifies one document load; a new id is issued whenever the source changes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(pub u64);

/// Page-change payload as the native layer reports it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PageChangePayload {
    /// Zero-based index of the current page; negative when nothing is visible
    pub position: i32,
    /// Page count; 0 until the renderer has indexed the document
    pub total: i32,
}

/// Raw events emitted by the native surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeEvent {
    PageChange(PageChangePayload),
    LoadFailed { reason: Option<String> },
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    reason: Option<String>,
}

/// Failure to decode a marshalled native event
#[derive(Debug, thiserror::Error)]
pub enum DecodeEventError {
    #[error("unknown native event {0}")]
    Unknown(String),

    #[error("malformed {name} payload")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NativeEvent {
    /// Decode an event marshalled by a native bridge as name + JSON payload
    pub fn decode(name: &str, payload: &str) -> Result<Self, DecodeEventError> {
        let malformed = |source| DecodeEventError::Payload {
            name: name.to_string(),
            source,
        };

        match name {
            PAGE_CHANGE_EVENT | "pageChange" => serde_json::from_str(payload)
                .map(NativeEvent::PageChange)
                .map_err(malformed),
            ERROR_EVENT | "error" => {
                let parsed = if payload.trim().is_empty() {
                    ErrorPayload::default()
                } else {
                    serde_json::from_str(payload).map_err(malformed)?
                };
                Ok(NativeEvent::LoadFailed {
                    reason: parsed.reason,
                })
            }
            other => Err(DecodeEventError::Unknown(other.to_string())),
        }
    }
}

/// A native event tagged with the surface and load it originated from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeEnvelope {
    pub surface: SurfaceId,
    pub load: LoadId,
    pub event: NativeEvent,
}

/// Sending half of a surface's event channel, handed to the native side
///
/// Emitting after the owning view was unmounted is harmless: the receiver is
/// gone and the event is dropped.
#[derive(Clone, Debug)]
pub struct SurfaceEvents {
    surface: SurfaceId,
    tx: Sender<NativeEnvelope>,
}

impl SurfaceEvents {
    pub(crate) fn new(surface: SurfaceId, tx: Sender<NativeEnvelope>) -> Self {
        Self { surface, tx }
    }

    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Returns false when the view no longer listens
    pub fn emit(&self, load: LoadId, event: NativeEvent) -> bool {
        self.tx
            .send(NativeEnvelope {
                surface: self.surface,
                load,
                event,
            })
            .is_ok()
    }

    pub fn page_changed(&self, load: LoadId, position: i32, total: i32) -> bool {
        self.emit(
            load,
            NativeEvent::PageChange(PageChangePayload { position, total }),
        )
    }

    pub fn load_failed(&self, load: LoadId, reason: Option<String>) -> bool {
        self.emit(load, NativeEvent::LoadFailed { reason })
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.tx.is_disconnected()
    }
}

/// Everything a native surface receives at creation time
#[derive(Clone, Debug)]
pub struct SurfaceSetup {
    pub id: SurfaceId,
    pub structural: StructuralParameters,
    pub style: ResolvedStyle,
    pub test_id: Option<String>,
    pub events: SurfaceEvents,
}

/// A live native page view
pub trait NativeSurface {
    /// Apply the full live parameter record.
    ///
    /// `load` changes only when the source changes; the surface tags every
    /// event of that document with it.
    fn apply_params(&mut self, params: &ResolvedParameters, load: LoadId)
    -> Result<(), SurfaceError>;

    /// Drop the current document without loading another one
    fn clear(&mut self) {}

    /// Release native resources; called exactly once
    fn destroy(&mut self);
}

/// Creates native surfaces for the adapter
pub trait SurfaceFactory {
    type Surface: NativeSurface;

    fn create(&mut self, setup: SurfaceSetup) -> Result<Self::Surface, SurfaceError>;
}
