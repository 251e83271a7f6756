//! Error types for the page view

/// Why a locator cannot be used as a document source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("source locator is empty")]
    Empty,

    #[error("remote locator {locator} must be downloaded before it is shown")]
    Remote { locator: String },
}

/// Errors reported by a native surface
#[derive(Debug, Clone, thiserror::Error)]
pub enum SurfaceError {
    /// The native view could not be created
    #[error("native surface creation failed: {detail}")]
    Create { detail: String },

    /// The host tore the native view down while it was being configured
    #[error("native surface detached")]
    Detached,

    /// The document could not be opened (corrupted, unreadable, unsupported)
    #[error("document load failed: {detail}")]
    Load { detail: String },
}

impl SurfaceError {
    pub fn create(detail: impl Into<String>) -> Self {
        Self::Create {
            detail: detail.into(),
        }
    }

    pub fn load(detail: impl Into<String>) -> Self {
        Self::Load {
            detail: detail.into(),
        }
    }
}

/// Errors returned by the adapter and the component
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("failed to mount native surface")]
    Mount(#[source] SurfaceError),

    #[error("native surface rejected parameters")]
    Update(#[source] SurfaceError),

    #[error("view is not mounted")]
    NotMounted,
}
