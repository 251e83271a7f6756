//! PDF renderer view component
//!
//! Ties the normalizer, the surface adapter and the event translator together
//! behind the operations a host UI performs: mount, re-render with a new
//! configuration, pump native events, unmount.

use log::{error, info, warn};

use super::adapter::{MountOutcome, ParamsUpdate, SurfaceAdapter};
use super::config::{Limitation, ParamsMemo, ViewConfiguration, normalize};
use super::error::ViewError;
use super::surface::SurfaceFactory;
use super::translator::{EventTranslator, LoadFailure, LoadState, Notification, Signal};

type PageChangeCallback = Box<dyn FnMut(u32, u32)>;
type ErrorCallback = Box<dyn FnMut(&LoadFailure)>;

/// Pagination state held by the host and fed by the page-change callback
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageState {
    /// Zero-based
    pub current_page: u32,
    /// 0 until the renderer reports a count
    pub total_pages: u32,
}

impl PageState {
    pub fn set(&mut self, current_page: u32, total_pages: u32) {
        self.current_page = current_page;
        self.total_pages = total_pages;
    }

    /// One-based "page/total" label
    #[must_use]
    pub fn indicator(&self) -> String {
        format!("{}/{}", self.current_page.saturating_add(1), self.total_pages)
    }
}

/// What a re-render did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOutcome {
    pub params: ParamsUpdate,
    /// A structural parameter changed but the live surface keeps its
    /// original value until it is remounted
    pub structural_ignored: bool,
}

/// Embeddable page view over a native rendering surface
///
/// Structural parameters (`distance_between_pages`, `max_page_resolution`)
/// are read only at mount. Changing them on a live view has no effect; call
/// [`PdfRendererView::remount`] (or unmount and mount) to apply them.
pub struct PdfRendererView<F: SurfaceFactory> {
    adapter: SurfaceAdapter<F>,
    translator: EventTranslator,
    memo: ParamsMemo,
    on_page_change: Option<PageChangeCallback>,
    on_error: Option<ErrorCallback>,
    limitations: Vec<Limitation>,
}

impl<F: SurfaceFactory> PdfRendererView<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            adapter: SurfaceAdapter::new(factory),
            translator: EventTranslator::new(),
            memo: ParamsMemo::new(),
            on_page_change: None,
            on_error: None,
            limitations: Vec::new(),
        }
    }

    /// Invoked with the zero-based page index and the page count
    #[must_use]
    pub fn on_page_change(mut self, callback: impl FnMut(u32, u32) + 'static) -> Self {
        self.set_on_page_change(callback);
        self
    }

    /// Invoked once per failed document load
    #[must_use]
    pub fn on_error(mut self, callback: impl FnMut(&LoadFailure) + 'static) -> Self {
        self.set_on_error(callback);
        self
    }

    pub fn set_on_page_change(&mut self, callback: impl FnMut(u32, u32) + 'static) {
        self.on_page_change = Some(Box::new(callback));
    }

    pub fn set_on_error(&mut self, callback: impl FnMut(&LoadFailure) + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    /// Create the native surface; on a mounted view this is a plain update
    pub fn mount(&mut self, config: &ViewConfiguration) -> Result<(), ViewError> {
        if self.adapter.is_mounted() {
            return self.update(config).map(|_| ());
        }

        let resolved = normalize(config);
        self.limitations.clone_from(&resolved.limitations);

        if let MountOutcome::Mounted { load } = self.adapter.mount(&resolved)? {
            let params = self.memo.resolve(resolved.params);
            self.translator.apply(Signal::SourceApplied {
                load,
                source: params.source.clone(),
            });
        }
        Ok(())
    }

    /// Apply a new configuration to the live surface
    pub fn update(&mut self, config: &ViewConfiguration) -> Result<RenderOutcome, ViewError> {
        let Some(live_structural) = self.adapter.structural() else {
            return Err(ViewError::NotMounted);
        };

        let resolved = normalize(config);
        self.limitations.clone_from(&resolved.limitations);

        let structural_ignored = live_structural != resolved.structural;
        if structural_ignored {
            warn!(
                "Structural parameters changed on a live view ({live_structural:?} -> {:?}); remount to apply them",
                resolved.structural
            );
        }

        let params = self.memo.resolve(resolved.params);
        let source = params.source.clone();
        let update = self.adapter.update(params)?;

        match update {
            ParamsUpdate::Forwarded {
                new_load: Some(load),
            } => {
                self.translator.apply(Signal::SourceApplied {
                    load: Some(load),
                    source,
                });
            }
            ParamsUpdate::Cleared => {
                self.translator.apply(Signal::SourceApplied {
                    load: None,
                    source: None,
                });
            }
            ParamsUpdate::Forwarded { new_load: None }
            | ParamsUpdate::Unchanged
            | ParamsUpdate::Withheld => {}
        }

        Ok(RenderOutcome {
            params: update,
            structural_ignored,
        })
    }

    /// Render pass entry point: mounts or updates and never fails.
    ///
    /// Errors are logged; returns whether the surface is live afterwards.
    pub fn render(&mut self, config: &ViewConfiguration) -> bool {
        let result = if self.adapter.is_mounted() {
            self.update(config).map(|_| ())
        } else {
            self.mount(config)
        };

        if let Err(e) = result {
            error!("PDF view render failed: {e}");
        }
        self.adapter.is_mounted()
    }

    /// Destroy the native surface; pending events are discarded
    pub fn unmount(&mut self) -> bool {
        let was_mounted = self.adapter.unmount();
        self.translator.apply(Signal::Unmounted);
        self.memo.clear();
        was_mounted
    }

    /// Host visibility toggle: mount when shown, unmount when hidden
    pub fn set_visible(&mut self, visible: bool, config: &ViewConfiguration) -> Result<(), ViewError> {
        match (visible, self.adapter.is_mounted()) {
            (true, false) => self.mount(config),
            (false, true) => {
                self.unmount();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Recreate the surface so structural parameters take effect
    pub fn remount(&mut self, config: &ViewConfiguration) -> Result<(), ViewError> {
        info!("Remounting PDF view");
        self.unmount();
        self.mount(config)
    }

    /// Load the current source again, e.g. after a failure.
    ///
    /// Returns false when there is no source to reload.
    pub fn retry(&mut self) -> Result<bool, ViewError> {
        let Some(load) = self.adapter.reload()? else {
            return Ok(false);
        };

        let source = self
            .adapter
            .applied()
            .and_then(|params| params.source.clone());
        self.translator.apply(Signal::SourceApplied {
            load: Some(load),
            source,
        });
        Ok(true)
    }

    /// Deliver pending native events to the callbacks.
    ///
    /// Returns the number of callbacks invoked.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        for envelope in self.adapter.drain_events() {
            if let Some(notification) = self.translator.apply(Signal::Native(envelope)) {
                self.dispatch(notification);
                delivered += 1;
            }
        }
        delivered
    }

    fn dispatch(&mut self, notification: Notification) {
        match notification {
            Notification::PageChanged(change) => {
                if let Some(callback) = self.on_page_change.as_mut() {
                    callback(change.page, change.total_pages);
                }
            }
            Notification::LoadFailed(failure) => {
                warn!(
                    "Document failed to load: {:?} ({})",
                    failure.source,
                    failure.reason.as_deref().unwrap_or("no reason given")
                );
                if let Some(callback) = self.on_error.as_mut() {
                    callback(&failure);
                }
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> &LoadState {
        self.translator.state()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.adapter.is_mounted()
    }

    /// Limitations hit by the most recent configuration
    #[must_use]
    pub fn limitations(&self) -> &[Limitation] {
        &self.limitations
    }

    #[must_use]
    pub fn adapter(&self) -> &SurfaceAdapter<F> {
        &self.adapter
    }
}
