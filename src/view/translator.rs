//! Native event translation
//!
//! Tracks the load state of the current document and turns native payloads
//! into caller notifications. Events from a superseded load are dropped.

use log::debug;

use super::params::SourceLocator;
use super::surface::{LoadId, NativeEnvelope, NativeEvent, PageChangePayload};

/// Load state of the document shown by the view
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No source set
    #[default]
    NoDocument,
    /// Source applied, nothing reported yet
    Loading { load: LoadId },
    /// At least one page-change event received for the current load
    Ready {
        load: LoadId,
        current_page: u32,
        total_pages: u32,
    },
    /// The native layer could not open the document
    Failed { load: LoadId },
}

impl LoadState {
    /// Load the state belongs to, if any
    #[must_use]
    pub fn load(&self) -> Option<LoadId> {
        match self {
            Self::NoDocument => None,
            Self::Loading { load } | Self::Ready { load, .. } | Self::Failed { load } => Some(*load),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Public shape of a page-change event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageChange {
    /// Zero-based, exactly as the native layer reports it
    pub page: u32,
    pub total_pages: u32,
}

impl PageChange {
    /// Rejects the native "no position" sentinel (negative values)
    #[must_use]
    pub fn from_payload(payload: PageChangePayload) -> Option<Self> {
        Some(Self {
            page: u32::try_from(payload.position).ok()?,
            total_pages: u32::try_from(payload.total).ok()?,
        })
    }
}

/// Details passed to the error callback
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadFailure {
    pub source: Option<SourceLocator>,
    /// Native explanation, when the platform provides one
    pub reason: Option<String>,
}

/// What the caller has to be told
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    PageChanged(PageChange),
    LoadFailed(LoadFailure),
}

/// Inputs that drive the translator
#[derive(Clone, Debug)]
pub enum Signal {
    /// A source (or none) was applied to the surface
    SourceApplied {
        load: Option<LoadId>,
        source: Option<SourceLocator>,
    },
    /// An event arrived from the native surface
    Native(NativeEnvelope),
    /// The surface was torn down
    Unmounted,
}

/// State machine over native page events
#[derive(Debug, Default)]
pub struct EventTranslator {
    state: LoadState,
    source: Option<SourceLocator>,
}

impl EventTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Apply a signal and return the notification it produces, if any
    pub fn apply(&mut self, signal: Signal) -> Option<Notification> {
        match signal {
            Signal::SourceApplied { load, source } => {
                self.state = match load {
                    Some(load) => LoadState::Loading { load },
                    None => LoadState::NoDocument,
                };
                self.source = source;
                None
            }

            Signal::Unmounted => {
                self.state = LoadState::NoDocument;
                self.source = None;
                None
            }

            Signal::Native(envelope) => self.translate(envelope),
        }
    }

    fn translate(&mut self, envelope: NativeEnvelope) -> Option<Notification> {
        let Some(current) = self.state.load() else {
            debug!("Discarding native event with no document: {envelope:?}");
            return None;
        };

        if envelope.load != current {
            debug!(
                "Discarding stale native event for {:?} (current {current:?})",
                envelope.load
            );
            return None;
        }

        match envelope.event {
            NativeEvent::PageChange(payload) => {
                if self.state.is_failed() {
                    debug!("Ignoring page change for failed load {current:?}");
                    return None;
                }

                let Some(change) = PageChange::from_payload(payload) else {
                    debug!("Ignoring page change without position: {payload:?}");
                    return None;
                };

                self.state = LoadState::Ready {
                    load: current,
                    current_page: change.page,
                    total_pages: change.total_pages,
                };
                Some(Notification::PageChanged(change))
            }

            NativeEvent::LoadFailed { reason } => {
                if self.state.is_failed() {
                    return None;
                }

                self.state = LoadState::Failed { load: current };
                Some(Notification::LoadFailed(LoadFailure {
                    source: self.source.clone(),
                    reason,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::surface::SurfaceId;
    use super::*;

    fn page(load: u64, position: i32, total: i32) -> Signal {
        Signal::Native(NativeEnvelope {
            surface: SurfaceId(1),
            load: LoadId(load),
            event: NativeEvent::PageChange(PageChangePayload { position, total }),
        })
    }

    fn failure(load: u64) -> Signal {
        Signal::Native(NativeEnvelope {
            surface: SurfaceId(1),
            load: LoadId(load),
            event: NativeEvent::LoadFailed { reason: None },
        })
    }

    fn loading(load: u64) -> Signal {
        Signal::SourceApplied {
            load: Some(LoadId(load)),
            source: SourceLocator::parse("file:///a.pdf").ok(),
        }
    }

    #[test]
    fn starts_without_document_and_ignores_events() {
        let mut translator = EventTranslator::new();
        assert_eq!(translator.state(), &LoadState::NoDocument);
        assert_eq!(translator.apply(page(1, 0, 3)), None);
    }

    #[test]
    fn first_page_event_makes_the_document_ready() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));
        assert_eq!(translator.state(), &LoadState::Loading { load: LoadId(1) });

        let notification = translator.apply(page(1, 3, 10));
        assert_eq!(
            notification,
            Some(Notification::PageChanged(PageChange {
                page: 3,
                total_pages: 10
            }))
        );
        assert_eq!(
            translator.state(),
            &LoadState::Ready {
                load: LoadId(1),
                current_page: 3,
                total_pages: 10
            }
        );
    }

    #[test]
    fn zero_total_is_a_valid_transient_value() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));

        let notification = translator.apply(page(1, 0, 0));
        assert!(matches!(notification, Some(Notification::PageChanged(_))));
    }

    #[test]
    fn negative_positions_are_ignored() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));

        assert_eq!(translator.apply(page(1, -1, 5)), None);
        assert_eq!(translator.state(), &LoadState::Loading { load: LoadId(1) });
    }

    #[test]
    fn failure_is_reported_once_and_blocks_page_events() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));

        let first = translator.apply(failure(1));
        assert!(matches!(first, Some(Notification::LoadFailed(_))));
        assert_eq!(translator.apply(failure(1)), None);
        assert_eq!(translator.apply(page(1, 0, 1)), None);
        assert_eq!(translator.state(), &LoadState::Failed { load: LoadId(1) });
    }

    #[test]
    fn failure_carries_the_failed_source() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));

        let Some(Notification::LoadFailed(reported)) = translator.apply(failure(1)) else {
            panic!("expected a load failure");
        };
        assert_eq!(reported.source.unwrap().as_str(), "file:///a.pdf");
    }

    #[test]
    fn stale_load_events_are_discarded() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));
        translator.apply(page(1, 5, 20));
        translator.apply(loading(2));

        assert_eq!(translator.apply(page(1, 6, 20)), None);
        assert_eq!(translator.apply(failure(1)), None);
        assert_eq!(translator.state(), &LoadState::Loading { load: LoadId(2) });
    }

    #[test]
    fn new_source_leaves_failed_state() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));
        translator.apply(failure(1));
        translator.apply(loading(2));

        assert!(translator.apply(page(2, 0, 2)).is_some());
    }

    #[test]
    fn unmount_resets_to_no_document() {
        let mut translator = EventTranslator::new();
        translator.apply(loading(1));
        translator.apply(Signal::Unmounted);

        assert_eq!(translator.state(), &LoadState::NoDocument);
        assert_eq!(translator.apply(page(1, 0, 1)), None);
    }
}
