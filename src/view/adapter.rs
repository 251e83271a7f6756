//! Native surface adapter - owns the surface lifetime and its event channel

use std::sync::Arc;

use flume::Receiver;
use log::{debug, info, warn};

use super::config::ResolvedConfiguration;
use super::error::{SurfaceError, ViewError};
use super::params::{ResolvedParameters, StructuralParameters};
use super::surface::{
    LoadId, NativeEnvelope, NativeSurface, SurfaceEvents, SurfaceFactory, SurfaceId, SurfaceSetup,
};

/// Result of forwarding live parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamsUpdate {
    /// Deep-equal to what the surface already has; nothing was sent
    Unchanged,
    /// Full record sent; `new_load` is set when a new document load began
    Forwarded { new_load: Option<LoadId> },
    /// Source removed; the surface dropped its document
    Cleared,
    /// No source yet, so the surface was not told anything
    Withheld,
}

/// Result of a mount request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountOutcome {
    /// A surface was already live; nothing changed
    AlreadyMounted,
    /// A new surface was created; `load` is set when a document load began
    Mounted { load: Option<LoadId> },
}

/// A live native surface plus everything tied to its lifetime.
///
/// Dropping it destroys the surface and closes the event channel, so every
/// exit path (unmount, failed mount, adapter drop, unwinding) releases it.
struct MountedSurface<S: NativeSurface> {
    id: SurfaceId,
    surface: S,
    events: SurfaceEvents,
    rx: Receiver<NativeEnvelope>,
    structural: StructuralParameters,
    applied: Arc<ResolvedParameters>,
    load: Option<LoadId>,
}

impl<S: NativeSurface> MountedSurface<S> {
    /// Send `params` to the surface; load failures go through the event channel
    fn forward(&mut self, params: &ResolvedParameters, load: LoadId) -> Result<(), SurfaceError> {
        match self.surface.apply_params(params, load) {
            Ok(()) => Ok(()),
            Err(SurfaceError::Load { detail }) => {
                warn!("Native surface {:?} failed to load document: {detail}", self.id);
                self.events.load_failed(load, Some(detail));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl<S: NativeSurface> Drop for MountedSurface<S> {
    fn drop(&mut self) {
        self.surface.destroy();
        debug!("Destroyed native surface {:?}", self.id);
    }
}

/// Keeps one native surface in sync with the latest resolved parameters
pub struct SurfaceAdapter<F: SurfaceFactory> {
    factory: F,
    mounted: Option<MountedSurface<F::Surface>>,
    next_surface_id: u64,
    next_load_id: u64,
}

fn bump(counter: &mut u64) -> u64 {
    let id = *counter;
    *counter += 1;
    id
}

impl<F: SurfaceFactory> SurfaceAdapter<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            mounted: None,
            next_surface_id: 1,
            next_load_id: 1,
        }
    }

    /// Create the native surface with the structural parameters of `config`
    /// and forward its live parameters when a source is set.
    pub fn mount(&mut self, config: &ResolvedConfiguration) -> Result<MountOutcome, ViewError> {
        if self.mounted.is_some() {
            debug!("Mount requested while already mounted, ignoring");
            return Ok(MountOutcome::AlreadyMounted);
        }

        let id = SurfaceId(bump(&mut self.next_surface_id));
        let (tx, rx) = flume::unbounded();
        let events = SurfaceEvents::new(id, tx);

        let surface = self
            .factory
            .create(SurfaceSetup {
                id,
                structural: config.structural,
                style: config.style.clone(),
                test_id: config.test_id.clone(),
                events: events.clone(),
            })
            .map_err(ViewError::Mount)?;

        let mut mounted = MountedSurface {
            id,
            surface,
            events,
            rx,
            structural: config.structural,
            applied: Arc::new(config.params.clone()),
            load: None,
        };

        if mounted.applied.source.is_some() {
            let load = LoadId(bump(&mut self.next_load_id));
            let params = Arc::clone(&mounted.applied);
            // on error `mounted` is dropped here, which destroys the surface
            mounted.forward(&params, load).map_err(ViewError::Mount)?;
            mounted.load = Some(load);
        }

        info!(
            "Mounted native surface {id:?} (source: {:?})",
            mounted.applied.source
        );
        let load = mounted.load;
        self.mounted = Some(mounted);
        Ok(MountOutcome::Mounted { load })
    }

    /// Forward `params` unless deep-equal to what is already applied
    pub fn update(&mut self, params: Arc<ResolvedParameters>) -> Result<ParamsUpdate, ViewError> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Err(ViewError::NotMounted);
        };

        if Arc::ptr_eq(&mounted.applied, &params) || *mounted.applied == *params {
            return Ok(ParamsUpdate::Unchanged);
        }

        let source_changed = mounted.applied.source_differs(&params);

        if params.source.is_none() {
            mounted.applied = params;
            if source_changed {
                mounted.surface.clear();
                mounted.load = None;
                debug!("Cleared document from surface {:?}", mounted.id);
                return Ok(ParamsUpdate::Cleared);
            }
            return Ok(ParamsUpdate::Withheld);
        }

        let (load, new_load) = match mounted.load {
            Some(load) if !source_changed => (load, None),
            _ => {
                let load = LoadId(bump(&mut self.next_load_id));
                (load, Some(load))
            }
        };

        // the previous record stays applied until the surface accepts this one
        mounted.forward(&params, load).map_err(ViewError::Update)?;
        mounted.applied = params;
        mounted.load = Some(load);
        debug!(
            "Forwarded parameters to surface {:?}: {:?}",
            mounted.id, mounted.applied
        );
        Ok(ParamsUpdate::Forwarded { new_load })
    }

    /// Re-send the current source under a fresh load id
    pub fn reload(&mut self) -> Result<Option<LoadId>, ViewError> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Err(ViewError::NotMounted);
        };

        if mounted.applied.source.is_none() {
            return Ok(None);
        }

        let load = LoadId(bump(&mut self.next_load_id));
        let params = Arc::clone(&mounted.applied);
        mounted.forward(&params, load).map_err(ViewError::Update)?;
        mounted.load = Some(load);
        info!("Reloading document on surface {:?}", mounted.id);
        Ok(Some(load))
    }

    /// Drain events the native surface has emitted since the last call
    pub fn drain_events(&mut self) -> Vec<NativeEnvelope> {
        let Some(mounted) = self.mounted.as_ref() else {
            return Vec::new();
        };

        mounted
            .rx
            .try_iter()
            .filter(|envelope| envelope.surface == mounted.id)
            .collect()
    }

    /// Destroy the surface; returns false if nothing was mounted
    pub fn unmount(&mut self) -> bool {
        match self.mounted.take() {
            Some(mounted) => {
                info!("Unmounting native surface {:?}", mounted.id);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    #[must_use]
    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.mounted.as_ref().map(|m| m.id)
    }

    /// Load currently applied to the surface
    #[must_use]
    pub fn current_load(&self) -> Option<LoadId> {
        self.mounted.as_ref().and_then(|m| m.load)
    }

    #[must_use]
    pub fn applied(&self) -> Option<&Arc<ResolvedParameters>> {
        self.mounted.as_ref().map(|m| &m.applied)
    }

    /// Structural parameters the live surface was created with
    #[must_use]
    pub fn structural(&self) -> Option<StructuralParameters> {
        self.mounted.as_ref().map(|m| m.structural)
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::super::config::{ViewConfiguration, normalize};
    use super::super::loopback::LoopbackFactory;
    use super::*;

    fn resolved(config: ViewConfiguration) -> ResolvedConfiguration {
        normalize(&config)
    }

    #[test]
    fn mount_without_source_sends_nothing() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);

        let outcome = adapter.mount(&resolved(ViewConfiguration::new())).unwrap();

        assert_eq!(outcome, MountOutcome::Mounted { load: None });
        assert_eq!(handle.created(), 1);
        assert!(handle.applied_blobs().is_empty());
    }

    #[test]
    fn second_mount_is_a_no_op() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        let config = resolved(ViewConfiguration::new().with_source("file:///a.pdf"));

        adapter.mount(&config).unwrap();
        assert_eq!(adapter.mount(&config).unwrap(), MountOutcome::AlreadyMounted);
        assert_eq!(handle.created(), 1);
        assert_eq!(handle.applied_blobs().len(), 1);
    }

    #[test]
    fn unchanged_parameters_issue_no_native_calls() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        let config = resolved(ViewConfiguration::new().with_source("file:///a.pdf"));
        adapter.mount(&config).unwrap();

        let update = adapter.update(Arc::new(config.params.clone())).unwrap();

        assert_eq!(update, ParamsUpdate::Unchanged);
        assert_eq!(handle.applied_blobs().len(), 1);
    }

    #[test]
    fn live_change_keeps_the_load_and_source_change_starts_a_new_one() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        let config = resolved(ViewConfiguration::new().with_source("file:///a.pdf"));
        adapter.mount(&config).unwrap();
        let first_load = adapter.current_load();

        let zoomed = resolved(
            ViewConfiguration::new()
                .with_source("file:///a.pdf")
                .with_max_zoom(8.0),
        );
        let update = adapter.update(Arc::new(zoomed.params)).unwrap();
        assert_eq!(update, ParamsUpdate::Forwarded { new_load: None });
        assert_eq!(adapter.current_load(), first_load);

        let other = resolved(ViewConfiguration::new().with_source("file:///b.pdf"));
        let update = adapter.update(Arc::new(other.params)).unwrap();
        let ParamsUpdate::Forwarded {
            new_load: Some(load),
        } = update
        else {
            panic!("expected a new load, got {update:?}");
        };
        assert_ne!(Some(load), first_load);
        assert_eq!(handle.applied_blobs().len(), 3);
        assert_eq!(handle.created(), 1);
    }

    #[test]
    fn removing_the_source_clears_the_surface() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        adapter
            .mount(&resolved(ViewConfiguration::new().with_source("file:///a.pdf")))
            .unwrap();

        let update = adapter
            .update(Arc::new(resolved(ViewConfiguration::new()).params))
            .unwrap();

        assert_eq!(update, ParamsUpdate::Cleared);
        assert_eq!(handle.cleared(), 1);
        assert_eq!(adapter.current_load(), None);
    }

    #[test]
    fn failed_creation_leaves_nothing_mounted() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        handle.fail_next_create("no window");
        let mut adapter = SurfaceAdapter::new(factory);

        let result = adapter.mount(&resolved(ViewConfiguration::new()));

        assert!(matches!(result, Err(ViewError::Mount(SurfaceError::Create { .. }))));
        assert!(!adapter.is_mounted());
        assert_eq!(handle.live(), 0);
    }

    #[test]
    fn detach_during_mount_releases_the_surface() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        handle.detach_on_next_apply();
        let mut adapter = SurfaceAdapter::new(factory);

        let result = adapter.mount(&resolved(ViewConfiguration::new().with_source("file:///a.pdf")));

        assert!(matches!(result, Err(ViewError::Mount(SurfaceError::Detached))));
        assert!(!adapter.is_mounted());
        assert_eq!(handle.created(), 1);
        assert_eq!(handle.destroyed(), 1);
    }

    #[test]
    fn unmount_destroys_and_disconnects() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        adapter
            .mount(&resolved(ViewConfiguration::new().with_source("file:///a.pdf")))
            .unwrap();

        assert!(adapter.unmount());
        assert!(!adapter.unmount());
        assert_eq!(handle.destroyed(), 1);
        assert!(!handle.emit_page(0, 1));
        assert!(adapter.drain_events().is_empty());
        assert!(matches!(
            adapter.update(Arc::new(resolved(ViewConfiguration::new()).params)),
            Err(ViewError::NotMounted)
        ));
    }

    #[test]
    fn load_errors_are_routed_through_the_event_channel() {
        let factory = LoopbackFactory::new().verifying_files();
        let mut adapter = SurfaceAdapter::new(factory);
        adapter
            .mount(&resolved(
                ViewConfiguration::new().with_source("/definitely/missing/doc.pdf"),
            ))
            .unwrap();

        let events = adapter.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].event,
            super::super::surface::NativeEvent::LoadFailed { .. }
        ));
        assert_eq!(Some(events[0].load), adapter.current_load());
    }

    #[test]
    fn detached_update_keeps_the_previous_record_and_load() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        adapter
            .mount(&resolved(ViewConfiguration::new().with_source("file:///a.pdf")))
            .unwrap();
        let load_a = adapter.current_load();
        let b = Arc::new(resolved(ViewConfiguration::new().with_source("file:///b.pdf")).params);

        handle.detach_on_next_apply();
        assert!(matches!(
            adapter.update(Arc::clone(&b)),
            Err(ViewError::Update(SurfaceError::Detached))
        ));
        assert_eq!(adapter.current_load(), load_a);
        assert_eq!(
            adapter.applied().and_then(|p| p.source.clone()).map(String::from),
            Some("file:///a.pdf".to_string())
        );

        let retried = adapter.update(b).unwrap();
        assert!(matches!(
            retried,
            ParamsUpdate::Forwarded { new_load: Some(_) }
        ));
        let blobs = handle.applied_blobs();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[1]["source"], "file:///b.pdf");
    }

    #[test]
    fn detached_reload_keeps_the_current_load() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        adapter
            .mount(&resolved(ViewConfiguration::new().with_source("file:///a.pdf")))
            .unwrap();
        let before = adapter.current_load();

        handle.detach_on_next_apply();
        assert!(matches!(
            adapter.reload(),
            Err(ViewError::Update(SurfaceError::Detached))
        ));
        assert_eq!(adapter.current_load(), before);
        assert!(adapter.is_mounted());

        let reloaded = adapter.reload().unwrap();
        assert_ne!(reloaded, before);
        assert_eq!(adapter.current_load(), reloaded);
    }

    #[test]
    fn same_file_in_another_form_is_not_a_new_load() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        adapter
            .mount(&resolved(ViewConfiguration::new().with_source("file:///a.pdf")))
            .unwrap();
        let before = adapter.current_load();

        let update = adapter
            .update(Arc::new(resolved(ViewConfiguration::new().with_source("/a.pdf")).params))
            .unwrap();

        assert_eq!(update, ParamsUpdate::Forwarded { new_load: None });
        assert_eq!(adapter.current_load(), before);
        assert_eq!(handle.applied_blobs().len(), 2);
    }

    #[test]
    fn reload_issues_a_fresh_load() {
        let factory = LoopbackFactory::new();
        let handle = factory.handle();
        let mut adapter = SurfaceAdapter::new(factory);
        adapter
            .mount(&resolved(ViewConfiguration::new().with_source("file:///a.pdf")))
            .unwrap();
        let before = adapter.current_load();

        let reloaded = adapter.reload().unwrap();

        assert!(reloaded.is_some());
        assert_ne!(reloaded, before);
        assert_eq!(handle.applied_blobs().len(), 2);
    }
}
