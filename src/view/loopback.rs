//! In-process native surface
//!
//! Stands in for the platform renderer: records every call the adapter makes
//! and lets the host inject the events a real renderer would emit. The sample
//! host and the tests drive views through it.

use std::cell::RefCell;
use std::fs::File;
use std::rc::Rc;

use log::debug;

use super::error::SurfaceError;
use super::params::{ResolvedParameters, StructuralParameters};
use super::surface::{
    LoadId, NativeEvent, NativeSurface, SurfaceEvents, SurfaceFactory, SurfaceId, SurfaceSetup,
};

#[derive(Debug, Default)]
struct LoopbackState {
    created: usize,
    destroyed: usize,
    cleared: usize,
    applied: Vec<serde_json::Value>,
    structural: Vec<StructuralParameters>,
    test_ids: Vec<Option<String>>,
    fail_next_create: Option<String>,
    detach_next_apply: bool,
    verify_files: bool,
    /// Native side of the latest surface; outlives destruction like an
    /// in-flight decode would
    events: Option<SurfaceEvents>,
    load: Option<LoadId>,
}

/// Shared view of the loopback's native side
#[derive(Clone, Debug, Default)]
pub struct LoopbackHandle(Rc<RefCell<LoopbackState>>);

impl LoopbackHandle {
    /// Surfaces created so far
    #[must_use]
    pub fn created(&self) -> usize {
        self.0.borrow().created
    }

    #[must_use]
    pub fn destroyed(&self) -> usize {
        self.0.borrow().destroyed
    }

    /// Surfaces created and not yet destroyed
    #[must_use]
    pub fn live(&self) -> usize {
        let state = self.0.borrow();
        state.created - state.destroyed
    }

    #[must_use]
    pub fn cleared(&self) -> usize {
        self.0.borrow().cleared
    }

    /// Every parameter blob received, oldest first
    #[must_use]
    pub fn applied_blobs(&self) -> Vec<serde_json::Value> {
        self.0.borrow().applied.clone()
    }

    /// Structural parameters of every surface created, oldest first
    #[must_use]
    pub fn structural_history(&self) -> Vec<StructuralParameters> {
        self.0.borrow().structural.clone()
    }

    #[must_use]
    pub fn test_ids(&self) -> Vec<Option<String>> {
        self.0.borrow().test_ids.clone()
    }

    /// Load the latest surface is working on
    #[must_use]
    pub fn current_load(&self) -> Option<LoadId> {
        self.0.borrow().load
    }

    pub fn fail_next_create(&self, detail: impl Into<String>) {
        self.0.borrow_mut().fail_next_create = Some(detail.into());
    }

    pub fn detach_on_next_apply(&self) {
        self.0.borrow_mut().detach_next_apply = true;
    }

    /// Report a page change for the current load
    pub fn emit_page(&self, position: i32, total: i32) -> bool {
        match self.current_load() {
            Some(load) => self.emit_page_for(load, position, total),
            None => false,
        }
    }

    /// Report a page change for an arbitrary (possibly stale) load
    pub fn emit_page_for(&self, load: LoadId, position: i32, total: i32) -> bool {
        self.emit(load, |events| events.page_changed(load, position, total))
    }

    /// Report a load failure for the current load
    pub fn emit_failure(&self, reason: Option<String>) -> bool {
        let Some(load) = self.current_load() else {
            return false;
        };
        self.emit_failure_for(load, reason)
    }

    /// Report a load failure for an arbitrary (possibly stale) load
    pub fn emit_failure_for(&self, load: LoadId, reason: Option<String>) -> bool {
        self.emit(load, |events| events.load_failed(load, reason))
    }

    /// Deliver an already decoded native event for the current load
    pub fn emit_event(&self, event: NativeEvent) -> bool {
        let Some(load) = self.current_load() else {
            return false;
        };
        self.emit(load, |events| events.emit(load, event))
    }

    fn emit(&self, load: LoadId, send: impl FnOnce(&SurfaceEvents) -> bool) -> bool {
        let events = self.0.borrow().events.clone();
        let delivered = events.as_ref().is_some_and(send);
        if !delivered {
            debug!("Loopback event for {load:?} was not delivered");
        }
        delivered
    }
}

/// Factory producing loopback surfaces
#[derive(Debug, Default)]
pub struct LoopbackFactory {
    handle: LoopbackHandle,
}

impl LoopbackFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a load failure when the source is not a readable local file
    #[must_use]
    pub fn verifying_files(self) -> Self {
        self.handle.0.borrow_mut().verify_files = true;
        self
    }

    #[must_use]
    pub fn handle(&self) -> LoopbackHandle {
        self.handle.clone()
    }
}

impl SurfaceFactory for LoopbackFactory {
    type Surface = LoopbackSurface;

    fn create(&mut self, setup: SurfaceSetup) -> Result<Self::Surface, SurfaceError> {
        let mut state = self.handle.0.borrow_mut();
        if let Some(detail) = state.fail_next_create.take() {
            return Err(SurfaceError::create(detail));
        }

        state.created += 1;
        state.structural.push(setup.structural);
        state.test_ids.push(setup.test_id);
        state.events = Some(setup.events);
        state.load = None;

        Ok(LoopbackSurface {
            id: setup.id,
            handle: self.handle.clone(),
        })
    }
}

/// One loopback surface instance
#[derive(Debug)]
pub struct LoopbackSurface {
    id: SurfaceId,
    handle: LoopbackHandle,
}

impl NativeSurface for LoopbackSurface {
    fn apply_params(
        &mut self,
        params: &ResolvedParameters,
        load: LoadId,
    ) -> Result<(), SurfaceError> {
        let mut state = self.handle.0.borrow_mut();
        if state.detach_next_apply {
            state.detach_next_apply = false;
            return Err(SurfaceError::Detached);
        }

        state.applied.push(params.to_native_blob());
        state.load = Some(load);

        if state.verify_files {
            if let Some(source) = &params.source {
                let path = source.local_path();
                if !path.is_file() {
                    return Err(SurfaceError::load(format!("{} is not a file", path.display())));
                }
                File::open(&path)
                    .map_err(|e| SurfaceError::load(format!("{}: {e}", path.display())))?;
            }
        }

        debug!("Loopback surface {:?} applied {load:?}", self.id);
        Ok(())
    }

    fn clear(&mut self) {
        let mut state = self.handle.0.borrow_mut();
        state.cleared += 1;
        state.load = None;
    }

    fn destroy(&mut self) {
        self.handle.0.borrow_mut().destroyed += 1;
        debug!("Loopback surface {:?} destroyed", self.id);
    }
}
