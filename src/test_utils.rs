pub mod test_helpers {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::command_source::{SampleCommand, SimulatedCommandSource};
    use crate::view::{LoadFailure, NativeEvent, PdfRendererView, SurfaceFactory};

    /// Records every callback a view invokes
    #[derive(Clone, Default)]
    pub struct CallbackRecorder {
        pages: Rc<RefCell<Vec<(u32, u32)>>>,
        failures: Rc<RefCell<Vec<LoadFailure>>>,
    }

    impl CallbackRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Install both callbacks on `view`
        pub fn attach<F: SurfaceFactory>(&self, view: PdfRendererView<F>) -> PdfRendererView<F> {
            let pages = Rc::clone(&self.pages);
            let failures = Rc::clone(&self.failures);
            view.on_page_change(move |page, total| pages.borrow_mut().push((page, total)))
                .on_error(move |failure: &LoadFailure| failures.borrow_mut().push(failure.clone()))
        }

        /// `(page, total_pages)` pairs, oldest first
        pub fn pages(&self) -> Vec<(u32, u32)> {
            self.pages.borrow().clone()
        }

        pub fn failures(&self) -> Vec<LoadFailure> {
            self.failures.borrow().clone()
        }

        /// Total callbacks invoked
        pub fn calls(&self) -> usize {
            self.pages.borrow().len() + self.failures.borrow().len()
        }
    }

    /// Builder for creating test scenarios with simulated host commands
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        commands: Vec<SampleCommand>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Renderer reports `position` of `total`
        pub fn page(mut self, position: i32, total: i32) -> Self {
            self.commands.push(SampleCommand::Page { position, total });
            self
        }

        pub fn fail(mut self, reason: Option<&str>) -> Self {
            self.commands
                .push(SampleCommand::Fail(reason.map(str::to_string)));
            self
        }

        pub fn native(mut self, event: NativeEvent) -> Self {
            self.commands.push(SampleCommand::Native(event));
            self
        }

        pub fn toggle_single_page(mut self) -> Self {
            self.commands.push(SampleCommand::SinglePage);
            self
        }

        pub fn zoom(mut self, factor: f32) -> Self {
            self.commands.push(SampleCommand::Zoom(factor));
            self
        }

        pub fn source(mut self, locator: &str) -> Self {
            self.commands
                .push(SampleCommand::Source(Some(locator.to_string())));
            self
        }

        pub fn clear_source(mut self) -> Self {
            self.commands.push(SampleCommand::Source(None));
            self
        }

        /// Hide or show the view
        pub fn toggle(mut self) -> Self {
            self.commands.push(SampleCommand::Toggle);
            self
        }

        pub fn retry(mut self) -> Self {
            self.commands.push(SampleCommand::Retry);
            self
        }

        pub fn quit(mut self) -> Self {
            self.commands.push(SampleCommand::Quit);
            self
        }

        /// Build the simulated command source
        pub fn build(self) -> SimulatedCommandSource {
            SimulatedCommandSource::new(self.commands)
        }
    }
}
