//! Sample host
//!
//! Embeds a [`PdfRendererView`] the way an application screen would: keeps
//! the configuration it renders with, tracks the page indicator through the
//! page-change callback and drives everything from a command stream.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use anyhow::Result;
use log::{debug, info, warn};

use crate::acquisition::DocumentAcquirer;
use crate::command_source::{CommandSource, SampleCommand};
use crate::view::loopback::{LoopbackFactory, LoopbackHandle};
use crate::view::{LoadFailure, LoadState, PageState, PdfRendererView, ViewConfiguration};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct SampleApp<A: DocumentAcquirer> {
    view: PdfRendererView<LoopbackFactory>,
    native: LoopbackHandle,
    acquirer: A,
    config: ViewConfiguration,
    pages: Rc<RefCell<PageState>>,
    failures: Rc<RefCell<Vec<LoadFailure>>>,
    visible: bool,
    notice: Option<String>,
}

impl<A: DocumentAcquirer> SampleApp<A> {
    pub fn new(factory: LoopbackFactory, acquirer: A, config: ViewConfiguration) -> Self {
        let native = factory.handle();
        let pages = Rc::new(RefCell::new(PageState::default()));
        let failures = Rc::new(RefCell::new(Vec::new()));

        let page_sink = Rc::clone(&pages);
        let failure_sink = Rc::clone(&failures);
        let view = PdfRendererView::new(factory)
            .on_page_change(move |page, total| page_sink.borrow_mut().set(page, total))
            .on_error(move |failure: &LoadFailure| failure_sink.borrow_mut().push(failure.clone()));

        Self {
            view,
            native,
            acquirer,
            config,
            pages,
            failures,
            visible: true,
            notice: None,
        }
    }

    /// Resolve the configured source and show the view
    pub fn start(&mut self) {
        let requested = self.config.source.take();
        self.select_source(requested.as_deref());
    }

    pub fn handle(&mut self, command: SampleCommand) -> Flow {
        debug!("Sample command: {command:?}");
        match command {
            SampleCommand::Page { position, total } => {
                self.emit(self.native.emit_page(position, total));
            }
            SampleCommand::Fail(reason) => {
                self.emit(self.native.emit_failure(reason));
            }
            SampleCommand::Native(event) => {
                self.emit(self.native.emit_event(event));
            }
            SampleCommand::SinglePage => {
                let single_page = !self.config.single_page.unwrap_or(false);
                self.config.single_page = Some(single_page);
                self.render();
            }
            SampleCommand::Zoom(factor) => {
                self.config.max_zoom = Some(factor);
                self.render();
            }
            SampleCommand::Source(requested) => self.select_source(requested.as_deref()),
            SampleCommand::Toggle => {
                self.visible = !self.visible;
                if let Err(e) = self.view.set_visible(self.visible, &self.config) {
                    self.notice = Some(format!("error: {e}"));
                }
            }
            SampleCommand::Retry => match self.view.retry() {
                Ok(true) => {}
                Ok(false) => self.notice = Some("nothing to retry".to_string()),
                Err(e) => self.notice = Some(format!("error: {e}")),
            },
            SampleCommand::Quit => return Flow::Quit,
        }

        self.view.pump();
        Flow::Continue
    }

    fn select_source(&mut self, requested: Option<&str>) {
        let source = match requested {
            Some(locator) => match self.acquirer.acquire(locator) {
                Ok(source) => Some(source.as_str().to_string()),
                Err(e) => {
                    warn!("Could not open {locator}: {e}");
                    self.notice = Some(format!("error: {e}"));
                    self.config.source.clone()
                }
            },
            None => None,
        };

        if source != self.config.source {
            *self.pages.borrow_mut() = PageState::default();
        }
        self.config.source = source;
        self.render();
    }

    fn render(&mut self) {
        if self.visible && !self.view.render(&self.config) {
            self.notice = Some("error: view could not be mounted".to_string());
        }
    }

    fn emit(&mut self, delivered: bool) {
        if !delivered {
            self.notice = Some("no document is loading".to_string());
        }
    }

    /// Message produced by the last command, if any
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Page indicator, or the load state while there is none
    #[must_use]
    pub fn status(&self) -> String {
        if !self.view.is_mounted() {
            return "hidden".to_string();
        }

        match self.view.state() {
            LoadState::NoDocument => "no document".to_string(),
            LoadState::Loading { .. } => "loading".to_string(),
            LoadState::Ready { .. } => self.pages.borrow().indicator(),
            LoadState::Failed { .. } => match self
                .failures
                .borrow()
                .last()
                .and_then(|failure| failure.reason.clone())
            {
                Some(reason) => format!("failed: {reason}"),
                None => "failed".to_string(),
            },
        }
    }

    #[must_use]
    pub fn page_state(&self) -> PageState {
        *self.pages.borrow()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<LoadFailure> {
        self.failures.borrow().clone()
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfiguration {
        &self.config
    }

    #[must_use]
    pub fn native(&self) -> &LoopbackHandle {
        &self.native
    }

    #[must_use]
    pub fn view(&self) -> &PdfRendererView<LoopbackFactory> {
        &self.view
    }

    pub fn shutdown(&mut self) {
        if self.view.unmount() {
            info!("PDF view unmounted");
        }
    }
}

/// Run the sample host until the source is exhausted or asks to quit,
/// writing one status line per command to `out`
pub fn run_with_command_source<A: DocumentAcquirer>(
    app: &mut SampleApp<A>,
    source: &mut dyn CommandSource,
    out: &mut dyn Write,
) -> Result<()> {
    app.start();
    report(app, out)?;

    while let Some(command) = source.read()? {
        if app.handle(command) == Flow::Quit {
            break;
        }
        report(app, out)?;
    }

    app.shutdown();
    out.flush()?;
    Ok(())
}

fn report<A: DocumentAcquirer>(app: &mut SampleApp<A>, out: &mut dyn Write) -> Result<()> {
    if let Some(notice) = app.take_notice() {
        writeln!(out, "{notice}")?;
    }
    writeln!(out, "{}", app.status())?;
    Ok(())
}
