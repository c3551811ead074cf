//! Display-facing run state.
//!
//! A [`Session`] owns the single [`DisplayState`] a front-end renders and
//! publishes it over a `tokio::sync::watch` channel. One run is live at a
//! time: submitting a new image resets the state in one step, aborts the
//! previous run's task, and any late update from an older run is discarded
//! by run id.

use crate::error::PipelineError;
use crate::keywords::KeywordSet;
use crate::orchestrator::Orchestrator;
use crate::types::Caption;
use crate::upload::{ImageSummary, UploadedImage};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Where the current run is in the caption → keyword sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Captioning,
    GeneratingKeywords,
    Done,
    Error,
}

/// Everything a front-end needs to render one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub run_id: u64,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Caption>,
    pub keywords: KeywordSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DisplayState {
    /// True while a hop is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Captioning | Phase::GeneratingKeywords)
    }

    /// Clear every per-run field and stamp the next run id.
    fn reset(&mut self) -> u64 {
        let run_id = self.run_id + 1;
        *self = Self {
            run_id,
            ..Self::default()
        };
        run_id
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.image.as_ref().and_then(|i| i.name.as_deref()) {
            writeln!(f, "== {name}")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {error}")?;
        }
        if let Some(description) = &self.description {
            writeln!(f, "Description:\n  {description}")?;
        }
        if !self.keywords.short_tail.is_empty() {
            writeln!(f, "Short-tail Keywords:\n  {}", self.keywords.short_tail_text())?;
        }
        if !self.keywords.long_tail.is_empty() {
            writeln!(f, "Long-tail Keywords:\n  {}", self.keywords.long_tail_text())?;
        }
        Ok(())
    }
}

/// Owner of the display state and the in-flight run.
pub struct Session {
    orchestrator: Arc<Orchestrator>,
    state: Arc<watch::Sender<DisplayState>>,
    in_flight: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let (state, _) = watch::channel(DisplayState::default());
        Self {
            orchestrator,
            state: Arc::new(state),
            in_flight: None,
        }
    }

    /// Receiver for the display layer; sees every committed update.
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.state.subscribe()
    }

    /// Current display state.
    pub fn snapshot(&self) -> DisplayState {
        self.state.borrow().clone()
    }

    /// Start a run in the background and return its run id.
    ///
    /// Invalid input is reported on the state immediately (phase stays
    /// `Idle`) and no task is spawned.
    pub fn submit(&mut self, image: UploadedImage) -> u64 {
        self.cancel_in_flight();
        if let Err(e) = self.orchestrator.validate(&image) {
            return self.reject(e).run_id;
        }

        let run_id = begin(&self.state, &image);
        let orchestrator = self.orchestrator.clone();
        let state = self.state.clone();
        self.in_flight = Some(tokio::spawn(async move {
            drive(&orchestrator, &state, run_id, image).await;
        }));
        run_id
    }

    /// Run to completion on the caller's task and return the final state.
    pub async fn run(&mut self, image: UploadedImage) -> DisplayState {
        self.cancel_in_flight();
        if let Err(e) = self.orchestrator.validate(&image) {
            return self.reject(e);
        }

        let run_id = begin(&self.state, &image);
        drive(&self.orchestrator, &self.state, run_id, image).await;
        self.snapshot()
    }

    /// Wait for the background run (if any) and return the resulting state.
    pub async fn wait(&mut self) -> DisplayState {
        if let Some(handle) = self.in_flight.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!("Pipeline task panicked: {e}");
                }
            }
        }
        self.snapshot()
    }

    /// Record an input error without touching the network.
    ///
    /// Clears any previous result so an old description is never shown next
    /// to the new error.
    pub fn reject(&mut self, error: PipelineError) -> DisplayState {
        self.cancel_in_flight();
        tracing::warn!("Rejected submission: {error}");
        self.state.send_modify(|s| {
            s.reset();
            s.error = Some(error.to_string());
        });
        self.snapshot()
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if !handle.is_finished() {
                tracing::debug!("Cancelling in-flight run");
                handle.abort();
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

fn begin(state: &watch::Sender<DisplayState>, image: &UploadedImage) -> u64 {
    let mut run_id = 0;
    state.send_modify(|s| {
        run_id = s.reset();
        s.phase = Phase::Captioning;
        s.image = Some(image.summary());
    });
    run_id
}

/// Apply `f` only if `run_id` is still the live run.
fn update<F>(state: &watch::Sender<DisplayState>, run_id: u64, f: F) -> bool
where
    F: FnOnce(&mut DisplayState),
{
    state.send_if_modified(|s| {
        if s.run_id != run_id {
            tracing::debug!("Dropping update from stale run {run_id} (live: {})", s.run_id);
            return false;
        }
        f(s);
        true
    })
}

fn fail(state: &watch::Sender<DisplayState>, run_id: u64, error: PipelineError) {
    tracing::error!("Run {run_id} failed: {error}");
    update(state, run_id, |s| {
        s.phase = Phase::Error;
        s.error = Some(error.to_string());
    });
}

async fn drive(
    orchestrator: &Orchestrator,
    state: &watch::Sender<DisplayState>,
    run_id: u64,
    image: UploadedImage,
) {
    tracing::info!(
        "Run {run_id}: describing {}",
        image.name().unwrap_or(image.mime_type())
    );

    let caption = match orchestrator.caption(&image).await {
        Ok(caption) => caption,
        Err(e) => return fail(state, run_id, e),
    };
    drop(image);

    let shown = update(state, run_id, |s| {
        s.description = Some(caption.clone());
        s.phase = Phase::GeneratingKeywords;
    });
    if !shown {
        return;
    }

    match orchestrator.keywords(&caption).await {
        Ok(keywords) => {
            tracing::info!(
                "Run {run_id}: {} short-tail, {} long-tail keywords",
                keywords.short_tail.len(),
                keywords.long_tail.len()
            );
            update(state, run_id, |s| {
                s.keywords = keywords;
                s.phase = Phase::Done;
            });
        }
        Err(e) => fail(state, run_id, e),
    }
}
