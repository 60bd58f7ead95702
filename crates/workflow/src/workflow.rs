//! The transformation request lifecycle.
//!
//! [`TransformationWorkflow`] owns the source image, the request status
//! and the current result. Clones share one session, so the UI can call
//! [`select_image`](TransformationWorkflow::select_image) from one task
//! while [`submit`](TransformationWorkflow::submit) is suspended on the
//! network in another.
//!
//! Every submission and every new selection bumps a generation counter.
//! A response is applied only if the counter still holds the value taken
//! when its request was opened; anything else is a stale response and is
//! dropped.
//!
//! A `submit` future dropped mid-request (a timeout, `select!`, an
//! aborted task) fails its request instead of leaving the session in
//! `Submitting`.

use std::path::PathBuf;
use std::sync::Arc;

use symbolart_client::api::{ConversionRequest, ConversionService};
use symbolart_core::settings::SettingsStore;
use symbolart_core::source::SourceImage;
use tokio::sync::{watch, Mutex};

use crate::error::WorkflowError;
use crate::export::{ArtifactSink, EXPORT_FILE_NAME};
use crate::handle::{HandleRegistry, ResultHandle};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where the workflow is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    /// No source image.
    Idle,
    /// Source image present, nothing outstanding.
    Ready,
    /// A request is in flight.
    Submitting,
    /// The latest request produced an image.
    Succeeded(ResultHandle),
    /// The latest request failed; holds the user-facing message.
    Failed(String),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    /// Which result panel the UI should show.
    pub fn view(&self) -> ResultView {
        match self {
            Self::Idle => ResultView::Empty,
            Self::Submitting => ResultView::InProgress,
            Self::Succeeded(_) => ResultView::Success,
            Self::Ready | Self::Failed(_) => ResultView::NoneYet,
        }
    }

    pub fn result(&self) -> Option<&ResultHandle> {
        match self {
            Self::Succeeded(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// The four result panels of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultView {
    Empty,
    InProgress,
    Success,
    NoneYet,
}

/// What became of a [`submit`](TransformationWorkflow::submit) call that
/// was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The response was applied; carries the resulting state
    /// (`Succeeded` or `Failed`).
    Applied(WorkflowState),
    /// A newer selection or submission took over while this request was
    /// in flight; its response was discarded.
    Superseded,
}

struct Inner {
    source: Option<Arc<SourceImage>>,
    state: WorkflowState,
    generation: u64,
    handles: HandleRegistry,
}

/// State shared by every clone of a workflow, independent of the
/// service and sink types.
struct Session {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<WorkflowState>,
}

impl Session {
    fn release_result(inner: &mut Inner) {
        if let WorkflowState::Succeeded(handle) = &inner.state {
            let id = handle.id();
            inner.handles.release(id);
        }
    }

    fn set_state(&self, inner: &mut Inner, next: WorkflowState) {
        Self::release_result(inner);
        tracing::debug!(from = inner.state.name(), to = next.name(), "Workflow transition");
        inner.state = next;
        self.state_tx.send_replace(inner.state.clone());
    }

    /// Fail a request whose `submit` future was dropped, if it is still
    /// the current one.
    fn abandon(&self, inner: &mut Inner, generation: u64) {
        if inner.generation != generation || inner.state != WorkflowState::Submitting {
            return;
        }
        tracing::warn!(generation, "Conversion request dropped before completion");
        self.set_state(inner, WorkflowState::Failed(CANCELLED_MESSAGE.to_string()));
    }
}

struct Shared<S, K> {
    service: S,
    sink: K,
    settings: SettingsStore,
    session: Arc<Session>,
}

/// Message stored in `Failed` when a caller stops waiting on `submit`.
pub const CANCELLED_MESSAGE: &str = "Request cancelled";

/// Held by `submit` while its request is in flight. Dropping it without
/// [`disarm`](InFlight::disarm) moves a still-current `Submitting` to
/// `Failed`, so the session can be retried.
struct InFlight {
    session: Option<Arc<Session>>,
    generation: u64,
}

impl InFlight {
    fn disarm(mut self) {
        self.session = None;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let generation = self.generation;

        if let Ok(mut inner) = session.inner.try_lock() {
            session.abandon(&mut inner, generation);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let mut inner = session.inner.lock().await;
                    session.abandon(&mut inner, generation);
                });
            }
            Err(_) => {
                tracing::warn!(generation, "No runtime to fail a dropped conversion request");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// One session's conversion lifecycle.
pub struct TransformationWorkflow<S, K> {
    shared: Arc<Shared<S, K>>,
}

impl<S, K> Clone for TransformationWorkflow<S, K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, K> TransformationWorkflow<S, K>
where
    S: ConversionService,
    K: ArtifactSink,
{
    /// Start a session in `Idle`, reading generation parameters from
    /// `settings` at each submit.
    pub fn new(service: S, sink: K, settings: SettingsStore) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::Idle);
        Self {
            shared: Arc::new(Shared {
                service,
                sink,
                settings,
                session: Arc::new(Session {
                    inner: Mutex::new(Inner {
                        source: None,
                        state: WorkflowState::Idle,
                        generation: 0,
                        handles: HandleRegistry::new(),
                    }),
                    state_tx,
                }),
            }),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.shared.settings
    }

    pub async fn state(&self) -> WorkflowState {
        self.shared.session.inner.lock().await.state.clone()
    }

    pub async fn view(&self) -> ResultView {
        self.shared.session.inner.lock().await.state.view()
    }

    /// The currently selected source image, if any.
    pub async fn source(&self) -> Option<Arc<SourceImage>> {
        self.shared.session.inner.lock().await.source.clone()
    }

    /// Number of result handles live in this session (0 or 1).
    pub async fn live_handles(&self) -> usize {
        self.shared.session.inner.lock().await.handles.len()
    }

    /// Observe every state transition.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.shared.session.state_tx.subscribe()
    }

    /// Replace the source image. Valid from any state.
    ///
    /// Drops any result or error, releases the current handle, and moves
    /// to `Ready`. A request still in flight is left to finish but its
    /// response will be discarded.
    pub async fn select_image(&self, source: SourceImage) {
        let mut inner = self.shared.session.inner.lock().await;
        inner.generation += 1;

        if inner.state == WorkflowState::Submitting {
            tracing::debug!(
                generation = inner.generation,
                "New image selected while a request is in flight; its response will be ignored",
            );
        }

        tracing::info!(
            file_name = %source.name(),
            media_type = %source.media_type(),
            bytes = source.len(),
            "Source image selected",
        );

        inner.source = Some(Arc::new(source));
        self.shared.session.set_state(&mut inner, WorkflowState::Ready);
    }

    /// Send the current source image with a snapshot of the current
    /// settings.
    ///
    /// Valid from `Ready` and `Failed`. Resolves once the response has
    /// arrived and been applied or discarded. Transport, service and
    /// malformed-body errors do not return `Err`; they move the workflow
    /// to `Failed`. Dropping the returned future before it resolves also
    /// ends in `Failed`, with [`CANCELLED_MESSAGE`].
    pub async fn submit(&self) -> Result<SubmitOutcome, WorkflowError> {
        let (in_flight, request) = {
            let mut inner = self.shared.session.inner.lock().await;
            match &inner.state {
                WorkflowState::Idle => return Err(WorkflowError::NoSourceImage),
                WorkflowState::Submitting => return Err(WorkflowError::AlreadySubmitting),
                WorkflowState::Succeeded(_) => {
                    return Err(WorkflowError::InvalidState {
                        operation: "submit",
                        state: "succeeded",
                    })
                }
                WorkflowState::Ready | WorkflowState::Failed(_) => {}
            }

            let source = inner.source.clone().ok_or(WorkflowError::NoSourceImage)?;
            let request = ConversionRequest {
                source,
                settings: self.shared.settings.snapshot(),
            };

            inner.generation += 1;
            let generation = inner.generation;
            self.shared.session.set_state(&mut inner, WorkflowState::Submitting);
            let in_flight = InFlight {
                session: Some(Arc::clone(&self.shared.session)),
                generation,
            };
            (in_flight, request)
        };
        let generation = in_flight.generation;

        tracing::info!(
            generation,
            file_name = %request.source.name(),
            quality = %request.settings.quality,
            palette = %request.settings.palette,
            "Submitting conversion request",
        );

        let outcome = self.shared.service.convert(&request).await;

        let mut inner = self.shared.session.inner.lock().await;
        in_flight.disarm();
        if inner.generation != generation {
            tracing::debug!(
                generation,
                current = inner.generation,
                succeeded = outcome.is_ok(),
                "Discarding stale conversion response",
            );
            return Ok(SubmitOutcome::Superseded);
        }

        match outcome {
            Ok(image) => {
                let handle = inner.handles.register(image);
                tracing::info!(
                    generation,
                    handle_id = %handle.id(),
                    bytes = handle.len(),
                    "Conversion succeeded",
                );
                self.shared.session.set_state(&mut inner, WorkflowState::Succeeded(handle));
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(generation, error = %message, "Conversion failed");
                self.shared.session.set_state(&mut inner, WorkflowState::Failed(message));
            }
        }

        Ok(SubmitOutcome::Applied(inner.state.clone()))
    }

    /// Save the current result under [`EXPORT_FILE_NAME`]. Valid only in
    /// `Succeeded`; does not change state.
    pub async fn export_result(&self) -> Result<PathBuf, WorkflowError> {
        let handle = {
            let inner = self.shared.session.inner.lock().await;
            inner.state.result().cloned().ok_or(WorkflowError::NoResult)?
        };

        let path = self
            .shared
            .sink
            .save(EXPORT_FILE_NAME, handle.bytes())
            .await?;

        tracing::info!(
            path = %path.display(),
            handle_id = %handle.id(),
            bytes = handle.len(),
            "Exported result",
        );
        Ok(path)
    }

    /// Release every handle, forget the source and return to `Idle`. Any
    /// request still in flight becomes stale.
    pub async fn end_session(&self) {
        let mut inner = self.shared.session.inner.lock().await;
        inner.generation += 1;
        inner.source = None;
        self.shared.session.set_state(&mut inner, WorkflowState::Idle);
        inner.handles.release_all();
        tracing::info!("Session ended");
    }

}
