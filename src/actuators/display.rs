//! Display sink - best-effort LED matrix output off the request path
//!
//! Requests push jobs onto a bounded broadcast queue and never wait. A single
//! worker task drains it; once the queue is full the oldest pending job is
//! overwritten. Write failures are logged and dropped.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::config::Rotation;
use crate::sensors::SenseBoard;

/// Somewhere to send text for display, without waiting for it
pub trait TextSink: Send + Sync {
    fn show(&self, text: String);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayJob {
    pub text: String,
}

/// Sending half, cloned into whoever needs to display something
#[derive(Debug, Clone)]
pub struct DisplayQueue {
    tx: broadcast::Sender<DisplayJob>,
}

/// Receiving half; owns the board writes
#[derive(Debug)]
pub struct DisplayWorker {
    rx: broadcast::Receiver<DisplayJob>,
}

impl DisplayQueue {
    pub fn new(capacity: usize) -> (Self, DisplayWorker) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (Self { tx }, DisplayWorker { rx })
    }

    /// Create the queue and run its worker on the current runtime
    pub fn spawn(board: Arc<dyn SenseBoard>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, worker) = Self::new(capacity);
        let handle = tokio::spawn(worker.run(board));
        (queue, handle)
    }
}

impl TextSink for DisplayQueue {
    fn show(&self, text: String) {
        if let Err(e) = self.tx.send(DisplayJob { text }) {
            tracing::warn!("Display worker is gone, dropping {:?}", e.0.text);
        }
    }
}

impl DisplayWorker {
    /// Show jobs one at a time until every queue handle is dropped
    pub async fn run(mut self, board: Arc<dyn SenseBoard>) {
        loop {
            match self.rx.recv().await {
                Ok(job) => show(&board, job).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Display busy, skipped {} stale message(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("Display worker stopped");
    }
}

/// Orient and blank the matrix once at startup; failures only warn
pub fn prepare(board: &dyn SenseBoard, rotation: Rotation) {
    if let Err(e) = board
        .set_rotation(rotation)
        .and_then(|_| board.clear_display())
    {
        tracing::warn!("Could not prepare display: {}", e);
    }
}

async fn show(board: &Arc<dyn SenseBoard>, job: DisplayJob) {
    let board = Arc::clone(board);
    let text = job.text.clone();

    match tokio::task::spawn_blocking(move || board.show_message(&job.text)).await {
        Ok(Ok(())) => tracing::debug!("Displayed {:?}", text),
        Ok(Err(e)) => tracing::warn!("Failed to display {:?}: {}", text, e),
        Err(e) => tracing::warn!("Display task for {:?} failed: {}", text, e),
    }
}
