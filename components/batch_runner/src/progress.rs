//! Progress channel between the worker and whatever presents it

use tokio::sync::mpsc;
use tracing::debug;

/// Default number of events buffered before the worker waits
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Overall completion in percent, with a short status line
    Progress { percent: f64, message: String },
    Log(String),
}

/// Producer half held by the worker
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Option<mpsc::Sender<RunEvent>>,
}

pub fn channel(capacity: usize) -> (ProgressSender, mpsc::Receiver<RunEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ProgressSender { tx: Some(tx) }, rx)
}

impl ProgressSender {
    /// A sender that drops every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub async fn progress(&self, percent: f64, message: impl Into<String>) {
        self.send(RunEvent::Progress {
            percent: percent.clamp(0.0, 100.0),
            message: message.into(),
        })
        .await;
    }

    pub async fn log(&self, message: impl Into<String>) {
        self.send(RunEvent::Log(message.into())).await;
    }

    async fn send(&self, event: RunEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        // A consumer that went away must not stop the run
        if tx.send(event).await.is_err() {
            debug!("Progress receiver dropped");
        }
    }
}
