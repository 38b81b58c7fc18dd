use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Sender side of the user-facing notice channel. Views report validation
/// failures, API failures and completed mutations through it.
#[derive(Debug, Clone)]
pub struct Notices {
    tx: mpsc::UnboundedSender<Notice>,
}

pub struct NoticeReceiver {
    rx: mpsc::UnboundedReceiver<Notice>,
}

pub fn channel() -> (Notices, NoticeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notices { tx }, NoticeReceiver { rx })
}

impl Notices {
    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    fn push(&self, level: Level, message: String) {
        tracing::debug!(?level, %message, "notice");
        // nobody listening is fine
        let _ = self.tx.send(Notice { level, message });
    }
}

impl NoticeReceiver {
    /// Everything queued so far, without waiting.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.rx.try_recv() {
            out.push(notice);
        }
        out
    }

    pub async fn recv(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }
}
