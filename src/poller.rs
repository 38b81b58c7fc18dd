use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::{self, paths, Api};
use crate::model::{Notification, Role, Session};

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const MAX_SHOWN: usize = 3;
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that keeps a client's latest notifications fresh.
pub struct NotificationPoller;

impl NotificationPoller {
    /// Starts polling on the current tokio runtime. While the session belongs
    /// to a CLIENT the feed is fetched immediately and then every `interval`;
    /// any session change restarts the schedule for the new identity, and
    /// no session or an ADMIN one leaves the feed empty. Intervals shorter
    /// than `MIN_INTERVAL` are raised to it.
    pub fn spawn(
        api: Arc<dyn Api>,
        session: watch::Receiver<Option<Session>>,
        interval: Duration,
    ) -> PollerHandle {
        let interval = interval.max(MIN_INTERVAL);
        let (feed_tx, feed_rx) = watch::channel(Vec::new());
        let task = tokio::spawn(run(api, session, interval, feed_tx));
        PollerHandle {
            task: Some(task),
            feed: feed_rx,
        }
    }
}

/// Owns the polling task. Dropping the handle cancels it.
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
    feed: watch::Receiver<Vec<Notification>>,
}

impl PollerHandle {
    pub fn notifications(&self) -> Vec<Notification> {
        self.feed.borrow().clone()
    }

    pub fn badge(&self) -> usize {
        self.feed.borrow().len()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.feed.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the task. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("notification poller cancelled");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn polled_user(session: &Option<Session>) -> Option<String> {
    session
        .as_ref()
        .filter(|s| s.role() == Role::Client)
        .map(|s| s.user.id.clone())
}

async fn run(
    api: Arc<dyn Api>,
    mut session: watch::Receiver<Option<Session>>,
    interval: Duration,
    feed: watch::Sender<Vec<Notification>>,
) {
    loop {
        let user_id = polled_user(&session.borrow_and_update());

        let Some(user_id) = user_id else {
            feed.send_if_modified(|list| {
                let had = !list.is_empty();
                list.clear();
                had
            });
            if session.changed().await.is_err() {
                return;
            }
            continue;
        };

        tracing::debug!(user = %user_id, ?interval, "polling notifications");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        latest = fetch_latest(api.as_ref(), &user_id) => {
                            feed.send_replace(latest);
                        }
                        changed = session.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            break;
                        }
                    }
                }
                changed = session.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
            }
        }

        // identity changed: never show the previous user's items
        feed.send_replace(Vec::new());
    }
}

/// The last `MAX_SHOWN` items of the server's list, or nothing on failure.
pub async fn fetch_latest(api: &dyn Api, user_id: &str) -> Vec<Notification> {
    let result = match api.get(&paths::notifications(user_id), &[]).await {
        Ok(value) => api::decode::<Vec<Notification>>(value),
        Err(e) => Err(e),
    };

    match result {
        Ok(mut list) => {
            let skip = list.len().saturating_sub(MAX_SHOWN);
            list.drain(..skip);
            list
        }
        Err(e) => {
            tracing::warn!(user = %user_id, error = %e, "failed to fetch notifications");
            Vec::new()
        }
    }
}
