use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{self, paths, Api};
use crate::error::BookingError;
use crate::model::{AuthResponse, Credentials, Registration, Session};

/// Holds the authenticated identity and persists it to a JSON file.
///
/// Cheap to clone; every clone shares the same state. Changes are broadcast
/// on a watch channel so dependents (the HTTP client's bearer token, the
/// notification poller) follow login/logout without polling the store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: Option<PathBuf>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    /// In-memory store with nothing persisted.
    pub fn ephemeral(initial: Option<Session>) -> Self {
        Self::with_state(None, initial)
    }

    /// Restores the session persisted at `path`. A missing file means logged
    /// out; an unreadable or corrupt one is logged and treated the same way.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match read_session(&path) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding stored session");
                None
            }
        };
        Self::with_state(Some(path), initial)
    }

    fn with_state(path: Option<PathBuf>, initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner { path, tx }),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.tx.subscribe()
    }

    pub async fn login(
        &self,
        api: &dyn Api,
        credentials: &Credentials,
    ) -> Result<Session, BookingError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(BookingError::Validation(
                "email and password are required".into(),
            ));
        }

        let response: AuthResponse =
            api::decode(api.post(paths::LOGIN, api::encode(credentials)?).await?)?;
        let session = Session {
            user: response.user,
            token: response.token,
        };

        self.persist(Some(&session))?;
        self.inner.tx.send_replace(Some(session.clone()));
        tracing::info!(user = %session.user.id, role = %session.user.role, "logged in");
        Ok(session)
    }

    pub async fn register(
        &self,
        api: &dyn Api,
        registration: &Registration,
    ) -> Result<(), BookingError> {
        let missing: Vec<&str> = [
            ("first name", registration.first_name.as_str()),
            ("last name", registration.last_name.as_str()),
            ("email", registration.email.as_str()),
            ("password", registration.password.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(BookingError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        api.post(paths::REGISTER, api::encode(registration)?).await?;
        Ok(())
    }

    /// Idempotent. Subscribers only see a change if there was a session.
    pub fn logout(&self) -> Result<(), BookingError> {
        let had_session = self.inner.tx.send_if_modified(|current| current.take().is_some());
        if had_session {
            tracing::info!("logged out");
        }
        self.persist(None)
    }

    fn persist(&self, session: Option<&Session>) -> Result<(), BookingError> {
        let Some(ref path) = self.inner.path else {
            return Ok(());
        };
        match session {
            Some(session) => write_session(path, session),
            None => match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(BookingError::Storage(format!("{}: {e}", path.display()))),
            },
        }
    }
}

fn read_session(path: &Path) -> Result<Option<Session>, BookingError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BookingError::Storage(format!("{}: {e}", path.display()))),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

fn write_session(path: &Path, session: &Session) -> Result<(), BookingError> {
    let storage = |e: std::io::Error| BookingError::Storage(format!("{}: {e}", path.display()));
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(storage)?;
    }
    let raw = serde_json::to_string_pretty(session)?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(storage)?;
    // the mode above only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(storage)?;
    }
    file.write_all(raw.as_bytes()).map_err(storage)
}
