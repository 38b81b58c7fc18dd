pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod notice;
pub mod poller;
pub mod route;
pub mod session;
pub mod table;
pub mod views;

use std::sync::Arc;

use api::{Api, HttpApi};
use app::App;
use config::Config;
use error::BookingError;
use notice::NoticeReceiver;
use session::SessionStore;

/// Wires the persisted session, the HTTP client and the views together.
pub fn connect(config: &Config) -> Result<(App, NoticeReceiver), BookingError> {
    let session = SessionStore::load(&config.session.path);
    let api: Arc<dyn Api> = Arc::new(HttpApi::new(&config.api, session.subscribe())?);
    let (notices, receiver) = notice::channel();
    Ok((App::new(api, session, notices), receiver))
}
