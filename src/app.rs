use std::sync::Arc;
use std::time::Duration;

use crate::api::Api;
use crate::error::BookingError;
use crate::model::{Credentials, Registration};
use crate::notice::Notices;
use crate::poller::{NotificationPoller, PollerHandle};
use crate::route::{self, Decision, Route};
use crate::session::SessionStore;
use crate::views::admin::AdminView;
use crate::views::auth;
use crate::views::flight::FlightView;
use crate::views::history::HistoryView;
use crate::views::home::HomeView;

const MAX_REDIRECTS: usize = 4;

/// Where a navigation ended up. `return_to` is set when the user was sent to
/// the login page from a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landing {
    pub route: Route,
    pub return_to: Option<Route>,
}

/// Top-level router. Owns the views and the injected session store.
pub struct App {
    api: Arc<dyn Api>,
    session: SessionStore,
    notices: Notices,
    pub home: HomeView,
    pub flight: FlightView,
    pub history: HistoryView,
    pub admin: AdminView,
}

impl App {
    pub fn new(api: Arc<dyn Api>, session: SessionStore, notices: Notices) -> Self {
        Self {
            home: HomeView::new(api.clone(), notices.clone()),
            flight: FlightView::new(api.clone(), notices.clone()),
            history: HistoryView::new(api.clone(), notices.clone()),
            admin: AdminView::new(api.clone(), notices.clone()),
            api,
            session,
            notices,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Guard decision for `route` against the current session, without
    /// loading anything.
    pub fn authorize(&self, route: &Route) -> Decision {
        route::check(self.session.current().as_ref(), route)
    }

    /// Resolves `path`, follows guard and view redirects, and loads the view
    /// that finally renders.
    pub async fn navigate(&mut self, path: &str) -> Result<Landing, BookingError> {
        let mut route: Route = path.parse()?;
        let mut return_to = None;

        for _ in 0..MAX_REDIRECTS {
            let session = self.session.current();

            if let Decision::Redirect { to, from } = route::check(session.as_ref(), &route) {
                tracing::debug!(%route, %to, "guard redirect");
                return_to = from;
                route = to;
                continue;
            }

            let redirect = match &route {
                Route::Home => match self.home.load(session.as_ref()).await? {
                    Decision::Redirect { to, .. } => Some(to),
                    Decision::Render => None,
                },
                Route::Flight(id) => {
                    self.flight.load(id).await?;
                    None
                }
                Route::History => {
                    self.history.load().await?;
                    None
                }
                Route::Admin => {
                    self.admin.load().await?;
                    None
                }
                Route::Login | Route::Register => None,
            };

            match redirect {
                Some(to) => {
                    tracing::debug!(%route, %to, "view redirect");
                    route = to;
                }
                None => return Ok(Landing { route, return_to }),
            }
        }

        Err(BookingError::InvalidRoute(format!(
            "{path} (too many redirects)"
        )))
    }

    pub async fn login(
        &mut self,
        credentials: &Credentials,
        return_to: Option<Route>,
    ) -> Result<Route, BookingError> {
        auth::login(
            &self.session,
            self.api.as_ref(),
            &self.notices,
            credentials,
            return_to,
        )
        .await
    }

    pub async fn register(&mut self, registration: &Registration) -> Result<Route, BookingError> {
        auth::register(&self.session, self.api.as_ref(), &self.notices, registration).await
    }

    /// Idempotent. Clears every view's derived state along with the session;
    /// the poller follows through its session subscription. Views are reset
    /// even when the session file cannot be removed.
    pub fn logout(&mut self) -> Result<(), BookingError> {
        let result = self.session.logout();
        self.history.reset();
        self.admin.reset();
        self.flight = FlightView::new(self.api.clone(), self.notices.clone());
        result
    }

    pub fn start_poller(&self, interval: Duration) -> PollerHandle {
        NotificationPoller::spawn(self.api.clone(), self.session.subscribe(), interval)
    }
}
