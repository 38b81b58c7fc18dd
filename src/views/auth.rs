use crate::api::Api;
use crate::error::BookingError;
use crate::model::{Credentials, Registration, Role};
use crate::notice::Notices;
use crate::route::Route;
use crate::session::SessionStore;

/// Logs in and returns where to go next: the route the user was stopped at,
/// otherwise the dashboard for admins and the search page for clients.
pub async fn login(
    store: &SessionStore,
    api: &dyn Api,
    notices: &Notices,
    credentials: &Credentials,
    return_to: Option<Route>,
) -> Result<Route, BookingError> {
    let session = match store.login(api, credentials).await {
        Ok(session) => session,
        Err(e) => {
            notices.error(format!("Login failed: {e}"));
            return Err(e);
        }
    };

    notices.success(format!("Hello, {}", session.user.first_name));
    Ok(return_to.unwrap_or(match session.role() {
        Role::Admin => Route::Admin,
        Role::Client => Route::Home,
    }))
}

pub async fn register(
    store: &SessionStore,
    api: &dyn Api,
    notices: &Notices,
    registration: &Registration,
) -> Result<Route, BookingError> {
    if let Err(e) = store.register(api, registration).await {
        notices.error(format!("Registration failed: {e}"));
        return Err(e);
    }
    notices.success("Account created, you can log in now");
    Ok(Route::Login)
}
