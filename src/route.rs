use std::fmt;
use std::str::FromStr;

use crate::error::BookingError;
use crate::model::{Role, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Flight(String),
    History,
    Admin,
}

const SIGNED_IN: &[Role] = &[Role::Client, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Route {
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::History | Self::Admin)
    }

    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Self::History => Some(SIGNED_IN),
            Self::Admin => Some(ADMIN_ONLY),
            Self::Home | Self::Login | Self::Register | Self::Flight(_) => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "/"),
            Self::Login => write!(f, "/login"),
            Self::Register => write!(f, "/register"),
            Self::Flight(id) => write!(f, "/flight/{id}"),
            Self::History => write!(f, "/history"),
            Self::Admin => write!(f, "/admin"),
        }
    }
}

impl FromStr for Route {
    type Err = BookingError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] if trimmed.starts_with('/') => Ok(Self::Home),
            ["login"] => Ok(Self::Login),
            ["register"] => Ok(Self::Register),
            ["history"] => Ok(Self::History),
            ["admin"] => Ok(Self::Admin),
            ["flight", id] => Ok(Self::Flight((*id).to_string())),
            _ => Err(BookingError::InvalidRoute(path.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render,
    /// `from` carries the attempted route when the user must log in first.
    Redirect { to: Route, from: Option<Route> },
}

/// Decision for a protected route: a session is always required, and when
/// `allowed` is set its role must be in it.
pub fn guard(session: Option<&Session>, allowed: Option<&[Role]>, requested: &Route) -> Decision {
    let Some(session) = session else {
        return Decision::Redirect {
            to: Route::Login,
            from: Some(requested.clone()),
        };
    };

    match allowed {
        Some(roles) if !roles.contains(&session.role()) => Decision::Redirect {
            to: Route::Home,
            from: None,
        },
        _ => Decision::Render,
    }
}

/// Guard decision for `route` using its own role table. Public routes always
/// render.
pub fn check(session: Option<&Session>, route: &Route) -> Decision {
    if !route.is_protected() {
        return Decision::Render;
    }
    guard(session, route.allowed_roles(), route)
}
