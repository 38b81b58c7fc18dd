use std::sync::Arc;

use crate::api::{self, paths, Api};
use crate::error::BookingError;
use crate::model::{Flight, Role, Session};
use crate::notice::Notices;
use crate::route::{Decision, Route};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub from: String,
    pub to: String,
    pub date: String,
}

impl SearchFilters {
    /// Query params for the non-empty fields; all empty means unfiltered.
    pub fn to_query(&self) -> Vec<(String, String)> {
        [("from", &self.from), ("to", &self.to), ("date", &self.date)]
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.to_string(), v.trim().to_string()))
            .collect()
    }
}

pub struct HomeView {
    api: Arc<dyn Api>,
    notices: Notices,
    filters: SearchFilters,
    flights: Vec<Flight>,
}

impl HomeView {
    pub fn new(api: Arc<dyn Api>, notices: Notices) -> Self {
        Self {
            api,
            notices,
            filters: SearchFilters::default(),
            flights: Vec::new(),
        }
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    // Editing a filter never fetches; only `search` does.
    pub fn set_from(&mut self, value: impl Into<String>) {
        self.filters.from = value.into();
    }

    pub fn set_to(&mut self, value: impl Into<String>) {
        self.filters.to = value.into();
    }

    pub fn set_date(&mut self, value: impl Into<String>) {
        self.filters.date = value.into();
    }

    /// Admins are sent to the dashboard before anything is fetched.
    pub async fn load(&mut self, session: Option<&Session>) -> Result<Decision, BookingError> {
        if session.is_some_and(|s| s.role() == Role::Admin) {
            return Ok(Decision::Redirect {
                to: Route::Admin,
                from: None,
            });
        }
        self.search().await?;
        Ok(Decision::Render)
    }

    /// On failure the previous results stay on screen.
    pub async fn search(&mut self) -> Result<(), BookingError> {
        let query = self.filters.to_query();
        let result = match self.api.get(paths::FLIGHTS, &query).await {
            Ok(value) => api::decode::<Vec<Flight>>(value),
            Err(e) => Err(e),
        };

        match result {
            Ok(flights) => {
                tracing::debug!(count = flights.len(), "flights loaded");
                self.flights = flights;
                Ok(())
            }
            Err(e) => {
                self.notices.error(format!("Could not load flights: {e}"));
                Err(e)
            }
        }
    }

    pub fn link_for(flight: &Flight) -> Route {
        Route::Flight(flight.flight_id.clone())
    }
}
