use std::sync::Arc;

use crate::api::{self, paths, Api};
use crate::error::BookingError;
use crate::model::{Flight, NewBooking, Passenger, Role, Session};
use crate::notice::Notices;
use crate::route::{Decision, Route};

pub struct FlightView {
    api: Arc<dyn Api>,
    notices: Notices,
    flight: Option<Flight>,
}

impl FlightView {
    pub fn new(api: Arc<dyn Api>, notices: Notices) -> Self {
        Self {
            api,
            notices,
            flight: None,
        }
    }

    pub fn flight(&self) -> Option<&Flight> {
        self.flight.as_ref()
    }

    pub async fn load(&mut self, flight_id: &str) -> Result<(), BookingError> {
        self.flight = None;
        let result = match self.api.get(&paths::flight(flight_id), &[]).await {
            Ok(value) => api::decode::<Flight>(value),
            Err(e) => Err(e),
        };
        match result {
            Ok(flight) => {
                self.flight = Some(flight);
                Ok(())
            }
            Err(e) => {
                self.notices.error(format!("Could not load flight {flight_id}: {e}"));
                Err(e)
            }
        }
    }

    /// Books the loaded flight. Anyone but a signed-in client is redirected
    /// to login with this flight as the return route.
    pub async fn book(
        &mut self,
        session: Option<&Session>,
        passengers: Vec<Passenger>,
    ) -> Result<Decision, BookingError> {
        let Some(flight) = self.flight.clone() else {
            return Err(self.invalid("No flight loaded"));
        };

        if !session.is_some_and(|s| s.role() == Role::Client) {
            return Ok(Decision::Redirect {
                to: Route::Login,
                from: Some(Route::Flight(flight.flight_id)),
            });
        }

        if passengers.is_empty() {
            return Err(self.invalid("At least one passenger is required"));
        }
        if passengers
            .iter()
            .any(|p| p.first_name.trim().is_empty() || p.last_name.trim().is_empty())
        {
            return Err(self.invalid("Every passenger needs a first and last name"));
        }
        if passengers.len() > flight.available_seats as usize {
            return Err(self.invalid(format!(
                "Only {} seats left on {}",
                flight.available_seats, flight.flight_number
            )));
        }

        let booking = NewBooking {
            flight_id: flight.flight_id.clone(),
            passengers_details: passengers,
        };
        if let Err(e) = self.api.post(paths::BOOKINGS, api::encode(&booking)?).await {
            self.notices.error(format!("Booking failed: {e}"));
            return Err(e);
        }

        self.notices.success(format!("Flight {} booked", flight.flight_number));
        self.load(&flight.flight_id).await?;
        Ok(Decision::Render)
    }

    fn invalid(&self, message: impl Into<String>) -> BookingError {
        let message = message.into();
        self.notices.error(message.clone());
        BookingError::Validation(message)
    }
}

/// Parses "First Last" into a passenger; everything after the first word is
/// the last name.
pub fn parse_passenger(raw: &str) -> Result<Passenger, BookingError> {
    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.collect::<Vec<_>>()) {
        (Some(first), rest) if !rest.is_empty() => Ok(Passenger {
            first_name: first.to_string(),
            last_name: rest.join(" "),
        }),
        _ => Err(BookingError::Validation(format!(
            "passenger must be \"FIRST LAST\", got: \"{raw}\""
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passenger_with_compound_last_name() {
        let p = parse_passenger("Maria de la Cruz").unwrap();
        assert_eq!(p.first_name, "Maria");
        assert_eq!(p.last_name, "de la Cruz");
    }

    #[test]
    fn single_word_passenger_is_rejected() {
        assert!(parse_passenger("Cher").is_err());
        assert!(parse_passenger("   ").is_err());
    }
}
