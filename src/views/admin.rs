use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};

use crate::api::{self, paths, Api};
use crate::error::BookingError;
use crate::model::{Location, LocationInput, NewFlight};
use crate::notice::Notices;
use crate::views::mutate_then_reload;

/// Location form: `Idle` creates, `Editing` replaces the fields of `id`.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationForm {
    Idle(LocationInput),
    Editing { id: String, fields: LocationInput },
}

impl Default for LocationForm {
    fn default() -> Self {
        Self::Idle(LocationInput::default())
    }
}

impl LocationForm {
    pub fn fields(&self) -> &LocationInput {
        match self {
            Self::Idle(fields) | Self::Editing { fields, .. } => fields,
        }
    }

    pub fn fields_mut(&mut self) -> &mut LocationInput {
        match self {
            Self::Idle(fields) | Self::Editing { fields, .. } => fields,
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            Self::Idle(_) => None,
            Self::Editing { id, .. } => Some(id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightForm {
    draft: NewFlight,
}

impl FlightForm {
    pub fn draft(&self) -> &NewFlight {
        &self.draft
    }

    pub fn set_flight_number(&mut self, value: impl Into<String>) {
        self.draft.flight_number = value.into();
    }

    pub fn set_departure_time(&mut self, value: impl Into<String>) {
        self.draft.departure_time = value.into();
    }

    pub fn set_arrival_time(&mut self, value: impl Into<String>) {
        self.draft.arrival_time = value.into();
    }

    /// Available seats follow total seats; there is no separate input.
    pub fn set_total_seats(&mut self, seats: u32) {
        self.draft.total_seats = seats;
        self.draft.available_seats = seats;
    }

    pub fn set_price(&mut self, price: f64) {
        self.draft.price = price;
    }

    pub fn set_departure_location(&mut self, airport_code: impl Into<String>) {
        self.draft.departure_location = airport_code.into();
    }

    pub fn set_arrival_location(&mut self, airport_code: impl Into<String>) {
        self.draft.arrival_location = airport_code.into();
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        let d = &self.draft;
        let missing: Vec<&str> = [
            ("flight number", d.flight_number.as_str()),
            ("departure time", d.departure_time.as_str()),
            ("arrival time", d.arrival_time.as_str()),
            ("departure location", d.departure_location.as_str()),
            ("arrival location", d.arrival_location.as_str()),
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

        if d.departure_location.trim() == d.arrival_location.trim() {
            return Err(BookingError::Validation(
                "Departure and arrival cannot be the same".into(),
            ));
        }

        validate_datetime("departure time", &d.departure_time)?;
        validate_datetime("arrival time", &d.arrival_time)?;

        if d.total_seats == 0 {
            return Err(BookingError::Validation(
                "total seats must be at least 1".into(),
            ));
        }
        if !d.price.is_finite() || d.price < 0.0 {
            return Err(BookingError::Validation(format!(
                "invalid price {}",
                d.price
            )));
        }
        Ok(())
    }
}

/// Accepts the `datetime-local` forms (`2026-03-01T10:00`, with or without
/// seconds) and full RFC 3339 timestamps.
fn validate_datetime(field: &str, value: &str) -> Result<(), BookingError> {
    let value = value.trim();
    let ok = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok();
    if ok {
        Ok(())
    } else {
        Err(BookingError::Validation(format!(
            "{field} \"{value}\" must look like 2026-03-01T10:00"
        )))
    }
}

fn validate_location(fields: &LocationInput) -> Result<(), BookingError> {
    let missing: Vec<&str> = [
        ("name", fields.name.as_str()),
        ("airport code", fields.airport_code.as_str()),
        ("city", fields.city.as_str()),
        ("country", fields.country.as_str()),
    ]
    .into_iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(name, _)| name)
    .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(BookingError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

pub struct AdminView {
    api: Arc<dyn Api>,
    notices: Notices,
    locations: Vec<Location>,
    location_form: LocationForm,
    flight_form: FlightForm,
}

impl AdminView {
    pub fn new(api: Arc<dyn Api>, notices: Notices) -> Self {
        Self {
            api,
            notices,
            locations: Vec::new(),
            location_form: LocationForm::default(),
            flight_form: FlightForm::default(),
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location_form(&self) -> &LocationForm {
        &self.location_form
    }

    pub fn location_fields_mut(&mut self) -> &mut LocationInput {
        self.location_form.fields_mut()
    }

    pub fn flight_form(&self) -> &FlightForm {
        &self.flight_form
    }

    pub fn flight_form_mut(&mut self) -> &mut FlightForm {
        &mut self.flight_form
    }

    pub fn reset(&mut self) {
        self.locations.clear();
        self.location_form = LocationForm::default();
        self.flight_form = FlightForm::default();
    }

    pub async fn load(&mut self) -> Result<(), BookingError> {
        match fetch_locations(self.api.as_ref()).await {
            Ok(locations) => {
                self.locations = locations;
                Ok(())
            }
            Err(e) => {
                self.notices.error(format!("Could not load locations: {e}"));
                Err(e)
            }
        }
    }

    /// Idle/Editing -> Editing with the location's current fields.
    pub fn start_edit(&mut self, location_id: &str) -> Result<(), BookingError> {
        let Some(location) = self.locations.iter().find(|l| l.location_id == location_id) else {
            let message = format!("No location {location_id} in the list");
            self.notices.error(message.clone());
            return Err(BookingError::Validation(message));
        };
        self.location_form = LocationForm::Editing {
            id: location.location_id.clone(),
            fields: LocationInput::from(location),
        };
        Ok(())
    }

    /// Editing -> Idle with empty fields.
    pub fn cancel_edit(&mut self) {
        self.location_form = LocationForm::default();
    }

    /// POST while idle, PATCH while editing, then one reload of the list.
    /// The form returns to Idle only on success.
    pub async fn submit_location(&mut self) -> Result<(), BookingError> {
        let fields = self.location_form.fields().clone();
        if let Err(e) = validate_location(&fields) {
            self.notices.error(e.to_string());
            return Err(e);
        }

        let body = api::encode(&fields)?;
        let api = self.api.as_ref();
        let editing = self.location_form.editing_id().map(str::to_string);

        let result = match editing {
            Some(ref id) => {
                let path = paths::location(id);
                mutate_then_reload(api.patch(&path, body), || fetch_locations(api)).await
            }
            None => {
                mutate_then_reload(api.post(paths::LOCATIONS, body), || fetch_locations(api)).await
            }
        };

        match result {
            Ok(locations) => {
                self.locations = locations;
                self.location_form = LocationForm::default();
                self.notices.success(match editing {
                    Some(_) => format!("Location {} updated", fields.airport_code),
                    None => format!("Location {} added", fields.airport_code),
                });
                Ok(())
            }
            Err(e) => {
                self.notices.error(format!("Could not save location: {e}"));
                Err(e)
            }
        }
    }

    pub async fn delete_location(&mut self, location_id: &str) -> Result<(), BookingError> {
        let api = self.api.as_ref();
        let path = paths::location(location_id);
        match mutate_then_reload(api.delete(&path), || fetch_locations(api)).await {
            Ok(locations) => {
                self.locations = locations;
                if self.location_form.editing_id() == Some(location_id) {
                    self.location_form = LocationForm::default();
                }
                self.notices.success("Location removed");
                Ok(())
            }
            Err(e) => {
                self.notices.error(format!("Could not remove location: {e}"));
                Err(e)
            }
        }
    }

    /// Validation failures are reported without touching the network. On
    /// success only the flight number is cleared, so similar flights can be
    /// entered quickly.
    pub async fn submit_flight(&mut self) -> Result<(), BookingError> {
        if let Err(e) = self.flight_form.validate() {
            self.notices.error(e.to_string());
            return Err(e);
        }

        let body = api::encode(self.flight_form.draft())?;
        if let Err(e) = self.api.post(paths::FLIGHTS, body).await {
            self.notices.error(format!("Could not add flight: {e}"));
            return Err(e);
        }

        self.notices.success(format!(
            "Flight {} added",
            self.flight_form.draft().flight_number
        ));
        self.flight_form.set_flight_number(String::new());
        Ok(())
    }
}

async fn fetch_locations(api: &dyn Api) -> Result<Vec<Location>, BookingError> {
    api::decode(api.get(paths::LOCATIONS, &[]).await?)
}
