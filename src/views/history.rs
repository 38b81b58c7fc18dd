use std::sync::Arc;

use crate::api::{self, paths, Api};
use crate::error::BookingError;
use crate::model::{Booking, BookingStatus, Flight};
use crate::notice::Notices;
use crate::views::Confirm;

pub struct HistoryView {
    api: Arc<dyn Api>,
    notices: Notices,
    bookings: Vec<Booking>,
    selected: Option<Booking>,
    flight: Option<Flight>,
}

impl HistoryView {
    pub fn new(api: Arc<dyn Api>, notices: Notices) -> Self {
        Self {
            api,
            notices,
            bookings: Vec::new(),
            selected: None,
            flight: None,
        }
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn selected(&self) -> Option<&Booking> {
        self.selected.as_ref()
    }

    /// Flight of the selected booking, once its lazy fetch succeeded.
    pub fn flight(&self) -> Option<&Flight> {
        self.flight.as_ref()
    }

    pub fn reset(&mut self) {
        self.bookings.clear();
        self.selected = None;
        self.flight = None;
    }

    pub async fn load(&mut self) -> Result<(), BookingError> {
        match fetch_bookings(self.api.as_ref()).await {
            Ok(bookings) => {
                self.bookings = bookings;
                Ok(())
            }
            Err(e) => {
                self.notices.error(format!("Could not load bookings: {e}"));
                Err(e)
            }
        }
    }

    /// Selects a booking from the loaded list and fetches its flight. A
    /// failed flight fetch leaves the detail empty.
    pub async fn select(&mut self, booking_id: &str) -> Result<(), BookingError> {
        let Some(booking) = self
            .bookings
            .iter()
            .find(|b| b.booking_id == booking_id)
            .cloned()
        else {
            let message = format!("No booking {booking_id} in your history");
            self.notices.error(message.clone());
            return Err(BookingError::Validation(message));
        };

        let flight_id = booking.flight_id.clone();
        self.selected = Some(booking);
        self.flight = None;

        let result = match self.api.get(&paths::flight(&flight_id), &[]).await {
            Ok(value) => api::decode::<Flight>(value),
            Err(e) => Err(e),
        };
        match result {
            Ok(flight) => self.flight = Some(flight),
            Err(e) => tracing::warn!(flight = %flight_id, error = %e, "flight detail unavailable"),
        }
        Ok(())
    }

    /// Cancels after confirmation, then clears the selection and reloads.
    /// Declining sends nothing; a failed delete leaves everything as it was.
    /// Returns whether the booking was cancelled. A failed reload after a
    /// successful delete is reported through notices only.
    pub async fn cancel(
        &mut self,
        booking_id: &str,
        confirm: &mut dyn Confirm,
    ) -> Result<bool, BookingError> {
        let known = self.bookings.iter().find(|b| b.booking_id == booking_id);
        if known.is_some_and(|b| b.status == BookingStatus::Cancelled) {
            let message = format!("Booking {booking_id} is already cancelled");
            self.notices.error(message.clone());
            return Err(BookingError::Validation(message));
        }

        if !confirm.confirm("Are you sure you want to cancel this booking?") {
            return Ok(false);
        }

        if let Err(e) = self.api.delete(&paths::booking(booking_id)).await {
            self.notices.error(format!("Error cancelling booking: {e}"));
            return Err(e);
        }

        self.notices.success("Booking cancelled successfully");
        self.selected = None;
        self.flight = None;
        if let Err(e) = self.load().await {
            tracing::warn!(booking = %booking_id, error = %e, "reload after cancel failed");
        }
        Ok(true)
    }
}

async fn fetch_bookings(api: &dyn Api) -> Result<Vec<Booking>, BookingError> {
    api::decode(api.get(paths::BOOKINGS, &[]).await?)
}
