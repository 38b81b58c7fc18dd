use chrono::{DateTime, NaiveDateTime};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::model::{Booking, Flight, Location, Notification};

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// Server timestamps as `YYYY-MM-DD HH:MM`; unparseable values pass through.
pub fn format_time(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    raw.to_string()
}

pub fn format_date(raw: &str) -> String {
    let formatted = format_time(raw);
    match formatted.split_once(' ') {
        Some((date, _)) if formatted != raw => date.to_string(),
        _ => formatted,
    }
}

/// First 8 characters, for the long UUID ids the server hands out.
pub fn short_id(id: &str) -> String {
    if id.chars().count() > 8 {
        format!("{}…", id.chars().take(8).collect::<String>())
    } else {
        id.to_string()
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn render_flights(flights: &[Flight]) -> String {
    let mut table = new_table(vec![
        "ID", "Flight", "Route", "Cities", "Depart", "Arrive", "Seats", "Price",
    ]);

    for f in flights {
        table.add_row(vec![
            f.flight_id.clone(),
            f.flight_number.clone(),
            format!(
                "{} → {}",
                f.departure_location.airport_code, f.arrival_location.airport_code
            ),
            format!("{} to {}", f.departure_location.city, f.arrival_location.city),
            format_time(&f.departure_time),
            format_time(&f.arrival_time),
            format!("{}/{}", f.available_seats, f.total_seats),
            format_price(f.price),
        ]);
    }

    table.to_string()
}

pub fn render_flight(f: &Flight) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let rows = [
        ("Flight Number", f.flight_number.clone()),
        (
            "From",
            format!("{} ({})", f.departure_location.city, f.departure_location.airport_code),
        ),
        (
            "To",
            format!("{} ({})", f.arrival_location.city, f.arrival_location.airport_code),
        ),
        ("Departure", format_time(&f.departure_time)),
        ("Arrival", format_time(&f.arrival_time)),
        ("Seats", format!("{}/{}", f.available_seats, f.total_seats)),
        ("Price", format_price(f.price)),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    table.to_string()
}

pub fn render_bookings(bookings: &[Booking]) -> String {
    let mut table = new_table(vec!["Booking", "Flight", "Status", "Booked", "Passengers"]);
    for b in bookings {
        table.add_row(vec![
            b.booking_id.clone(),
            short_id(&b.flight_id),
            b.status.to_string(),
            format_date(&b.booking_date),
            b.passengers_details.len().to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_booking_detail(booking: &Booking, flight: Option<&Flight>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Booking ID:   {}\n", short_id(&booking.booking_id)));
    out.push_str(&format!("Status:       {}\n", booking.status));
    out.push_str(&format!("Booking Date: {}\n", format_date(&booking.booking_date)));

    if let Some(f) = flight {
        out.push_str("\nFlight Information:\n");
        out.push_str(&render_flight(f));
        out.push('\n');
    }

    out.push_str("\nPassengers:\n");
    for p in &booking.passengers_details {
        out.push_str(&format!("  - {} {}\n", p.first_name, p.last_name));
    }
    out
}

pub fn render_locations(locations: &[Location]) -> String {
    let mut table = new_table(vec!["ID", "Code", "Name", "City", "Country"]);
    for l in locations {
        table.add_row(vec![
            l.location_id.clone(),
            l.airport_code.clone(),
            l.name.clone(),
            l.city.clone(),
            l.country.clone(),
        ]);
    }
    table.to_string()
}

pub fn render_notifications(notifications: &[Notification]) -> String {
    let mut out = format!("🔔 {}\n", notifications.len());
    for n in notifications {
        match n.created_at.as_deref() {
            Some(at) => out.push_str(&format!("  [{}] {}\n", format_time(at), n.message)),
            None => out.push_str(&format!("  {}\n", n.message)),
        }
    }
    out
}
