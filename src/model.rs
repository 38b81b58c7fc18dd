use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Client,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "CLIENT"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub first_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn role(&self) -> Role {
        self.user.role
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "access")]
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "string_or_number")]
    pub location_id: String,
    pub name: String,
    pub airport_code: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub name: String,
    pub airport_code: String,
    pub city: String,
    pub country: String,
}

impl From<&Location> for LocationInput {
    fn from(loc: &Location) -> Self {
        Self {
            name: loc.name.clone(),
            airport_code: loc.airport_code.clone(),
            city: loc.city.clone(),
            country: loc.country.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(deserialize_with = "string_or_number")]
    pub flight_id: String,
    pub flight_number: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub total_seats: u32,
    pub available_seats: u32,
    #[serde(deserialize_with = "price")]
    pub price: f64,
    pub departure_location: Location,
    pub arrival_location: Location,
}

/// Write form of a flight; locations are airport codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewFlight {
    pub flight_number: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub total_seats: u32,
    pub available_seats: u32,
    pub price: f64,
    pub departure_location: String,
    pub arrival_location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Pending,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Pending => write!(f, "PENDING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(deserialize_with = "string_or_number")]
    pub booking_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub flight_id: String,
    pub status: BookingStatus,
    pub booking_date: String,
    #[serde(default)]
    pub passengers_details: Vec<Passenger>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub flight_id: String,
    pub passengers_details: Vec<Passenger>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

// Decimal fields come back as strings ("299.99") from most REST frameworks.
fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("price out of range")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid price \"{s}\""))),
        other => Err(serde::de::Error::custom(format!(
            "expected price, got {other}"
        ))),
    }
}
