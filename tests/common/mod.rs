#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use skybook::api::Api;
use skybook::error::{self, BookingError};
use skybook::model::{Role, Session, User};
use skybook::notice::{self, NoticeReceiver, Notices};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Offline,
}

/// Recording fake of the booking API. Replies are queued per
/// (method, path); the last queued reply keeps being returned.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<HashMap<(String, String), VecDeque<Reply>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, BookingError> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body,
        });

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&(method.to_string(), path.to_string())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Json(v)) => Ok(v),
            Some(Reply::Status(status)) => Err(error::from_status(status, path, "")
                .unwrap_or_else(|| BookingError::HttpStatus(status, String::new()))),
            Some(Reply::Offline) => Err(BookingError::ConnectionFailed("offline".into())),
            None => Err(BookingError::NotFound(path.to_string())),
        }
    }
}

#[async_trait]
impl Api for FakeApi {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, BookingError> {
        self.respond("GET", path, query, None)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, BookingError> {
        self.respond("POST", path, &[], Some(body))
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, BookingError> {
        self.respond("PATCH", path, &[], Some(body))
    }

    async fn delete(&self, path: &str) -> Result<(), BookingError> {
        self.respond("DELETE", path, &[], None).map(|_| ())
    }
}

pub fn session(id: &str, role: Role) -> Session {
    Session {
        user: User {
            id: id.into(),
            first_name: "Ana".into(),
            role,
        },
        token: format!("token-{id}"),
    }
}

pub fn notices() -> (Notices, NoticeReceiver) {
    notice::channel()
}

pub fn location(id: &str, code: &str, city: &str) -> Value {
    json!({
        "location_id": id,
        "name": format!("{city} International"),
        "airport_code": code,
        "city": city,
        "country": "USA",
    })
}

pub fn flight(id: &str, number: &str, seats: u32) -> Value {
    json!({
        "flight_id": id,
        "flight_number": number,
        "departure_time": "2026-04-01T10:00:00Z",
        "arrival_time": "2026-04-01T13:30:00Z",
        "total_seats": 180,
        "available_seats": seats,
        "price": "299.99",
        "departure_location": location("1", "JFK", "New York"),
        "arrival_location": location("2", "LAX", "Los Angeles"),
    })
}

pub fn booking(id: &str, flight_id: &str, status: &str) -> Value {
    json!({
        "booking_id": id,
        "flight_id": flight_id,
        "status": status,
        "booking_date": "2026-02-10T09:15:00Z",
        "passengers_details": [
            {"first_name": "Ana", "last_name": "Silva"},
            {"first_name": "Luis", "last_name": "Silva"}
        ],
    })
}

pub fn notification(id: u32, message: &str) -> Value {
    json!({ "id": id, "message": message })
}
