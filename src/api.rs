use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use wreq::Client;

use crate::config::ApiConfig;
use crate::error::{self, BookingError};
use crate::model::Session;

/// Call surface of the booking REST API. Paths are relative to the base URL
/// and keep the server's trailing slash (`/flights/`, `/bookings/{id}/`).
#[async_trait]
pub trait Api: Send + Sync {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, BookingError>;
    async fn post(&self, path: &str, body: Value) -> Result<Value, BookingError>;
    async fn patch(&self, path: &str, body: Value) -> Result<Value, BookingError>;
    async fn delete(&self, path: &str) -> Result<(), BookingError>;
}

pub mod paths {
    pub const LOCATIONS: &str = "/locations/";
    pub const FLIGHTS: &str = "/flights/";
    pub const BOOKINGS: &str = "/bookings/";
    pub const LOGIN: &str = "/auth/login/";
    pub const REGISTER: &str = "/auth/register/";

    pub fn location(id: &str) -> String {
        format!("/locations/{id}/")
    }

    pub fn flight(id: &str) -> String {
        format!("/flights/{id}/")
    }

    pub fn booking(id: &str) -> String {
        format!("/bookings/{id}/")
    }

    pub fn notifications(user_id: &str) -> String {
        format!("/notifications/{user_id}/")
    }
}

pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BookingError> {
    Ok(serde_json::from_value(value)?)
}

pub fn encode<T: Serialize>(value: &T) -> Result<Value, BookingError> {
    Ok(serde_json::to_value(value)?)
}

#[derive(Clone, Copy)]
enum Verb {
    Get,
    Post,
    Patch,
    Delete,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// `Api` over HTTP. The bearer token is read from the session channel on
/// every request, so login/logout take effect without rebuilding the client.
pub struct HttpApi {
    client: Client,
    base_url: String,
    session: watch::Receiver<Option<Session>>,
}

impl HttpApi {
    pub fn new(
        config: &ApiConfig,
        session: watch::Receiver<Option<Session>>,
    ) -> Result<Self, BookingError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout));

        if let Some(ref proxy) = config.proxy {
            builder = builder.proxy(wreq::Proxy::all(proxy).map_err(error::from_http_error)?);
        }

        let client = builder.build().map_err(error::from_http_error)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.session
            .borrow()
            .as_ref()
            .map(|s| format!("Bearer {}", s.token))
    }

    async fn send(
        &self,
        verb: Verb,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, BookingError> {
        let url = self.url(path);
        tracing::debug!(method = verb.as_str(), %url, "api request");

        let mut request = match verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
            Verb::Patch => self.client.patch(&url),
            Verb::Delete => self.client.delete(&url),
        };

        request = request.header("Accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(auth) = self.bearer() {
            request = request.header("Authorization", auth);
        }
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await.map_err(error::from_http_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(error::from_http_error)?;
        tracing::debug!(method = verb.as_str(), %url, status, "api response");

        if let Some(err) = error::from_status(status, path, &text) {
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Api for HttpApi {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, BookingError> {
        self.send(Verb::Get, path, query, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, BookingError> {
        self.send(Verb::Post, path, &[], Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, BookingError> {
        self.send(Verb::Patch, path, &[], Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), BookingError> {
        self.send(Verb::Delete, path, &[], None).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_paths_keep_trailing_slash() {
        assert_eq!(paths::location("4"), "/locations/4/");
        assert_eq!(paths::flight("F1"), "/flights/F1/");
        assert_eq!(paths::booking("B1"), "/bookings/B1/");
        assert_eq!(paths::notifications("42"), "/notifications/42/");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let (_tx, rx) = watch::channel(None);
        let config = ApiConfig {
            base_url: "http://localhost:8000/api/".into(),
            ..ApiConfig::default()
        };
        let api = HttpApi::new(&config, rx).unwrap();
        assert_eq!(api.url(paths::FLIGHTS), "http://localhost:8000/api/flights/");
        assert!(api.bearer().is_none());
    }
}
