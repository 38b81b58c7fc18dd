use std::fmt;

#[derive(Debug)]
pub enum BookingError {
    Timeout,
    ConnectionFailed(String),
    DnsResolution(String),
    ProxyError(String),
    TlsError(String),
    Unauthorized(u16),
    Forbidden,
    NotFound(String),
    HttpStatus(u16, String),
    Decode(String),
    Validation(String),
    InvalidRoute(String),
    Storage(String),
    Config(String),
}

impl fmt::Display for BookingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(
                f,
                "request timed out, the booking API may be slow or unreachable. \
                 Try increasing --timeout or check your connection"
            ),
            Self::ConnectionFailed(detail) => write!(
                f,
                "connection failed, check the API URL and your connection ({detail})"
            ),
            Self::DnsResolution(host) => write!(
                f,
                "DNS resolution failed for {host}, check the API URL"
            ),
            Self::ProxyError(detail) => write!(
                f,
                "proxy error, check your --proxy URL is correct ({detail})"
            ),
            Self::TlsError(detail) => write!(
                f,
                "TLS/SSL error talking to the booking API ({detail})"
            ),
            Self::Unauthorized(status) => write!(
                f,
                "not authenticated (HTTP {status}), run `skybook login` first"
            ),
            Self::Forbidden => write!(
                f,
                "the booking API refused this action for your account (HTTP 403)"
            ),
            Self::NotFound(path) => write!(f, "not found: {path}"),
            Self::HttpStatus(status, body) => {
                if body.is_empty() {
                    write!(f, "unexpected HTTP status {status} from the booking API")
                } else {
                    write!(f, "booking API returned HTTP {status}: {body}")
                }
            }
            Self::Decode(detail) => write!(
                f,
                "failed to read the booking API response ({detail})"
            ),
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::InvalidRoute(path) => write!(
                f,
                "unknown route \"{path}\" (expected /, /login, /register, /flight/<id>, /history or /admin)"
            ),
            Self::Storage(detail) => write!(f, "session storage error: {detail}"),
            Self::Config(detail) => write!(f, "invalid configuration: {detail}"),
        }
    }
}

impl std::error::Error for BookingError {}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub fn from_http_error(err: wreq::Error) -> BookingError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if err.is_timeout() {
        return BookingError::Timeout;
    }

    if err.is_connect() {
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("getaddrinfo") {
            return BookingError::DnsResolution(msg);
        }
        return BookingError::ConnectionFailed(msg);
    }

    if lower.contains("proxy") || lower.contains("socks") {
        return BookingError::ProxyError(msg);
    }

    if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        return BookingError::TlsError(msg);
    }

    if lower.contains("builder error") && lower.contains("uri") {
        return BookingError::ConnectionFailed(msg);
    }

    BookingError::ConnectionFailed(msg)
}

/// Maps a non-success status to an error; `None` for 2xx/3xx.
pub fn from_status(status: u16, path: &str, body: &str) -> Option<BookingError> {
    match status {
        401 => Some(BookingError::Unauthorized(status)),
        403 => Some(BookingError::Forbidden),
        404 => Some(BookingError::NotFound(path.to_string())),
        _ if status >= 400 => Some(BookingError::HttpStatus(status, summarize_body(body))),
        _ => None,
    }
}

// DRF-style bodies are usually {"detail": "..."} or {"field": ["msg"]}.
fn summarize_body(body: &str) -> String {
    let trimmed = body.trim();
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            if let Some(detail) = map.get("detail").and_then(|d| d.as_str()) {
                return detail.to_string();
            }
            map.iter()
                .map(|(field, v)| match v {
                    serde_json::Value::Array(items) => {
                        let msgs: Vec<String> = items
                            .iter()
                            .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                            .collect();
                        format!("{field}: {}", msgs.join(", "))
                    }
                    serde_json::Value::String(s) => format!("{field}: {s}"),
                    other => format!("{field}: {other}"),
                })
                .collect::<Vec<_>>()
                .join("; ")
        }
        _ => trimmed.chars().take(200).collect(),
    }
}
