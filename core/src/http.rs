//! HTTP request and response values exchanged with the invoker.
//!
//! # Design
//! Managers build `HttpRequest` values and interpret `HttpResponse` values as
//! plain data. Only the `Invoker` touches the network, so everything on either
//! side of it stays deterministic and easy to test.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ApiError::Configuration(format!("unsupported HTTP method: {s}"))),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attach a JSON payload and the matching content-type header.
    pub fn with_json<T: serde::Serialize + ?Sized>(mut self, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload).map_err(ApiError::Serialization)?;
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self.body = Some(body);
        Ok(self)
    }
}

/// An HTTP response described as plain data. Never retained past the call
/// that produced it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// True for any 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode the body as JSON. The raw text is kept in the error on failure.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|source| ApiError::Decode {
            source,
            body: self.body.clone(),
        })
    }

    /// Succeed only when the status is exactly `expected`.
    pub(crate) fn expect_status(&self, expected: u16) -> Result<&Self, ApiError> {
        if self.status == expected {
            return Ok(self);
        }
        tracing::warn!(status = self.status, expected, "unexpected API response status");
        Err(ApiError::ApiFailure {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!(matches!(
            "put".parse::<HttpMethod>(),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn ok_covers_the_2xx_range() {
        assert!(response(200, "").ok());
        assert!(response(204, "").ok());
        assert!(!response(301, "").ok());
        assert!(!response(404, "").ok());
    }

    #[test]
    fn json_failure_keeps_raw_text() {
        let err = response(200, "<html>oops</html>")
            .json::<serde_json::Value>()
            .unwrap_err();
        match err {
            ApiError::Decode { body, .. } => assert_eq!(body, "<html>oops</html>"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn expect_status_reports_body_text() {
        let err = response(500, "internal error").expect_status(200).unwrap_err();
        assert!(matches!(err, ApiError::ApiFailure { status: 500, ref body } if body == "internal error"));
    }

    #[test]
    fn with_json_sets_content_type() {
        let req = HttpRequest::new(HttpMethod::Post, "http://x/")
            .with_json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        assert_eq!(req.body.as_deref(), Some(r#"{"a":1}"#));
    }
}
