//! Executes `HttpRequest` values against the network.
//!
//! `Invoker` is the single I/O seam of the crate. `UreqInvoker` is the
//! blocking production transport; tests substitute scripted implementations.

use tracing::debug;
use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip per call and returns the response as data,
/// whatever its status. Status interpretation belongs to the caller.
pub trait Invoker {
    fn invoke(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking ureq transport that authenticates every request with the
/// configured API token.
#[derive(Clone)]
pub struct UreqInvoker {
    agent: Agent,
    authorization: String,
}

impl UreqInvoker {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let token = config.token()?;

        // 4xx/5xx must come back as data, not as `Err`.
        let mut builder = Agent::config_builder().http_status_as_error(false);
        if config.insecure() {
            builder = builder.tls_config(TlsConfig::builder().disable_verification(true).build());
        }

        Ok(Self {
            agent: builder.build().new_agent(),
            authorization: format!("Token {token}"),
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Invoker for UreqInvoker {
    fn invoke(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            path,
            mut headers,
            body,
        } = request;
        headers.push(("authorization".to_string(), self.authorization.clone()));

        debug!(%method, url = %path, "calling API");

        let mut response = match (method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&path), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(&path), &headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(&path), &headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(&path), &headers).send_empty(),
            (HttpMethod::Patch, Some(body)) => {
                with_headers(self.agent.patch(&path), &headers).send(body.as_bytes())
            }
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(&path), &headers).send_empty(),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        debug!(%method, url = %path, status, "API responded");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ureq_invoker_requires_a_token() {
        let result = UreqInvoker::new(&ApiConfig::new("alice"));
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn ureq_invoker_formats_authorization_header() {
        let invoker = UreqInvoker::new(&ApiConfig::new("alice").with_token("abc")).unwrap();
        assert_eq!(invoker.authorization, "Token abc");
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let config = ApiConfig::new("alice").with_token("abc");
        let invoker = UreqInvoker::new(&config).unwrap();
        // Port 9 on loopback refuses connections.
        let err = invoker
            .invoke(HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
