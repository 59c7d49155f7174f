//! Website management: create, inspect, reload, SSL and delete.
//!
//! # Design
//! Same build/invoke/parse split as `Schedule`. Websites are addressed by
//! domain name, and certificate operations live under the separate domains
//! collection, so `Website` precomputes both base URLs at construction.
//!
//! Creation is guarded by a sanity check: unless `nuke` is set, the domain is
//! looked up first and an existing website aborts creation with
//! `ApiError::Conflict` before any create request is sent. Domain names are
//! restricted to hostname characters since they become URL path segments.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::endpoint::Category;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::invoker::{Invoker, UreqInvoker};
use crate::types::{SslInfo, WebappSpec, WebsiteInfo, WebsiteSpec};

const DOMAIN_TAKEN: &str = "domain with this domain name already exists";

/// Client for the websites and domains APIs.
#[derive(Clone)]
pub struct Website<I = UreqInvoker> {
    websites_base_url: String,
    domains_base_url: String,
    invoker: I,
}

impl Website<UreqInvoker> {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let invoker = UreqInvoker::new(config)?;
        Self::with_invoker(config, invoker)
    }
}

fn require(value: &str, what: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Domain names go into URL paths verbatim, so only hostname characters pass.
fn check_domain(domain_name: &str) -> Result<(), ApiError> {
    require(domain_name, "domain name")?;
    let valid = domain_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if !valid {
        return Err(ApiError::InvalidInput(format!(
            "domain name {domain_name:?} contains characters not allowed in a hostname"
        )));
    }
    Ok(())
}

impl<I: Invoker> Website<I> {
    /// Fails with `ApiError::Configuration` when `config` has no API token.
    pub fn with_invoker(config: &ApiConfig, invoker: I) -> Result<Self, ApiError> {
        config.token()?;
        Ok(Self {
            websites_base_url: config.endpoint(Category::Websites),
            domains_base_url: config.endpoint(Category::Domains),
            invoker,
        })
    }

    pub fn websites_base_url(&self) -> &str {
        &self.websites_base_url
    }

    pub fn domains_base_url(&self) -> &str {
        &self.domains_base_url
    }

    fn website_url(&self, domain_name: &str) -> Result<String, ApiError> {
        check_domain(domain_name)?;
        Ok(format!("{}{domain_name}/", self.websites_base_url))
    }

    fn ssl_url(&self, domain_name: &str) -> Result<String, ApiError> {
        check_domain(domain_name)?;
        Ok(format!("{}{domain_name}/ssl/", self.domains_base_url))
    }

    pub fn build_create(&self, domain_name: &str, command: &str) -> Result<HttpRequest, ApiError> {
        check_domain(domain_name)?;
        require(command, "command")?;
        let spec = WebsiteSpec {
            domain_name: domain_name.to_string(),
            enabled: true,
            webapp: WebappSpec {
                command: command.to_string(),
            },
        };
        HttpRequest::new(HttpMethod::Post, self.websites_base_url.as_str()).with_json(&spec)
    }

    pub fn build_get(&self, domain_name: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::new(HttpMethod::Get, self.website_url(domain_name)?))
    }

    pub fn build_list(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.websites_base_url.as_str())
    }

    pub fn build_reload(&self, domain_name: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::new(
            HttpMethod::Post,
            format!("{}reload/", self.website_url(domain_name)?),
        ))
    }

    pub fn build_auto_ssl(&self, domain_name: &str) -> Result<HttpRequest, ApiError> {
        HttpRequest::new(HttpMethod::Post, self.ssl_url(domain_name)?)
            .with_json(&json!({"cert_type": "letsencrypt-auto-renew"}))
    }

    pub fn build_get_ssl_info(&self, domain_name: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::new(HttpMethod::Get, self.ssl_url(domain_name)?))
    }

    pub fn build_delete(&self, domain_name: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::new(HttpMethod::Delete, self.website_url(domain_name)?))
    }

    /// A 400 naming the taken domain becomes `Conflict`; any other non-201
    /// status is an `ApiFailure`.
    pub fn parse_create(&self, response: HttpResponse) -> Result<WebsiteInfo, ApiError> {
        if response.status == 400 && response.body.contains(DOMAIN_TAKEN) {
            warn!(body = %response.body, "server refused website creation: domain taken");
            return Err(ApiError::Conflict(format!(
                "a website for this domain already exists: {}",
                response.body
            )));
        }
        response.expect_status(201)?.json()
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<WebsiteInfo, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<WebsiteInfo>, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_reload(&self, response: HttpResponse) -> Result<Value, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_auto_ssl(&self, response: HttpResponse) -> Result<Value, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_get_ssl_info(&self, response: HttpResponse) -> Result<SslInfo, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        response.expect_status(204)?;
        Ok(())
    }

    /// Pre-flight check for `create`. The token was validated at
    /// construction; this looks the domain up unless `nuke` is set. A 200 is a
    /// conflict, a 404 means the domain is free, and any other status leaves
    /// the site's state unknown and fails with `ApiFailure`.
    pub fn sanity_check(&self, domain_name: &str, nuke: bool) -> Result<(), ApiError> {
        info!(domain = domain_name, nuke, "running API sanity checks");
        if nuke {
            return Ok(());
        }

        let response = self.invoker.invoke(self.build_get(domain_name)?)?;
        if response.status == 200 {
            warn!(domain = domain_name, "website already exists");
            return Err(ApiError::Conflict(format!(
                "you already have a webapp for {domain_name}; create it with nuke to replace it"
            )));
        }
        response.expect_status(404)?;
        debug!(domain = domain_name, status = response.status, "no existing website");
        Ok(())
    }

    /// Create a website for `domain_name` running `command`. With `nuke` the
    /// existence check is skipped and the server is expected to replace any
    /// existing website.
    pub fn create(
        &self,
        domain_name: &str,
        command: &str,
        nuke: bool,
    ) -> Result<WebsiteInfo, ApiError> {
        let request = self.build_create(domain_name, command)?;
        self.sanity_check(domain_name, nuke)?;
        let website = self.parse_create(self.invoker.invoke(request)?)?;
        info!(domain = %website.domain_name, "website created");
        Ok(website)
    }

    pub fn get(&self, domain_name: &str) -> Result<WebsiteInfo, ApiError> {
        let response = self.invoker.invoke(self.build_get(domain_name)?)?;
        self.parse_get(response)
    }

    pub fn list(&self) -> Result<Vec<WebsiteInfo>, ApiError> {
        let response = self.invoker.invoke(self.build_list())?;
        self.parse_list(response)
    }

    pub fn reload(&self, domain_name: &str) -> Result<Value, ApiError> {
        let response = self.invoker.invoke(self.build_reload(domain_name)?)?;
        let result = self.parse_reload(response)?;
        info!(domain = domain_name, "website reloaded");
        Ok(result)
    }

    /// Request a Let's Encrypt certificate that renews automatically.
    pub fn auto_ssl(&self, domain_name: &str) -> Result<Value, ApiError> {
        let response = self.invoker.invoke(self.build_auto_ssl(domain_name)?)?;
        let result = self.parse_auto_ssl(response)?;
        info!(domain = domain_name, "auto-renewing certificate requested");
        Ok(result)
    }

    pub fn get_ssl_info(&self, domain_name: &str) -> Result<SslInfo, ApiError> {
        let response = self.invoker.invoke(self.build_get_ssl_info(domain_name)?)?;
        self.parse_get_ssl_info(response)
    }

    pub fn delete(&self, domain_name: &str) -> Result<(), ApiError> {
        let response = self.invoker.invoke(self.build_delete(domain_name)?)?;
        self.parse_delete(response)?;
        info!(domain = domain_name, "website deleted");
        Ok(())
    }
}
