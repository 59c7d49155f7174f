//! Explicit client configuration.
//!
//! # Design
//! The environment is read once, in `ApiConfig::from_env`. Managers take an
//! `ApiConfig` by reference and reject a missing token at construction, so no
//! operation looks anything up lazily.

use std::env;

use crate::endpoint::{self, Category};
use crate::error::ApiError;

pub const DEFAULT_SITE: &str = "https://www.pythonanywhere.com";

const MISSING_TOKEN: &str = "could not find your API token; \
     create one on the Account page and expose it as API_TOKEN";

#[derive(Clone)]
pub struct ApiConfig {
    username: String,
    site: String,
    token: Option<String>,
    insecure: bool,
}

impl ApiConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            site: DEFAULT_SITE.to_string(),
            token: None,
            insecure: false,
        }
    }

    /// Build a configuration from `API_TOKEN`, `USER`/`USERNAME`,
    /// `PYTHONANYWHERE_SITE`, `PYTHONANYWHERE_DOMAIN` and
    /// `PYTHONANYWHERE_INSECURE_API`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let username = lookup("USER").or_else(|| lookup("USERNAME")).ok_or_else(|| {
            ApiError::Configuration("could not determine the current username".into())
        })?;

        let host = match lookup("PYTHONANYWHERE_SITE") {
            Some(site) => site,
            None => {
                let domain = lookup("PYTHONANYWHERE_DOMAIN")
                    .unwrap_or_else(|| "pythonanywhere.com".to_string());
                format!("www.{domain}")
            }
        };

        let mut config = Self::new(username).with_site(format!("https://{host}"));
        if let Some(token) = lookup("API_TOKEN") {
            config = config.with_token(token);
        }
        config.insecure = lookup("PYTHONANYWHERE_INSECURE_API").as_deref() == Some("true");
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the API origin, e.g. `https://eu.pythonanywhere.com`.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    /// The API token, or a configuration error when none is set.
    pub fn token(&self) -> Result<&str, ApiError> {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ApiError::Configuration(MISSING_TOKEN.to_string())),
        }
    }

    pub fn endpoint(&self, category: Category) -> String {
        endpoint::resolve(&self.site, &self.username, category)
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("username", &self.username)
            .field("site", &self.site)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_site_is_used() {
        let config = ApiConfig::new("alice");
        assert_eq!(
            config.endpoint(Category::Schedule),
            "https://www.pythonanywhere.com/api/v0/user/alice/schedule/"
        );
    }

    #[test]
    fn trailing_slash_is_stripped_from_site() {
        let config = ApiConfig::new("alice").with_site("http://localhost:3000/");
        assert_eq!(config.site(), "http://localhost:3000");
    }

    #[test]
    fn missing_or_blank_token_is_a_configuration_error() {
        assert!(matches!(
            ApiConfig::new("alice").token(),
            Err(ApiError::Configuration(_))
        ));
        assert!(matches!(
            ApiConfig::new("alice").with_token("  ").token(),
            Err(ApiError::Configuration(_))
        ));
        assert_eq!(ApiConfig::new("alice").with_token("t0k").token().unwrap(), "t0k");
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn from_lookup_defaults() {
        let config =
            ApiConfig::from_lookup(lookup(&[("USER", "alice"), ("API_TOKEN", "t0k")])).unwrap();
        assert_eq!(config.username(), "alice");
        assert_eq!(config.site(), "https://www.pythonanywhere.com");
        assert_eq!(config.token().unwrap(), "t0k");
        assert!(!config.insecure());
    }

    #[test]
    fn from_lookup_falls_back_to_username() {
        let config = ApiConfig::from_lookup(lookup(&[("USERNAME", "bob")])).unwrap();
        assert_eq!(config.username(), "bob");
        assert!(matches!(config.token(), Err(ApiError::Configuration(_))));

        let config =
            ApiConfig::from_lookup(lookup(&[("USER", "alice"), ("USERNAME", "bob")])).unwrap();
        assert_eq!(config.username(), "alice");
    }

    #[test]
    fn from_lookup_without_username_is_a_configuration_error() {
        let result = ApiConfig::from_lookup(lookup(&[("API_TOKEN", "t0k")]));
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn from_lookup_builds_site_from_domain() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("USER", "alice"),
            ("PYTHONANYWHERE_DOMAIN", "eu.pythonanywhere.com"),
        ]))
        .unwrap();
        assert_eq!(config.site(), "https://www.eu.pythonanywhere.com");
    }

    #[test]
    fn from_lookup_site_wins_over_domain() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("USER", "alice"),
            ("PYTHONANYWHERE_SITE", "api.example.org"),
            ("PYTHONANYWHERE_DOMAIN", "eu.pythonanywhere.com"),
        ]))
        .unwrap();
        assert_eq!(config.site(), "https://api.example.org");
        assert_eq!(
            config.endpoint(Category::Websites),
            "https://api.example.org/api/v0/user/alice/websites/"
        );
    }

    #[test]
    fn from_lookup_insecure_only_for_true() {
        let insecure = ApiConfig::from_lookup(lookup(&[
            ("USER", "alice"),
            ("PYTHONANYWHERE_INSECURE_API", "true"),
        ]))
        .unwrap();
        assert!(insecure.insecure());

        let secure = ApiConfig::from_lookup(lookup(&[
            ("USER", "alice"),
            ("PYTHONANYWHERE_INSECURE_API", "yes"),
        ]))
        .unwrap();
        assert!(!secure.insecure());
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = ApiConfig::new("alice").with_token("secret-token");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
