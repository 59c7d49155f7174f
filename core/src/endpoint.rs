//! Collection URLs for each API resource category.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Resource category that owns a collection endpoint under a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Schedule,
    Websites,
    Domains,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Schedule => "schedule",
            Category::Websites => "websites",
            Category::Domains => "domains",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "schedule" => Ok(Category::Schedule),
            "websites" => Ok(Category::Websites),
            "domains" => Ok(Category::Domains),
            _ => Err(ApiError::Configuration(format!("unknown API category: {s}"))),
        }
    }
}

/// Base URL of `category`'s collection for `username`, always ending in `/`.
pub fn resolve(site: &str, username: &str, category: Category) -> String {
    format!(
        "{}/api/v0/user/{username}/{category}/",
        site.trim_end_matches('/')
    )
}
