//! Request and response DTOs for the schedule and website APIs.
//!
//! # Design
//! Response types keep the fields the client relies on as typed members and
//! collect everything else the server sends into a flattened `extra` map, so
//! reads pass server data through without the client having to model it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recurrence of a scheduled task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Hourly,
}

/// Payload for creating a scheduled task. `hour` is required for daily tasks
/// and must be left out for hourly ones; the server enforces both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSpec {
    pub command: String,
    pub enabled: bool,
    pub interval: Interval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    pub minute: u8,
}

impl TaskSpec {
    pub fn daily(command: impl Into<String>, hour: u8, minute: u8) -> Self {
        Self {
            command: command.into(),
            enabled: true,
            interval: Interval::Daily,
            hour: Some(hour),
            minute,
        }
    }

    pub fn hourly(command: impl Into<String>, minute: u8) -> Self {
        Self {
            command: command.into(),
            enabled: true,
            interval: Interval::Hourly,
            hour: None,
            minute,
        }
    }
}

/// A scheduled task as stored on the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: u64,
    pub command: String,
    pub enabled: bool,
    pub interval: Interval,
    #[serde(default)]
    pub hour: Option<u8>,
    pub minute: u8,
    /// Server-side fields such as `logfile`, `expiry` or `printable_time`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn spec(&self) -> TaskSpec {
        TaskSpec {
            command: self.command.clone(),
            enabled: self.enabled,
            interval: self.interval,
            hour: self.hour,
            minute: self.minute,
        }
    }
}

/// Partial update for a scheduled task. Only present fields are sent; the
/// server leaves the rest unchanged. Switching an hourly task to daily needs
/// `hour` as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<u8>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.command.is_none()
            && self.enabled.is_none()
            && self.interval.is_none()
            && self.hour.is_none()
            && self.minute.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebappSpec {
    pub command: String,
}

/// Payload for creating a website. The domain name is its identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebsiteSpec {
    pub domain_name: String,
    pub enabled: bool,
    pub webapp: WebappSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Webapp {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A website as stored on the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebsiteInfo {
    pub domain_name: String,
    pub enabled: bool,
    pub webapp: Webapp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Server-side fields such as `user` or `logfiles`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Certificate details for a domain. Opaque to the client.
pub type SslInfo = Map<String, Value>;
