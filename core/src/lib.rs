//! Synchronous client for a hosting platform's scheduled task and website APIs.
//!
//! # Overview
//! `Schedule` manages scheduled tasks and `Website` manages websites and
//! their SSL certificates. Both are thin: each operation builds one request,
//! hands it to an `Invoker` for a single blocking round-trip, and interprets
//! the response status. Website creation looks the domain up first.
//!
//! # Design
//! - Configuration is an explicit `ApiConfig`; managers reject a missing API
//!   token when they are constructed.
//! - Every operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit and the
//!   `Invoker` trait is the only seam that touches the network.
//! - Every operation accepts exactly one success status; everything else is
//!   an `ApiError`.
//! - Managers hold only immutable, precomputed base URLs.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod invoker;
pub mod schedule;
pub mod types;
pub mod website;

pub use config::ApiConfig;
pub use endpoint::{resolve, Category};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use invoker::{Invoker, UreqInvoker};
pub use schedule::Schedule;
pub use types::{
    Interval, SslInfo, Task, TaskSpec, TaskUpdate, Webapp, WebappSpec, WebsiteInfo, WebsiteSpec,
};
pub use website::Website;
