//! Scheduled task management.
//!
//! # Design
//! `Schedule` holds the precomputed collection URL and an `Invoker`. Each
//! operation is split into a pure `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes the `HttpResponse`; the
//! public operation runs build, invoke and parse in sequence. Every operation
//! accepts exactly one success status and reports anything else as
//! `ApiError::ApiFailure`.

use tracing::info;

use crate::config::ApiConfig;
use crate::endpoint::Category;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::invoker::{Invoker, UreqInvoker};
use crate::types::{Task, TaskSpec, TaskUpdate};

/// Client for the scheduled tasks API.
#[derive(Clone)]
pub struct Schedule<I = UreqInvoker> {
    base_url: String,
    invoker: I,
}

impl Schedule<UreqInvoker> {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let invoker = UreqInvoker::new(config)?;
        Self::with_invoker(config, invoker)
    }
}

impl<I: Invoker> Schedule<I> {
    pub fn with_invoker(config: &ApiConfig, invoker: I) -> Result<Self, ApiError> {
        config.token()?;
        Ok(Self {
            base_url: config.endpoint(Category::Schedule),
            invoker,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self, task_id: u64) -> String {
        format!("{}{task_id}/", self.base_url)
    }

    pub fn build_create(&self, spec: &TaskSpec) -> Result<HttpRequest, ApiError> {
        HttpRequest::new(HttpMethod::Post, self.base_url.as_str()).with_json(spec)
    }

    pub fn build_get_list(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.base_url.as_str())
    }

    pub fn build_get_specs(&self, task_id: u64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.task_url(task_id))
    }

    pub fn build_update(&self, task_id: u64, update: &TaskUpdate) -> Result<HttpRequest, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidInput(
                "a task update needs at least one of command, enabled, interval, hour or minute".into(),
            ));
        }
        HttpRequest::new(HttpMethod::Patch, self.task_url(task_id)).with_json(update)
    }

    pub fn build_delete(&self, task_id: u64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.task_url(task_id))
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Task, ApiError> {
        response.expect_status(201)?.json()
    }

    pub fn parse_get_list(&self, response: HttpResponse) -> Result<Vec<Task>, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_get_specs(&self, response: HttpResponse) -> Result<Task, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<Task, ApiError> {
        response.expect_status(200)?.json()
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        response.expect_status(204)?;
        Ok(())
    }

    /// Create a task. The returned task carries its server-assigned id.
    pub fn create(&self, spec: &TaskSpec) -> Result<Task, ApiError> {
        let response = self.invoker.invoke(self.build_create(spec)?)?;
        let task = self.parse_create(response)?;
        info!(task_id = task.id, command = %task.command, "scheduled task created");
        Ok(task)
    }

    pub fn get_list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.invoker.invoke(self.build_get_list())?;
        self.parse_get_list(response)
    }

    pub fn get_specs(&self, task_id: u64) -> Result<Task, ApiError> {
        let response = self.invoker.invoke(self.build_get_specs(task_id))?;
        self.parse_get_specs(response)
    }

    pub fn update(&self, task_id: u64, update: &TaskUpdate) -> Result<Task, ApiError> {
        let response = self.invoker.invoke(self.build_update(task_id, update)?)?;
        let task = self.parse_update(response)?;
        info!(task_id, "scheduled task updated");
        Ok(task)
    }

    /// Delete a task. Deletion is final.
    pub fn delete(&self, task_id: u64) -> Result<(), ApiError> {
        let response = self.invoker.invoke(self.build_delete(task_id))?;
        self.parse_delete(response)?;
        info!(task_id, "scheduled task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::testing::ScriptedInvoker;
    use crate::types::Interval;

    const TASK_JSON: &str = r#"{"id":42,"command":"echo hi","enabled":true,"interval":"hourly","hour":null,"minute":5,"logfile":"/var/log/schedule-42.log"}"#;

    fn config() -> ApiConfig {
        ApiConfig::new("alice")
            .with_site("http://localhost:3000")
            .with_token("t0k")
    }

    fn schedule(invoker: ScriptedInvoker) -> Schedule<ScriptedInvoker> {
        Schedule::with_invoker(&config(), invoker).unwrap()
    }

    #[test]
    fn construction_requires_a_token() {
        let result = Schedule::with_invoker(&ApiConfig::new("alice"), ScriptedInvoker::new());
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn build_create_posts_json_to_collection() {
        let s = schedule(ScriptedInvoker::new());
        let req = s.build_create(&TaskSpec::daily("backup.sh", 4, 15)).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/v0/user/alice/schedule/");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"command": "backup.sh", "enabled": true, "interval": "daily", "hour": 4, "minute": 15})
        );
    }

    #[test]
    fn item_requests_use_task_url() {
        let s = schedule(ScriptedInvoker::new());
        let get = s.build_get_specs(42);
        assert_eq!(get.method, HttpMethod::Get);
        assert_eq!(get.path, "http://localhost:3000/api/v0/user/alice/schedule/42/");
        assert!(get.body.is_none());

        let delete = s.build_delete(42);
        assert_eq!(delete.method, HttpMethod::Delete);
        assert_eq!(delete.path, get.path);
    }

    #[test]
    fn create_returns_task_with_assigned_id() {
        let invoker = ScriptedInvoker::new().respond(201, TASK_JSON);
        let s = schedule(invoker);
        let task = s.create(&TaskSpec::hourly("echo hi", 5)).unwrap();
        assert_eq!(task.id, 42);
        assert_eq!(task.spec(), TaskSpec::hourly("echo hi", 5));
        assert_eq!(task.extra["logfile"], "/var/log/schedule-42.log");
    }

    #[test]
    fn create_rejects_non_201_success() {
        let s = schedule(ScriptedInvoker::new().respond(200, TASK_JSON));
        let err = s.create(&TaskSpec::hourly("echo hi", 5)).unwrap_err();
        assert!(matches!(err, ApiError::ApiFailure { status: 200, .. }));
    }

    #[test]
    fn create_failure_carries_status_and_body() {
        let body = r#"{"hour":["This field is required for daily tasks."]}"#;
        let s = schedule(ScriptedInvoker::new().respond(400, body));
        let mut spec = TaskSpec::daily("echo hi", 1, 0);
        spec.hour = None;
        match s.create(&spec).unwrap_err() {
            ApiError::ApiFailure { status, body: text } => {
                assert_eq!(status, 400);
                assert_eq!(text, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn get_list_checks_status_before_decoding() {
        let s = schedule(ScriptedInvoker::new().respond(503, "<html>Service Unavailable</html>"));
        let err = s.get_list().unwrap_err();
        assert!(matches!(err, ApiError::ApiFailure { status: 503, .. }));
    }

    #[test]
    fn get_list_decodes_tasks() {
        let s = schedule(ScriptedInvoker::new().respond(200, &format!("[{TASK_JSON}]")));
        let tasks = s.get_list().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].interval, Interval::Hourly);
    }

    #[test]
    fn get_specs_not_found() {
        let s = schedule(ScriptedInvoker::new().respond(404, r#"{"detail":"Not found."}"#));
        let err = s.get_specs(1).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_sends_patch_with_only_given_fields() {
        let invoker = ScriptedInvoker::new().respond(200, TASK_JSON);
        let s = schedule(invoker);
        let update = TaskUpdate {
            enabled: Some(false),
            ..TaskUpdate::default()
        };
        s.update(42, &update).unwrap();
        let req = s.invoker.request(0);
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:3000/api/v0/user/alice/schedule/42/");
        assert_eq!(req.body.as_deref(), Some(r#"{"enabled":false}"#));
    }

    #[test]
    fn empty_update_is_rejected_without_a_request() {
        let s = schedule(ScriptedInvoker::new());
        let err = s.update(42, &TaskUpdate::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(s.invoker.call_count(), 0);
    }

    #[test]
    fn delete_expects_204() {
        let s = schedule(ScriptedInvoker::new().respond(204, ""));
        assert!(s.delete(42).is_ok());

        let s = schedule(ScriptedInvoker::new().respond(200, "{}"));
        assert!(matches!(
            s.delete(42).unwrap_err(),
            ApiError::ApiFailure { status: 200, .. }
        ));
    }
}
