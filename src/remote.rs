use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::{AdminError, Result};
use crate::model::{Session, WorkflowRunStatus};

/// Client for the remote content store. Transports documents and triggers
/// actions; retains nothing beyond the injected session.
#[derive(Debug)]
pub struct RemoteClient {
    session: Session,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    content: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct PutResourceRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResourceResponse {
    content: PutResourceContent,
}

#[derive(Debug, Deserialize)]
struct PutResourceContent {
    version: String,
}

#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    r#ref: &'a str,
    inputs: &'a HashMap<String, String>,
}

impl RemoteClient {
    pub fn new(session: Session) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("reportctl")
            .build()?;
        Ok(Self { session, client })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}{}",
            self.session.base_url, self.session.repo, path
        )
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.session.token)
    }

    /// GET a stored resource. The store carries the body as base64 text
    /// alongside the current version token; the decoded bytes are returned.
    pub fn fetch_document(&self, path: &str) -> Result<(Vec<u8>, String)> {
        let resp = self
            .client
            .get(self.url(&format!("/resource/{}", path)))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()?;
        let resp = ensure_ok(resp, "fetch document")?;
        let body: ResourceResponse = resp.json()?;
        let bytes = BASE64
            .decode(body.content.trim())
            .map_err(|e| AdminError::Transport(format!("invalid content encoding: {}", e)))?;
        Ok((bytes, body.version))
    }

    /// PUT a stored resource. `version` must match the store's current token
    /// for an update; `None` creates the resource. A mismatch surfaces as
    /// `Conflict` and is never retried here.
    pub fn put_document(
        &self,
        path: &str,
        content: &[u8],
        version: Option<&str>,
    ) -> Result<String> {
        let resp = self
            .client
            .put(self.url(&format!("/resource/{}", path)))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&PutResourceRequest {
                message: "update via reportctl",
                content: BASE64.encode(content),
                version,
            })
            .send()?;
        let resp = ensure_ok(resp, "put document")?;
        let body: PutResourceResponse = resp.json()?;
        Ok(body.content.version)
    }

    /// Fire-and-forget trigger of a remote action. No structured response.
    pub fn dispatch_action(
        &self,
        action_id: &str,
        reference: &str,
        inputs: &HashMap<String, String>,
    ) -> Result<()> {
        let resp = self
            .client
            .post(self.url(&format!("/actions/{}/dispatch", action_id)))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&DispatchRequest {
                r#ref: reference,
                inputs,
            })
            .send()?;
        ensure_ok(resp, "dispatch action")?;
        Ok(())
    }

    /// Most recent execution of the reporting job, if the remote can report
    /// one. Status display is non-critical, so every failure collapses to
    /// `None`.
    pub fn latest_run_status(&self) -> Option<WorkflowRunStatus> {
        let resp = self
            .client
            .get(self.url("/runs"))
            .query(&[("limit", "1")])
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json().ok()
    }
}

fn ensure_ok(
    resp: reqwest::blocking::Response,
    label: &str,
) -> Result<reqwest::blocking::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = remote_message(&resp.text().unwrap_or_default());
    match status {
        reqwest::StatusCode::NOT_FOUND => Err(AdminError::NotFound),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            Err(AdminError::Auth(message))
        }
        reqwest::StatusCode::CONFLICT => Err(AdminError::Conflict(message)),
        _ => Err(AdminError::Transport(format!(
            "{}: {} ({})",
            label, status, message
        ))),
    }
}

/// The store reports failures as `{ "message": ... }`; fall back to the raw
/// body when it does not.
fn remote_message(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(msg) = v.get("message").and_then(|m| m.as_str())
    {
        return msg.to_string();
    }
    if body.trim().is_empty() {
        "no detail".to_string()
    } else {
        body.trim().to_string()
    }
}
