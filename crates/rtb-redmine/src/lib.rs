//! Redmine adapter.
//!
//! Implements the `rtb-core` [`IssueTracker`] port over the Redmine REST API.
//! Every request carries the `X-Redmine-API-Key` header and the configured
//! timeout; there are no retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use rtb_core::{
    config::Config,
    domain::{IssueId, StatusId},
    errors::Error,
    ports::IssueTracker,
    tracker::{IssueDetail, IssueStatus, IssueSummary, NewIssue},
    Result,
};

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

#[derive(Clone)]
pub struct RedmineClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for RedmineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedmineClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Serialize)]
struct Envelope<T> {
    issue: T,
}

#[derive(Deserialize)]
struct IssueList {
    #[serde(default)]
    issues: Vec<IssueSummary>,
}

#[derive(Deserialize)]
struct StatusList {
    #[serde(default)]
    issue_statuses: Vec<IssueStatus>,
}

#[derive(Deserialize)]
struct Created {
    id: u64,
}

#[derive(Serialize)]
struct NotesUpdate<'a> {
    notes: &'a str,
}

#[derive(Serialize)]
struct StatusUpdate {
    status_id: u64,
}

impl RedmineClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.redmine_url.clone(),
            cfg.redmine_api_token.clone(),
            cfg.request_timeout,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send the request and return the body of a 2xx response.
    ///
    /// Anything else becomes [`Error::Upstream`] carrying the raw body.
    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<String> {
        let resp = req
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        debug!(status = status.as_u16(), bytes = body.len(), "redmine response");

        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!(method = "GET", path, "redmine request");
        let body = self
            .execute(self.http.get(self.url(path)).query(query))
            .await?;
        decode(&body)
    }

    async fn put_issue<T: Serialize>(&self, issue: IssueId, update: T) -> Result<()> {
        let path = format!("/issues/{issue}.json");
        debug!(method = "PUT", path = %path, "redmine request");
        self.execute(
            self.http
                .put(self.url(&path))
                .json(&Envelope { issue: update }),
        )
        .await?;
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl IssueTracker for RedmineClient {
    async fn list_assigned_to_me(&self) -> Result<Vec<IssueSummary>> {
        let list: IssueList = self
            .get_json("/issues.json", &[("assigned_to_id", "me")])
            .await?;
        Ok(list.issues)
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<IssueId> {
        debug!(method = "POST", path = "/issues.json", "redmine request");
        let body = self
            .execute(
                self.http
                    .post(self.url("/issues.json"))
                    .json(&Envelope { issue }),
            )
            .await?;
        let created: Envelope<Created> = decode(&body)?;
        Ok(IssueId(created.issue.id))
    }

    async fn add_comment(&self, issue: IssueId, notes: &str) -> Result<()> {
        self.put_issue(issue, NotesUpdate { notes }).await
    }

    async fn update_status(&self, issue: IssueId, status: StatusId) -> Result<()> {
        self.put_issue(issue, StatusUpdate { status_id: status.0 })
            .await
    }

    async fn issue_detail(&self, issue: IssueId) -> Result<IssueDetail> {
        let detail: Envelope<IssueDetail> = self
            .get_json(
                &format!("/issues/{issue}.json"),
                &[("include", "journals,attachments")],
            )
            .await?;
        Ok(detail.issue)
    }

    async fn list_statuses(&self) -> Result<Vec<IssueStatus>> {
        let list: StatusList = self.get_json("/issue_statuses.json", &[]).await?;
        Ok(list.issue_statuses)
    }
}
