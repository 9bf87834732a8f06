use async_trait::async_trait;

use crate::{
    domain::{IssueId, StatusId},
    tracker::{IssueDetail, IssueStatus, IssueSummary, NewIssue},
    Result,
};

/// Hexagonal port for the issue tracker.
///
/// Implemented over the Redmine REST API in `rtb-redmine`. Implementations
/// surface non-2xx responses as [`crate::Error::Upstream`] with the raw body,
/// connection failures as [`crate::Error::Transport`] and malformed payloads
/// as [`crate::Error::Parse`]. No retries.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Issues assigned to the identity behind the tracker API key.
    async fn list_assigned_to_me(&self) -> Result<Vec<IssueSummary>>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<IssueId>;

    async fn add_comment(&self, issue: IssueId, notes: &str) -> Result<()>;

    async fn update_status(&self, issue: IssueId, status: StatusId) -> Result<()>;

    /// Full issue including journals and attachments.
    async fn issue_detail(&self, issue: IssueId) -> Result<IssueDetail>;

    async fn list_statuses(&self) -> Result<Vec<IssueStatus>>;
}
