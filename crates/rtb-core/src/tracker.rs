//! Typed views of tracker (Redmine) entities.
//!
//! These are transient: deserialized from a response, formatted into a reply,
//! then dropped. Optional fields mirror what Redmine omits for unset values.

use serde::{Deserialize, Serialize};

use crate::domain::StatusId;

/// `{ "id": .., "name": .. }` reference used for projects, statuses, users.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IssueSummary {
    pub id: u64,
    pub project: NamedRef,
    pub subject: String,
    pub status: NamedRef,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IssueDetail {
    pub id: u64,
    pub project: NamedRef,
    pub subject: String,
    pub status: NamedRef,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<NamedRef>,
    #[serde(default)]
    pub assigned_to: Option<NamedRef>,
    #[serde(default)]
    pub journals: Vec<Journal>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl IssueDetail {
    /// The last `limit` journals that carry note text, oldest first.
    pub fn recent_notes(&self, limit: usize) -> Vec<&Journal> {
        let with_notes: Vec<&Journal> = self
            .journals
            .iter()
            .filter(|j| j.note().is_some())
            .collect();
        let skip = with_notes.len().saturating_sub(limit);
        with_notes.into_iter().skip(skip).collect()
    }
}

/// Journal author. Redmine may omit the name (e.g. for deleted users).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct JournalAuthor {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Journal {
    #[serde(default)]
    pub user: Option<JournalAuthor>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

impl Journal {
    pub fn note(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.is_empty())
    }

    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: u64,
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IssueStatus {
    pub id: u64,
    pub name: String,
}

impl IssueStatus {
    pub fn into_entry(self) -> (StatusId, String) {
        (StatusId(self.id), self.name)
    }
}

/// Payload for a new issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Numeric id or textual identifier; Redmine accepts both.
    pub project_id: String,
    pub subject: String,
    pub description: String,
}
