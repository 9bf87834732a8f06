//! Reply formatting (help text, issue list/detail, error replies, chunking).
//!
//! All output is plain text. Tracker-provided strings are inserted verbatim.

use chrono::{DateTime, Utc};

use crate::{
    errors::Error,
    tracker::{IssueDetail, IssueSummary, Journal},
};

pub const DENIED_MSG: &str = "❌ Sorry, you are not authorized to use this bot.";

pub const HELP_MSG: &str = "🤖 Welcome to the Redmine bot! Available commands:\n\
/issues - List issues assigned to you\n\
/create [project_id] [title] [description] - Create an issue\n\
/comment [issue_id] [comment] - Add a comment\n\
/state [issue_id] [status] - Change issue status\n\
/issue [issue_id] - Show issue details\n\
/resolve [issue_id] - Resolve an issue\n\
/close [issue_id] - Close an issue";

/// Journals shown by `/issue`.
pub const MAX_JOURNALS: usize = 5;

const UNKNOWN_USER: &str = "unknown user";
const UNKNOWN_TIME: &str = "unknown time";

pub fn format_issue_list(issues: &[IssueSummary]) -> String {
    if issues.is_empty() {
        return "📭 No issues found".to_string();
    }

    issues
        .iter()
        .map(|i| {
            format!(
                "🔢 ID: {}, 📁 Project: {}, 📝 Subject: {}, 🚩 Status: {}",
                i.id, i.project.name, i.subject, i.status.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_issue_detail(issue: &IssueDetail) -> String {
    let mut lines: Vec<String> = vec![
        format!("🔢 Issue ID: {}", issue.id),
        format!("📁 Project: {}", issue.project.name),
        format!("📝 Subject: {}", issue.subject),
        format!("🚩 Status: {}", issue.status.name),
    ];

    if let Some(desc) = issue.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("\n📄 Description:\n{desc}\n"));
    }

    if let Some(p) = &issue.priority {
        lines.push(format!("🏷️ Priority: {}", p.name));
    }

    if let Some(a) = &issue.assigned_to {
        lines.push(format!("👤 Assigned to: {}", a.name));
    }

    if !issue.attachments.is_empty() {
        let names = issue
            .attachments
            .iter()
            .map(|a| a.filename.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "📎 Attachments ({}): {names}",
            issue.attachments.len()
        ));
    }

    let journals = issue.recent_notes(MAX_JOURNALS);
    if !journals.is_empty() {
        lines.push("\n💬 Comments:".to_string());
        for j in journals {
            lines.push(format_journal(j));
        }
    }

    lines.join("\n")
}

fn format_journal(j: &Journal) -> String {
    let author = j.author().unwrap_or(UNKNOWN_USER);
    let when = j
        .created_on
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_else(|| UNKNOWN_TIME.to_string());
    format!("- {author} ({when}):\n{}\n", j.note().unwrap_or_default())
}

/// RFC 3339 → `YYYY-MM-DD HH:MM UTC`; anything else is shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Turn a per-message failure into the reply the user sees.
///
/// `action` names what was attempted ("create issue"), used for tracker errors.
pub fn render_error(action: &str, err: &Error) -> String {
    match err {
        Error::Unauthorized => DENIED_MSG.to_string(),
        Error::Usage(usage) => format!("Usage: {usage}"),
        Error::UnknownStatus { valid, .. } => {
            format!("❌ Invalid status. Supported statuses: {}", valid.join(", "))
        }
        Error::Upstream { body, .. } => format!("❌ Failed to {action}: {body}"),
        Error::Transport(e) => format!("❌ Network request error: {e}"),
        Error::Parse(e) => format!("❌ Failed to parse tracker response: {e}"),
        other => format!("❌ An error occurred: {other}"),
    }
}

/// Split `text` into chunks of at most `limit` characters, preferring line
/// boundaries. Lines longer than `limit` are hard-split.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut out: Vec<String> = Vec::new();
    let mut chunk = String::new();
    let mut chunk_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        // +1 for the newline joining this line to the chunk.
        let needed = if chunk_len == 0 { line_len } else { line_len + 1 };

        if chunk_len + needed <= limit {
            if chunk_len > 0 {
                chunk.push('\n');
            }
            chunk.push_str(line);
            chunk_len += needed;
            continue;
        }

        if chunk_len > 0 {
            out.push(std::mem::take(&mut chunk));
            chunk_len = 0;
        }

        if line_len <= limit {
            chunk.push_str(line);
            chunk_len = line_len;
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut pieces = chars.chunks(limit).peekable();
        while let Some(piece) = pieces.next() {
            let s: String = piece.iter().collect();
            if pieces.peek().is_some() {
                out.push(s);
            } else {
                chunk_len = piece.len();
                chunk = s;
            }
        }
    }

    if !chunk.is_empty() {
        out.push(chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Attachment, JournalAuthor, NamedRef};

    fn named(name: &str) -> NamedRef {
        NamedRef {
            id: 1,
            name: name.to_string(),
        }
    }

    fn detail() -> IssueDetail {
        IssueDetail {
            id: 7,
            project: named("Ops"),
            subject: "Disk full".into(),
            status: named("New"),
            description: None,
            priority: None,
            assigned_to: None,
            journals: vec![],
            attachments: vec![],
        }
    }

    fn note(author: Option<&str>, when: Option<&str>, text: &str) -> Journal {
        Journal {
            user: author.map(|name| JournalAuthor {
                id: 1,
                name: Some(name.to_string()),
            }),
            notes: Some(text.to_string()),
            created_on: when.map(str::to_string),
        }
    }

    #[test]
    fn issue_list_one_line_per_issue() {
        let issues = vec![
            IssueSummary {
                id: 1,
                project: named("Ops"),
                subject: "Disk full".into(),
                status: named("New"),
            },
            IssueSummary {
                id: 2,
                project: named("Web"),
                subject: "Login broken".into(),
                status: named("Resolved"),
            },
        ];
        let out = format_issue_list(&issues);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("ID: 1, 📁 Project: Ops, 📝 Subject: Disk full, 🚩 Status: New"));
        assert!(out.contains("Status: Resolved"));
    }

    #[test]
    fn empty_issue_list_has_explicit_reply() {
        assert_eq!(format_issue_list(&[]), "📭 No issues found");
    }

    #[test]
    fn detail_omits_absent_optional_fields() {
        let out = format_issue_detail(&detail());
        assert!(out.contains("Issue ID: 7"));
        assert!(out.contains("Project: Ops"));
        assert!(out.contains("Subject: Disk full"));
        assert!(out.contains("Status: New"));
        assert!(!out.contains("Priority"));
        assert!(!out.contains("Assigned to"));
        assert!(!out.contains("Description"));
        assert!(!out.contains("Comments"));
        assert!(!out.contains("Attachments"));
    }

    #[test]
    fn detail_shows_present_optional_fields() {
        let mut d = detail();
        d.description = Some("Root volume at 100%".into());
        d.priority = Some(named("High"));
        d.assigned_to = Some(named("Alice"));
        d.attachments = vec![Attachment {
            id: 3,
            filename: "df.txt".into(),
            filesize: 12,
        }];
        let out = format_issue_detail(&d);
        assert!(out.contains("📄 Description:\nRoot volume at 100%"));
        assert!(out.contains("🏷️ Priority: High"));
        assert!(out.contains("👤 Assigned to: Alice"));
        assert!(out.contains("📎 Attachments (1): df.txt"));
    }

    #[test]
    fn empty_description_is_omitted() {
        let mut d = detail();
        d.description = Some(String::new());
        assert!(!format_issue_detail(&d).contains("Description"));
    }

    #[test]
    fn detail_shows_last_five_notes_in_order() {
        let mut d = detail();
        d.journals = (1..=6)
            .map(|i| note(Some("Bob"), Some("2024-03-01T10:15:00Z"), &format!("note {i}")))
            .collect();
        let out = format_issue_detail(&d);
        assert!(!out.contains("note 1\n"));
        let positions: Vec<usize> = (2..=6)
            .map(|i| out.find(&format!("note {i}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(out.contains("- Bob (2024-03-01 10:15 UTC):\nnote 6"));
    }

    #[test]
    fn journal_defaults_for_missing_author_and_time() {
        let mut d = detail();
        d.journals = vec![note(None, None, "hello")];
        let out = format_issue_detail(&d);
        assert!(out.contains("- unknown user (unknown time):\nhello"));
    }

    #[test]
    fn journals_without_notes_do_not_open_section() {
        let mut d = detail();
        d.journals = vec![Journal {
            user: None,
            notes: Some(String::new()),
            created_on: None,
        }];
        assert!(!format_issue_detail(&d).contains("Comments"));
    }

    #[test]
    fn nameless_author_falls_back_to_unknown_user() {
        let mut d = detail();
        d.journals = vec![Journal {
            user: Some(JournalAuthor { id: 3, name: None }),
            notes: Some("hi".into()),
            created_on: Some("2024-03-01T10:15:00Z".into()),
        }];
        assert!(format_issue_detail(&d).contains("- unknown user (2024-03-01 10:15 UTC):\nhi"));
    }

    #[test]
    fn whitespace_only_note_opens_section() {
        let mut d = detail();
        d.journals = vec![note(Some("Bob"), None, "  ")];
        assert!(format_issue_detail(&d).contains("💬 Comments:"));
    }

    #[test]
    fn non_rfc3339_timestamps_pass_through() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(
            format_timestamp("2024-03-01T12:00:00+02:00"),
            "2024-03-01 10:00 UTC"
        );
    }

    #[test]
    fn upstream_error_reply_contains_raw_body() {
        let err = Error::Upstream {
            status: 422,
            body: r#"{"errors":["Subject cannot be blank"]}"#.into(),
        };
        let out = render_error("create issue", &err);
        assert_eq!(
            out,
            r#"❌ Failed to create issue: {"errors":["Subject cannot be blank"]}"#
        );
    }

    #[test]
    fn unknown_status_reply_lists_names() {
        let err = Error::UnknownStatus {
            token: "x".into(),
            valid: vec!["New".into(), "Closed".into()],
        };
        assert_eq!(
            render_error("update issue status", &err),
            "❌ Invalid status. Supported statuses: New, Closed"
        );
    }

    #[test]
    fn transport_and_parse_errors_have_fixed_prefixes() {
        assert_eq!(
            render_error("fetch issues", &Error::Transport("connection refused".into())),
            "❌ Network request error: connection refused"
        );
        let parse = serde_json::from_str::<IssueSummary>("{").unwrap_err();
        assert!(render_error("fetch issues", &Error::Parse(parse))
            .starts_with("❌ Failed to parse tracker response: "));
        assert_eq!(render_error("x", &Error::Unauthorized), DENIED_MSG);
    }

    #[test]
    fn short_messages_are_not_split() {
        assert_eq!(split_message("hello\nworld", 100), vec!["hello\nworld"]);
    }

    #[test]
    fn splits_on_line_boundaries_under_limit() {
        let text = (0..50)
            .map(|i| format!("line {i:02}"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = split_message(&text, 40);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn hard_splits_overlong_lines() {
        let long = "é".repeat(95);
        let chunks = split_message(&long, 40);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert_eq!(chunks.concat(), long);
    }
}
