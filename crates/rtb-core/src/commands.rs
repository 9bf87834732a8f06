//! Chat command dispatch.
//!
//! Every command is a [`CommandHandler`] value registered by name. The
//! dispatcher gates on the allow-list, looks the handler up and converts any
//! failure into a reply, so nothing escapes into the polling loop.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    domain::IssueId,
    errors::Error,
    formatting::{format_issue_detail, format_issue_list, render_error, HELP_MSG},
    messaging::types::Command,
    ports::IssueTracker,
    security::AllowList,
    status::StatusMapping,
    tracker::NewIssue,
    Result,
};

const CREATE_USAGE: &str = "/create [project_id] [title] [description]";
const COMMENT_USAGE: &str = "/comment [issue_id] [comment]";
const STATE_USAGE: &str = "/state [issue_id] [status]";
const ISSUE_USAGE: &str = "/issue [issue_id]";
const RESOLVE_USAGE: &str = "/resolve [issue_id]";
const CLOSE_USAGE: &str = "/close [issue_id]";

/// Shared, read-only collaborators handed to every handler.
#[derive(Clone)]
pub struct CommandContext {
    pub tracker: Arc<dyn IssueTracker>,
    pub statuses: Arc<StatusMapping>,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// What the command attempts, phrased for "Failed to ..." replies.
    fn action(&self) -> &'static str;

    async fn handle(&self, ctx: &CommandContext, args: &str) -> Result<String>;
}

pub struct CommandDispatcher {
    allow: AllowList,
    ctx: CommandContext,
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new(
        allow: AllowList,
        tracker: Arc<dyn IssueTracker>,
        statuses: Arc<StatusMapping>,
    ) -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn CommandHandler>> = HashMap::new();
        handlers.insert("start", Box::new(Help));
        handlers.insert("help", Box::new(Help));
        handlers.insert("issues", Box::new(ListIssues));
        handlers.insert("create", Box::new(CreateIssue));
        handlers.insert("comment", Box::new(AddComment));
        handlers.insert("state", Box::new(ChangeState));
        handlers.insert("issue", Box::new(ShowIssue));
        handlers.insert(
            "resolve",
            Box::new(StateShortcut {
                usage: RESOLVE_USAGE,
                status: "resolved",
            }),
        );
        handlers.insert(
            "close",
            Box::new(StateShortcut {
                usage: CLOSE_USAGE,
                status: "closed",
            }),
        );

        Self {
            allow,
            ctx: CommandContext { tracker, statuses },
            handlers,
        }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run one command and return the reply text.
    pub async fn dispatch(&self, cmd: &Command) -> String {
        let user = cmd.user_id.map(|u| u.0);

        if !self.allow.is_authorized(cmd.user_id) {
            warn!(?user, command = %cmd.name, "unauthorized command");
            return render_error(&cmd.name, &Error::Unauthorized);
        }

        let Some(handler) = self.handlers.get(cmd.name.as_str()) else {
            debug!(?user, command = %cmd.name, "unknown command");
            return format!("Unknown command: /{}. Send /help for the list.", cmd.name);
        };

        info!(?user, command = %cmd.name, "handling command");

        match handler.handle(&self.ctx, &cmd.args).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    Error::Usage(_) | Error::UnknownStatus { .. } => {
                        debug!(command = %cmd.name, error = %e, "rejected command input")
                    }
                    _ => warn!(command = %cmd.name, error = %e, "command failed"),
                }
                render_error(handler.action(), &e)
            }
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("CommandDispatcher")
            .field("allowed_users", &self.allow.len())
            .field("statuses", &self.ctx.statuses.len())
            .field("commands", &names)
            .finish()
    }
}

/// Split a Telegram command message into `(name, args)`.
///
/// Telegram may send `/cmd@botname arg1 ...`. Returns `None` for plain text
/// and for commands addressed to a different bot than `bot_username`.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<(String, String)> {
    let text = text.trim_start();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim().to_string();

    let (cmd, target) = match first.trim_start_matches('/').split_once('@') {
        Some((cmd, target)) => (cmd, Some(target)),
        None => (first.trim_start_matches('/'), None),
    };

    if let (Some(target), Some(me)) = (target, bot_username) {
        if !target.eq_ignore_ascii_case(me) {
            return None;
        }
    }

    Some((cmd.to_lowercase(), rest))
}

/// Split `args` into at most `max_parts` pieces.
///
/// All but the last piece are single whitespace-delimited words; the last one
/// keeps the remainder of the text (inner spaces and newlines included).
pub fn split_args(args: &str, max_parts: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = args.trim_start();

    while !rest.is_empty() && out.len() + 1 < max_parts {
        match rest.find(char::is_whitespace) {
            Some(idx) => {
                out.push(&rest[..idx]);
                rest = rest[idx..].trim_start();
            }
            None => {
                out.push(rest);
                rest = "";
            }
        }
    }

    let tail = rest.trim_end();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn parse_issue_id(raw: &str, usage: &'static str) -> Result<IssueId> {
    let raw = raw.strip_prefix('#').unwrap_or(raw);
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(IssueId(id)),
        _ => Err(Error::Usage(usage)),
    }
}

/// Shared by `/state`, `/resolve` and `/close`.
async fn change_state(ctx: &CommandContext, issue: IssueId, token: &str) -> Result<String> {
    let status = ctx.statuses.resolve(token)?;
    ctx.tracker.update_status(issue, status).await?;
    info!(issue = issue.0, status = status.0, "issue status updated");
    Ok("🔄 Issue status updated!".to_string())
}

struct Help;

#[async_trait]
impl CommandHandler for Help {
    fn action(&self) -> &'static str {
        "show help"
    }

    async fn handle(&self, _ctx: &CommandContext, _args: &str) -> Result<String> {
        Ok(HELP_MSG.to_string())
    }
}

struct ListIssues;

#[async_trait]
impl CommandHandler for ListIssues {
    fn action(&self) -> &'static str {
        "fetch issues"
    }

    async fn handle(&self, ctx: &CommandContext, _args: &str) -> Result<String> {
        let issues = ctx.tracker.list_assigned_to_me().await?;
        Ok(format_issue_list(&issues))
    }
}

struct CreateIssue;

#[async_trait]
impl CommandHandler for CreateIssue {
    fn action(&self) -> &'static str {
        "create issue"
    }

    async fn handle(&self, ctx: &CommandContext, args: &str) -> Result<String> {
        let [project_id, subject, description] = split_args(args, 3)[..] else {
            return Err(Error::Usage(CREATE_USAGE));
        };

        let id = ctx
            .tracker
            .create_issue(&NewIssue {
                project_id: project_id.to_string(),
                subject: subject.to_string(),
                description: description.to_string(),
            })
            .await?;
        info!(issue = id.0, project = project_id, "issue created");
        Ok(format!("🎉 Issue created! Issue ID: {id}"))
    }
}

struct AddComment;

#[async_trait]
impl CommandHandler for AddComment {
    fn action(&self) -> &'static str {
        "add comment"
    }

    async fn handle(&self, ctx: &CommandContext, args: &str) -> Result<String> {
        let [issue, comment] = split_args(args, 2)[..] else {
            return Err(Error::Usage(COMMENT_USAGE));
        };
        let issue = parse_issue_id(issue, COMMENT_USAGE)?;

        ctx.tracker.add_comment(issue, comment).await?;
        Ok("💬 Comment added!".to_string())
    }
}

struct ChangeState;

#[async_trait]
impl CommandHandler for ChangeState {
    fn action(&self) -> &'static str {
        "update issue status"
    }

    async fn handle(&self, ctx: &CommandContext, args: &str) -> Result<String> {
        let [issue, token] = split_args(args, 2)[..] else {
            return Err(Error::Usage(STATE_USAGE));
        };
        let issue = parse_issue_id(issue, STATE_USAGE)?;
        change_state(ctx, issue, token).await
    }
}

/// `/resolve` and `/close`: `/state <id> <fixed status>`.
struct StateShortcut {
    usage: &'static str,
    status: &'static str,
}

#[async_trait]
impl CommandHandler for StateShortcut {
    fn action(&self) -> &'static str {
        "update issue status"
    }

    async fn handle(&self, ctx: &CommandContext, args: &str) -> Result<String> {
        let Some(issue) = split_args(args, 2).first().copied() else {
            return Err(Error::Usage(self.usage));
        };
        let issue = parse_issue_id(issue, self.usage)?;
        change_state(ctx, issue, self.status).await
    }
}

struct ShowIssue;

#[async_trait]
impl CommandHandler for ShowIssue {
    fn action(&self) -> &'static str {
        "fetch issue details"
    }

    async fn handle(&self, ctx: &CommandContext, args: &str) -> Result<String> {
        let Some(issue) = split_args(args, 2).first().copied() else {
            return Err(Error::Usage(ISSUE_USAGE));
        };
        let issue = parse_issue_id(issue, ISSUE_USAGE)?;

        let detail = ctx.tracker.issue_detail(issue).await?;
        Ok(format_issue_detail(&detail))
    }
}
