use std::sync::Arc;

use tracing::info;

use rtb_core::{
    commands::CommandDispatcher, config::Config, ports::IssueTracker, security::AllowList,
    status::StatusMapping,
};
use rtb_redmine::RedmineClient;

#[tokio::main]
async fn main() -> Result<(), rtb_core::Error> {
    rtb_core::logging::init("rtb")?;

    let cfg = Arc::new(Config::load()?);

    let tracker = Arc::new(RedmineClient::from_config(&cfg)?);

    // Statuses are fetched once; restart the bot if they change in Redmine.
    let statuses = tracker
        .list_statuses()
        .await
        .map_err(|e| rtb_core::Error::Config(format!("failed to load issue statuses: {e}")))?;
    let statuses = Arc::new(StatusMapping::new(
        statuses.into_iter().map(|s| s.into_entry()).collect(),
    ));
    info!(count = statuses.len(), names = ?statuses.names(), "issue statuses loaded");

    let commands = Arc::new(CommandDispatcher::new(
        AllowList::new(cfg.allowed_user_ids.iter().copied()),
        tracker,
        statuses,
    ));

    rtb_telegram::router::run_polling(cfg, commands)
        .await
        .map_err(|e| rtb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
