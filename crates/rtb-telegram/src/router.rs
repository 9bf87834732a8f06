use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use rtb_core::{commands::CommandDispatcher, config::Config, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    /// Own username from getMe; commands addressed to other bots are skipped.
    pub bot_username: Option<String>,
    pub commands: Arc<CommandDispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Long-poll Telegram until the process is stopped.
///
/// Every update maps to the same distribution key, so messages are handled
/// one at a time in arrival order.
pub async fn run_polling(cfg: Arc<Config>, commands: Arc<CommandDispatcher>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            info!(username = %me.username(), "bot started");
            me.user.username.clone()
        }
        Err(e) => {
            warn!(error = %e, "getMe failed; continuing with polling");
            None
        }
    };
    info!(
        allowed_users = cfg.allowed_user_ids.len(),
        redmine = %cfg.redmine_url,
        "ready"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        cfg,
        bot_username,
        commands,
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .distribution_function(|_| Some(()))
        .build()
        .dispatch()
        .await;

    Ok(())
}
