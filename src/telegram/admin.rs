//! Admin panel: statistics and referral link management
//!
//! Every entry point re-checks membership in the configured admin set
//! and answers with a denial alert instead of raising.

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, Message, MessageId, ParseMode};

use crate::core::config;
use crate::core::session::UserState;
use crate::storage::db;
use crate::storage::get_connection;
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::menu::{admin_panel_keyboard, back_to_admin_keyboard, edit_or_send};
use crate::telegram::Bot;
use crate::texts;

/// Builds a t.me deep link for a referral code.
pub fn referral_url(bot_username: &str, code: &str) -> String {
    format!("https://t.me/{}?start={}", bot_username, code)
}

async fn deny(bot: &Bot, callback_id: &CallbackQueryId) -> ResponseResult<()> {
    bot.answer_callback_query(callback_id.clone())
        .text(texts::access_denied())
        .show_alert(true)
        .await?;
    Ok(())
}

/// Shows the admin panel.
pub async fn show_panel(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
) -> ResponseResult<()> {
    if !config::admin::is_admin(user_id) {
        return deny(bot, callback_id).await;
    }

    let _ = bot.answer_callback_query(callback_id.clone()).await;
    edit_or_send(bot, chat_id, message_id, texts::admin_panel(), Some(admin_panel_keyboard())).await
}

/// Shows overall order and referral statistics.
pub async fn show_stats(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    if !config::admin::is_admin(user_id) {
        return deny(bot, callback_id).await;
    }

    let stats = match get_connection(&deps.db_pool) {
        Ok(conn) => db::get_admin_stats(&conn, &config::admin::ADMIN_IDS, user_id),
        Err(e) => {
            log::error!("Failed to get DB connection for admin stats: {}", e);
            bot.answer_callback_query(callback_id.clone())
                .text(texts::stats_failed())
                .show_alert(true)
                .await?;
            return Ok(());
        }
    };

    match stats {
        Ok(Some(stats)) => {
            let _ = bot.answer_callback_query(callback_id.clone()).await;
            edit_or_send(
                bot,
                chat_id,
                message_id,
                texts::admin_stats(&stats),
                Some(back_to_admin_keyboard()),
            )
            .await
        }
        Ok(None) => {
            // Admin set changed between the gate above and the query
            deny(bot, callback_id).await
        }
        Err(e) => {
            log::error!("Failed to compute admin stats: {}", e);
            bot.answer_callback_query(callback_id.clone())
                .text(texts::stats_failed())
                .show_alert(true)
                .await?;
            Ok(())
        }
    }
}

/// Shows the admin's referral links with per-link statistics.
pub async fn show_links(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    if !config::admin::is_admin(user_id) {
        return deny(bot, callback_id).await;
    }

    let links = match get_connection(&deps.db_pool)
        .map_err(|e| e.to_string())
        .and_then(|conn| {
            db::get_referral_links(&conn, &config::admin::ADMIN_IDS, user_id).map_err(|e| e.to_string())
        }) {
        Ok(links) => links,
        Err(e) => {
            log::error!("Failed to load referral links for {}: {}", user_id, e);
            bot.answer_callback_query(callback_id.clone())
                .text(texts::stats_failed())
                .show_alert(true)
                .await?;
            return Ok(());
        }
    };

    if links.is_empty() {
        bot.answer_callback_query(callback_id.clone())
            .text(texts::no_links())
            .show_alert(true)
            .await?;
        return Ok(());
    }

    let bot_username = deps.bot_username.as_deref().unwrap_or_default();
    let list = links
        .iter()
        .map(|link| texts::link_stats(&link.name, &link.stats, &referral_url(bot_username, &link.code)))
        .collect::<Vec<_>>()
        .join("\n\n");

    let _ = bot.answer_callback_query(callback_id.clone()).await;
    edit_or_send(
        bot,
        chat_id,
        message_id,
        texts::links_list(&list),
        Some(back_to_admin_keyboard()),
    )
    .await
}

/// Starts the create-link dialog: the next text message is the label.
pub async fn start_create_link(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    user_id: i64,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    if !config::admin::is_admin(user_id) {
        return deny(bot, callback_id).await;
    }

    let _ = bot.answer_callback_query(callback_id.clone()).await;
    deps.sessions.set(user_id, UserState::WaitingReferralName).await;
    bot.send_message(chat_id, texts::create_referral_prompt()).await?;
    Ok(())
}

/// Handles the label entered for a new referral link.
pub(crate) async fn handle_referral_name_input(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let user_id = chat_id.0;

    if !config::admin::is_admin(user_id) {
        bot.send_message(chat_id, texts::access_denied()).await?;
        return Ok(());
    }

    let name = msg.text().unwrap_or("").trim().to_string();
    if name.is_empty() {
        bot.send_message(chat_id, texts::empty_link_name()).await?;
        return Ok(());
    }

    let created = get_connection(&deps.db_pool)
        .map_err(|e| e.to_string())
        .and_then(|conn| {
            db::create_referral_link(&conn, &config::admin::ADMIN_IDS, user_id, &name).map_err(|e| e.to_string())
        });

    match created {
        Ok(Some(code)) => {
            let bot_username = deps.bot_username.as_deref().unwrap_or_default();
            let url = referral_url(bot_username, &code);
            bot.send_message(chat_id, texts::referral_created(&name, &url))
                .parse_mode(ParseMode::Html)
                .await?;
            deps.sessions.clear(user_id).await;
        }
        Ok(None) => {
            bot.send_message(chat_id, texts::create_link_failed()).await?;
        }
        Err(e) => {
            log::error!("Failed to create referral link for {}: {}", user_id, e);
            bot.send_message(chat_id, texts::create_link_failed()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_telegram_deep_links() {
        assert_eq!(
            referral_url("bad_exchanger_bot", "ref_a1B2c3D4"),
            "https://t.me/bad_exchanger_bot?start=ref_a1B2c3D4"
        );
    }
}
