//! Command handler implementations (/start)

use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::core::config;
use crate::core::error::AppResult;
use crate::storage::db::{self, DbPool};
use crate::storage::get_connection;
use crate::telegram::menu::show_main_menu;
use crate::telegram::Bot;
use std::sync::Arc;

/// Handle /start command
///
/// Resets the dialog, attributes the user to a referrer when a deep-link
/// payload is present, and shows the main menu.
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let user_id = chat_id.0;
    let username = msg.from.as_ref().and_then(|u| u.username.clone());

    // /start aborts whatever the user was in the middle of
    deps.sessions.clear(user_id).await;

    if let Ok(conn) = get_connection(&deps.db_pool) {
        if let Err(e) = db::ensure_user_exists(&conn, user_id, username.as_deref()) {
            log::error!("Failed to ensure user {} exists: {}", user_id, e);
        }
    }

    // Deep-link payload: "/start ref_a1B2c3D4"
    let start_arg = msg.text().and_then(|text| text.split_whitespace().nth(1));
    if let Some(arg) = start_arg {
        match process_referral(&deps.db_pool, user_id, username.as_deref(), arg) {
            Ok(Some(referrer_id)) => {
                log::info!("User {} attributed to referrer {}", user_id, referrer_id);
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("Referral attribution failed for user {}: {}", user_id, e);
            }
        }
    }

    show_main_menu(bot, chat_id, user_id).await?;
    Ok(())
}

/// Resolves a deep-link payload into a referrer and records it.
///
/// The payload is looked up as a referral code first; a raw numeric
/// value is accepted as a legacy format, but only when it names an
/// existing user from the admin set and is not the user themself. A
/// referrer that is already set is never overwritten.
fn process_referral(db_pool: &Arc<DbPool>, user_id: i64, username: Option<&str>, arg: &str) -> AppResult<Option<i64>> {
    let conn = get_connection(db_pool)?;

    if db::get_referrer_id(&conn, user_id)?.is_some() {
        return Ok(None);
    }

    db::ensure_user_exists(&conn, user_id, username)?;

    let referrer_id = match db::resolve_referral_code(&conn, arg)? {
        Some(owner_id) => Some(owner_id),
        None => {
            // Legacy format: a raw admin user id
            match arg.parse::<i64>() {
                Ok(candidate) if candidate != user_id && config::admin::is_admin(candidate) => {
                    let known_users = db::get_all_user_ids(&conn)?;
                    known_users.contains(&candidate).then_some(candidate)
                }
                _ => None,
            }
        }
    };

    if let Some(referrer_id) = referrer_id.filter(|id| *id != user_id) {
        db::set_user_referrer(&conn, user_id, referrer_id)?;
        return Ok(Some(referrer_id));
    }

    Ok(None)
}
