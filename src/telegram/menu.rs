//! Menus, keyboards and the callback router

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};

use crate::core::config;
use crate::core::config::exchange::CURRENCIES;
use crate::telegram::handlers::{exchange as exchange_flow, HandlerDeps};
use crate::telegram::{admin, Bot};
use crate::texts;

/// Shorthand for an inline callback button.
pub(crate) fn cb(text: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), data.into())
}

/// Main menu: exchange for everyone, admin panel or support depending on role.
pub fn main_menu_keyboard(is_admin: bool) -> InlineKeyboardMarkup {
    let second_row = if is_admin {
        cb(texts::btn_admin(), "admin")
    } else {
        cb(texts::btn_support(), "support")
    };
    InlineKeyboardMarkup::new(vec![vec![cb(texts::btn_exchange(), "exchange")], vec![second_row]])
}

/// One button per supported currency plus a way back.
pub fn crypto_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = CURRENCIES
        .iter()
        .map(|c| vec![cb(c.name, format!("crypto:{}", c.code))])
        .collect();
    rows.push(vec![cb(texts::btn_back(), "main")]);
    InlineKeyboardMarkup::new(rows)
}

/// Confirm / cancel row shown with the order summary.
pub fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        cb(texts::btn_confirm(), "order:confirm"),
        cb(texts::btn_cancel(), "order:cancel"),
    ]])
}

/// Admin panel actions.
pub fn admin_panel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb(texts::btn_stats(), "admin:stats")],
        vec![cb(texts::btn_links(), "admin:links")],
        vec![cb(texts::btn_create_link(), "admin:create")],
        vec![cb(texts::btn_main_menu(), "main")],
    ])
}

/// Single back button leading to the admin panel.
pub fn back_to_admin_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb(texts::btn_back(), "admin")]])
}

/// Edit the message in place, falling back to a fresh message when the
/// edit is rejected (message too old, same content, etc).
pub(crate) async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let mut edit = bot
        .edit_message_text(chat_id, message_id, text.clone())
        .parse_mode(ParseMode::Html);
    if let Some(ref kb) = keyboard {
        edit = edit.reply_markup(kb.clone());
    }

    match edit.await {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut send = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
            if let Some(kb) = keyboard {
                send = send.reply_markup(kb);
            }
            send.await?;
            Ok(())
        }
    }
}

/// Sends the main menu as a new message.
pub async fn show_main_menu(bot: &Bot, chat_id: ChatId, user_id: i64) -> ResponseResult<Message> {
    let is_admin = config::admin::is_admin(user_id);
    let welcome = if is_admin {
        texts::admin_welcome()
    } else {
        texts::user_welcome()
    };

    bot.send_message(chat_id, texts::start_message(&welcome))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard(is_admin))
        .await
}

/// Replaces the current message with the main menu.
pub async fn edit_main_menu(bot: &Bot, chat_id: ChatId, message_id: MessageId, user_id: i64) -> ResponseResult<()> {
    let is_admin = config::admin::is_admin(user_id);
    let welcome = if is_admin {
        texts::admin_welcome()
    } else {
        texts::user_welcome()
    };

    edit_or_send(
        bot,
        chat_id,
        message_id,
        texts::start_message(&welcome),
        Some(main_menu_keyboard(is_admin)),
    )
    .await
}

/// Handles callback queries from the inline keyboards.
///
/// Routes button presses to the exchange flow, the admin panel, or menu
/// navigation.
pub async fn handle_menu_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> ResponseResult<()> {
    let callback_id = q.id.clone();
    let user_id = i64::try_from(q.from.id.0).unwrap_or(0);
    let username = q.from.username.clone();

    if let Some(data) = q.data {
        let chat_id = q.message.as_ref().map(|m| m.chat().id);
        let message_id = q.message.as_ref().map(|m| m.id());

        if let (Some(chat_id), Some(message_id)) = (chat_id, message_id) {
            match data.as_str() {
                "exchange" => {
                    let _ = bot.answer_callback_query(callback_id).await;
                    exchange_flow::start_exchange(&bot, chat_id, message_id, user_id, &deps).await?;
                }
                "order:confirm" => {
                    exchange_flow::confirm_order(
                        &bot,
                        &callback_id,
                        chat_id,
                        message_id,
                        user_id,
                        username.as_deref(),
                        &deps,
                    )
                    .await?;
                }
                "order:cancel" => {
                    let _ = bot.answer_callback_query(callback_id).await;
                    exchange_flow::cancel_order(&bot, chat_id, message_id, user_id, &deps).await?;
                }
                "support" => {
                    let _ = bot.answer_callback_query(callback_id).await;
                    edit_or_send(&bot, chat_id, message_id, texts::support(), None).await?;
                }
                "main" => {
                    let _ = bot.answer_callback_query(callback_id).await;
                    deps.sessions.clear(user_id).await;
                    edit_main_menu(&bot, chat_id, message_id, user_id).await?;
                }
                "admin" => {
                    admin::show_panel(&bot, &callback_id, chat_id, message_id, user_id).await?;
                }
                "admin:stats" => {
                    admin::show_stats(&bot, &callback_id, chat_id, message_id, user_id, &deps).await?;
                }
                "admin:links" => {
                    admin::show_links(&bot, &callback_id, chat_id, message_id, user_id, &deps).await?;
                }
                "admin:create" => {
                    admin::start_create_link(&bot, &callback_id, chat_id, user_id, &deps).await?;
                }
                other => {
                    if let Some(code) = other.strip_prefix("crypto:") {
                        let _ = bot.answer_callback_query(callback_id).await;
                        exchange_flow::select_crypto(&bot, chat_id, message_id, user_id, code, &deps).await?;
                    } else {
                        log::warn!("Unknown callback data: {}", other);
                        let _ = bot.answer_callback_query(callback_id).await;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: extract all callback_data strings from a keyboard
    fn callback_data(keyboard: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        keyboard
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|btn| match &btn.kind {
                        teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_main_menu_for_user() {
        let kb = main_menu_keyboard(false);
        let data = callback_data(&kb);

        assert_eq!(data, vec![vec!["exchange".to_string()], vec!["support".to_string()]]);
    }

    #[test]
    fn test_main_menu_for_admin() {
        let kb = main_menu_keyboard(true);
        let data = callback_data(&kb);

        assert_eq!(data, vec![vec!["exchange".to_string()], vec!["admin".to_string()]]);
    }

    #[test]
    fn test_crypto_keyboard_lists_all_currencies() {
        let kb = crypto_keyboard();
        let data: Vec<String> = callback_data(&kb).into_iter().flatten().collect();

        assert_eq!(
            data,
            vec!["crypto:BTC", "crypto:ETH", "crypto:LTC", "crypto:USDT", "main"]
        );
    }

    #[test]
    fn test_confirm_keyboard_has_both_actions_in_one_row() {
        let kb = confirm_keyboard();
        let data = callback_data(&kb);

        assert_eq!(data, vec![vec!["order:confirm".to_string(), "order:cancel".to_string()]]);
    }

    #[test]
    fn test_admin_panel_keyboard_layout() {
        let kb = admin_panel_keyboard();
        let data: Vec<String> = callback_data(&kb).into_iter().flatten().collect();

        assert_eq!(data, vec!["admin:stats", "admin:links", "admin:create", "main"]);
    }
}
