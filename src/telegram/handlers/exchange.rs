//! The exchange order flow: currency → amount → wallet → confirm

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, Message, MessageId, ParseMode};

use super::types::HandlerDeps;
use crate::core::config;
use crate::core::config::exchange::MIN_AMOUNT_RUB;
use crate::core::error::AppResult;
use crate::core::session::UserState;
use crate::exchange::{check_amount, convert_to_crypto, find_currency, generate_comment, AmountCheck};
use crate::storage::db::{self, NewOrder};
use crate::storage::get_connection;
use crate::telegram::menu::{confirm_keyboard, crypto_keyboard, edit_or_send, show_main_menu};
use crate::telegram::Bot;
use crate::texts;

/// Entry point of the flow: show the currency keyboard.
pub(crate) async fn start_exchange(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    // A new exchange discards any previous progress
    deps.sessions.set(user_id, UserState::WaitingCrypto).await;

    edit_or_send(bot, chat_id, message_id, texts::select_crypto(), Some(crypto_keyboard())).await
}

/// A currency button was pressed.
pub(crate) async fn select_crypto(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    code: &str,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    // Currency buttons are only live while the user is picking or
    // re-picking a currency; a stale button press is ignored.
    match deps.sessions.get(user_id).await {
        Some(UserState::WaitingCrypto) | Some(UserState::WaitingAmount { .. }) => {}
        _ => return Ok(()),
    }

    let Some(currency) = find_currency(code) else {
        log::warn!("Unknown currency code in callback: {}", code);
        return Ok(());
    };

    deps.sessions
        .set(
            user_id,
            UserState::WaitingAmount {
                crypto: currency.code.to_string(),
            },
        )
        .await;

    edit_or_send(
        bot,
        chat_id,
        message_id,
        texts::enter_amount(currency.name, MIN_AMOUNT_RUB),
        None,
    )
    .await
}

/// Free-text RUB amount while in `waiting_amount`.
///
/// Invalid or too-small input re-prompts without a transition.
pub(crate) async fn handle_amount_input(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    crypto: String,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or("");

    match check_amount(text, MIN_AMOUNT_RUB) {
        AmountCheck::Invalid => {
            bot.send_message(chat_id, texts::invalid_amount()).await?;
        }
        AmountCheck::BelowMin => {
            bot.send_message(chat_id, texts::min_amount_error(MIN_AMOUNT_RUB)).await?;
        }
        AmountCheck::Ok(amount_rub) => {
            let Some(currency) = find_currency(&crypto) else {
                // State carries a currency the catalog no longer has
                log::error!("Currency {} missing from catalog, resetting user {}", crypto, chat_id.0);
                deps.sessions.clear(chat_id.0).await;
                return Ok(());
            };

            let crypto_amount = convert_to_crypto(amount_rub, currency.rate);

            deps.sessions
                .set(
                    chat_id.0,
                    UserState::WaitingWallet {
                        crypto,
                        amount_rub,
                        crypto_amount,
                    },
                )
                .await;

            bot.send_message(chat_id, texts::enter_wallet(amount_rub, crypto_amount, currency.code))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }

    Ok(())
}

/// Destination wallet while in `waiting_wallet`. Any text is accepted.
pub(crate) async fn handle_wallet_input(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    crypto: String,
    amount_rub: f64,
    crypto_amount: f64,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let wallet_address = msg.text().unwrap_or("").trim().to_string();
    let comment = generate_comment();

    let details = texts::payment_details(
        &config::exchange::PAYMENT_PHONE,
        &config::exchange::PAYMENT_BANK,
        &comment,
    );
    let summary = texts::order_details(amount_rub, crypto_amount, &crypto, &wallet_address, &details);

    deps.sessions
        .set(
            chat_id.0,
            UserState::Confirming {
                crypto,
                amount_rub,
                crypto_amount,
                wallet_address,
                comment,
            },
        )
        .await;

    bot.send_message(chat_id, summary)
        .parse_mode(ParseMode::Html)
        .reply_markup(confirm_keyboard())
        .await?;

    Ok(())
}

/// Confirm button: persist the order and ask for the receipt.
///
/// A persistence failure is logged and surfaced as a generic alert; the
/// dialog stays in `confirming` so the user can retry.
pub(crate) async fn confirm_order(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    username: Option<&str>,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let Some(UserState::Confirming {
        crypto,
        amount_rub,
        crypto_amount,
        wallet_address,
        comment,
    }) = deps.sessions.get(user_id).await
    else {
        // Stale confirm button after a reset
        bot.answer_callback_query(callback_id.clone())
            .text(texts::order_failed())
            .show_alert(true)
            .await?;
        return Ok(());
    };

    let persisted: AppResult<i64> = (|| {
        let conn = get_connection(&deps.db_pool)?;
        db::ensure_user_exists(&conn, user_id, username)?;
        let order = NewOrder {
            user_id,
            username: username.unwrap_or("No username"),
            amount_rub,
            crypto_type: &crypto,
            crypto_amount,
            wallet_address: &wallet_address,
            comment: &comment,
            referral_code: None,
        };
        Ok(db::create_order(&conn, &order)?)
    })();

    match persisted {
        Ok(order_id) => {
            log::info!(
                "Order #{} created: user={}, {} RUB -> {} {}",
                order_id,
                user_id,
                amount_rub,
                crypto_amount,
                crypto
            );

            deps.sessions.set(user_id, UserState::WaitingReceipt { order_id }).await;

            let _ = bot.answer_callback_query(callback_id.clone()).await;
            edit_or_send(
                bot,
                chat_id,
                message_id,
                texts::awaiting_payment(
                    order_id,
                    amount_rub,
                    crypto_amount,
                    &crypto,
                    &comment,
                    &config::exchange::PAYMENT_PHONE,
                    &config::exchange::PAYMENT_BANK,
                ),
                None,
            )
            .await?;
        }
        Err(e) => {
            log::error!("Failed to create order for user {}: {}", user_id, e);
            bot.answer_callback_query(callback_id.clone())
                .text(texts::order_failed())
                .show_alert(true)
                .await?;
        }
    }

    Ok(())
}

/// Cancel button: discard the dialog and return to the main menu.
pub(crate) async fn cancel_order(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.sessions.clear(user_id).await;

    edit_or_send(bot, chat_id, message_id, texts::order_cancelled(), None).await?;
    show_main_menu(bot, chat_id, user_id).await?;
    Ok(())
}
