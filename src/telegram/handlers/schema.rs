//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::handle_start_command;
use super::receipts::handle_receipt_upload;
use super::types::{HandlerDeps, HandlerError};
use crate::core::session::UserState;
use crate::telegram::bot::Command;
use crate::telegram::{admin, handle_menu_callback, Bot};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// This function returns a handler tree that can be used with teloxide's
/// Dispatcher. The same schema is used in production and in tests.
///
/// # Arguments
/// * `deps` - Handler dependencies (database pool, session store, bot username)
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_receipts = deps.clone();
    let deps_text = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Commands first so /start always resets the dialog
        .branch(command_handler(deps_commands))
        // Receipt uploads (photo/document)
        .branch(receipt_handler(deps_receipts))
        // State-driven text input (amount, wallet, referral link name)
        .branch(text_handler(deps_text))
        // Callback query handler (inline keyboard buttons)
        .branch(callback_handler(deps_callback))
}

/// Handler for bot commands (/start)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => {
                        handle_start_command(&bot, &msg, &deps).await?;
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Handler for uploaded payment receipts (photos and documents)
fn receipt_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.photo().is_some() || msg.document().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_receipt_upload(&bot, &msg, &deps).await {
                    log::error!("Receipt handler failed for chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

/// Handler for plain text, dispatched on the user's dialog state
fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    use super::exchange::{handle_amount_input, handle_wallet_input};

    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let user_id = msg.chat.id.0;

                match deps.sessions.get(user_id).await {
                    Some(UserState::WaitingAmount { crypto }) => {
                        handle_amount_input(&bot, &msg, &deps, crypto).await?;
                    }
                    Some(UserState::WaitingWallet {
                        crypto,
                        amount_rub,
                        crypto_amount,
                    }) => {
                        handle_wallet_input(&bot, &msg, &deps, crypto, amount_rub, crypto_amount).await?;
                    }
                    Some(UserState::WaitingReferralName) => {
                        admin::handle_referral_name_input(&bot, &msg, &deps).await?;
                    }
                    // Idle or waiting on a button press / upload: free text is ignored
                    _ => {}
                }
                Ok(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let result: teloxide::RequestError = match handle_menu_callback(bot, q, deps).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            Err(Box::new(result) as HandlerError)
        }
    })
}
