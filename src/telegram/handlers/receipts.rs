//! Payment receipt uploads (photos and documents)

use std::path::{Path, PathBuf};

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, Message, ParseMode};

use super::types::{HandlerDeps, HandlerError};
use crate::core::config;
use crate::core::error::AppResult;
use crate::core::session::UserState;
use crate::storage::db;
use crate::storage::get_connection;
use crate::telegram::Bot;
use crate::texts;

/// Handles an uploaded photo or document.
///
/// Outside `waiting_receipt` the upload is rejected and nothing is
/// written anywhere. Inside it, the file is stored under the receipts
/// directory and its path is attached to the order.
pub(super) async fn handle_receipt_upload(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let user_id = chat_id.0;

    let Some(UserState::WaitingReceipt { order_id }) = deps.sessions.get(user_id).await else {
        bot.send_message(chat_id, texts::receipt_no_pending()).await?;
        return Ok(());
    };

    // Largest photo size, or the document as-is
    let file_id = if let Some(photos) = msg.photo() {
        photos.iter().max_by_key(|p| p.width * p.height).map(|p| p.file.id.clone())
    } else {
        msg.document().map(|doc| doc.file.id.clone())
    };

    let Some(file_id) = file_id else {
        return Ok(());
    };

    match download_receipt(bot, &file_id, user_id, msg.id.0).await {
        Ok(local_path) => {
            let saved = get_connection(&deps.db_pool)
                .map_err(|e| e.to_string())
                .and_then(|conn| {
                    db::save_receipt_path(&conn, order_id, &local_path.to_string_lossy()).map_err(|e| e.to_string())
                });

            match saved {
                Ok(()) => {
                    log::info!(
                        "Receipt for order #{} saved to {} (user {})",
                        order_id,
                        local_path.display(),
                        user_id
                    );
                    deps.sessions.clear(user_id).await;
                    bot.send_message(chat_id, texts::receipt_saved())
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
                Err(e) => {
                    log::error!("Failed to record receipt path for order #{}: {}", order_id, e);
                    bot.send_message(chat_id, texts::receipt_save_failed()).await?;
                }
            }
        }
        Err(e) => {
            log::error!("Failed to download receipt for order #{}: {}", order_id, e);
            bot.send_message(chat_id, texts::receipt_save_failed()).await?;
        }
    }

    Ok(())
}

/// Downloads a Telegram file into the receipts directory.
///
/// The destination name is deterministic: `receipt_<user_id>_<message_id>`
/// plus the extension Telegram reports for the file.
async fn download_receipt(bot: &Bot, file_id: &FileId, user_id: i64, message_id: i32) -> AppResult<PathBuf> {
    let file = bot.get_file(file_id.clone()).await?;

    let extension = Path::new(&file.path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let dest_path = Path::new(config::RECEIPTS_DIR.as_str()).join(receipt_file_name(user_id, message_id, &extension));

    tokio::fs::create_dir_all(config::RECEIPTS_DIR.as_str()).await?;
    let mut dst = tokio::fs::File::create(&dest_path).await?;
    bot.download_file(&file.path, &mut dst).await?;

    Ok(dest_path)
}

/// Builds the deterministic receipt file name.
fn receipt_file_name(user_id: i64, message_id: i32, extension: &str) -> String {
    format!("receipt_{}_{}{}", user_id, message_id, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_deterministic() {
        assert_eq!(receipt_file_name(42, 1007, ".jpg"), "receipt_42_1007.jpg");
        assert_eq!(receipt_file_name(42, 1007, ""), "receipt_42_1007");
    }
}
