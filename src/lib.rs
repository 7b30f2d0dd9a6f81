//! BAD Exchanger - Telegram bot taking crypto-for-cash exchange orders
//!
//! The bot walks a user through a linear order flow (currency, amount,
//! wallet, confirmation, payment receipt) and records the resulting
//! order for manual fulfillment by an administrator.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, per-user dialog state
//! - `exchange`: currency catalog, rate conversion, token generation
//! - `storage`: database schema and access
//! - `telegram`: bot integration and handlers

pub mod core;
pub mod exchange;
pub mod i18n;
pub mod storage;
pub mod telegram;
pub mod texts;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
