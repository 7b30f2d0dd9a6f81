//! Core utilities: configuration, errors, logging, dialog state

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use error::{AppError, AppResult};
pub use logging::init_logger;
pub use session::{SessionStore, UserState};
