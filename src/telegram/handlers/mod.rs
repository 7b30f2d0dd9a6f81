//! Handler modules: dispatcher schema and the individual update handlers

pub(crate) mod commands;
pub(crate) mod exchange;
pub(crate) mod receipts;
mod schema;
mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
