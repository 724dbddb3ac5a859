pub mod commands;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;

pub use error::{AppError, AppResult, CommandError};
