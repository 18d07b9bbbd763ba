pub mod events;
pub mod models;

pub use arsenal_protocol::{AppError, AppErrorPayload, AppResult, ErrorContextItem, ResultExt};
