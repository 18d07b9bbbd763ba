mod errors;

pub use errors::{AppError, AppErrorPayload, AppResult, ErrorContextItem, ResultExt};
