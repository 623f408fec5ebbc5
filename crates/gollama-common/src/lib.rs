pub mod errors;
pub mod id;

pub use errors::{ConfigError, GollamaError};
pub use id::{new_id, new_session_id};

pub type Result<T> = std::result::Result<T, GollamaError>;
