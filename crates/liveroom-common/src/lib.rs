pub mod errors;
pub mod id;
pub mod notices;

pub use errors::{ConfigError, LiveError};
pub use id::{new_id, now_millis, InstanceId};
pub use notices::{Notice, NoticeLevel, NoticeQueue, NoticeTopic};

pub type Result<T> = std::result::Result<T, LiveError>;
