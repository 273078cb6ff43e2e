pub mod level;
pub mod record;
pub mod snapshot;
pub mod render;
pub mod compose;
pub mod sink;
pub mod discord;
pub mod supervisor;
pub mod hook;
pub mod layer;

pub mod env;
pub mod init;
pub mod noop_sink;

pub use hook::{DiscordHook, HookConfig, HookError};
pub use layer::DiscordLayer;
pub use level::Level;
pub use record::{LogEvent, ManualRequest, RequestBody, RequestPayload};
