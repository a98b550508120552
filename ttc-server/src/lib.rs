//! 超级井字棋对局服务
//!
//! 包含:
//! - 对局托管（每局独立加锁）
//! - 人机对局的 AI 接入
//! - 棋谱存储
//! - 设置
//! - 终端界面

pub mod config;
pub mod host;
pub mod storage;
pub mod terminal;

pub use config::Settings;
pub use host::{AiOpponent, GameHost, GameId, GameOptions, GameView, HostError};
pub use storage::{SavedGameInfo, StorageManager};
