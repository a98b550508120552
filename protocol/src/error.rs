//! 错误类型定义

use thiserror::Error;

use crate::moves::Move;

/// 规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// 无效的位置
    #[error("Invalid position: ({row}, {col})")]
    InvalidPosition { row: u8, col: u8 },

    /// 不在合法走法集合中的走法
    #[error("Illegal move: {mv}")]
    IllegalMove { mv: Move },

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,

    /// 复盘时遇到非法走法
    #[error("Replay failed at move #{index}: {mv} is illegal")]
    ReplayFailed { index: usize, mv: Move },

    /// 无效的走法记号
    #[error("Invalid move notation '{input}': {reason}")]
    InvalidNotation { input: String, reason: String },

    /// 快照内容不一致
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 快照版本不匹配
    #[error("Snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 规则错误
    #[error("Game error: {0}")]
    Game(#[from] GameError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
