//! Tic-Tac-Ception 规则引擎
//!
//! 包含:
//! - 玩家、格子、坐标等核心数据结构
//! - 子棋盘与大棋盘（回合 / 选盘状态机、合法走法推导、胜负判定）
//! - 走法历史与复盘
//! - 快照格式（JSON, bincode）
//! - 棋谱格式与走法记号

mod cell;
mod constants;
mod error;
mod moves;
mod notation;
mod record;
mod snapshot;
mod sub_board;
mod super_board;

pub use cell::{Cell, Player, Position};
pub use constants::*;
pub use error::{GameError, ProtocolError, Result};
pub use moves::{LegalMoves, Move, PlayedMove};
pub use notation::Notation;
pub use record::{GameMetadata, GameRecord, GameResult, MoveRecord, RECORD_VERSION};
pub use snapshot::{Snapshot, SubBoardSnapshot};
pub use sub_board::SubBoard;
pub use super_board::{GameState, SuperBoard};
