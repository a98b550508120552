//! Tic-Tac-Ception AI
//!
//! 包含:
//! - 走法选择接口与随机选手
//! - 随机自对弈棋局生成
//! - 训练特征提取

mod features;
mod generate;
mod selector;

pub use features::{encode_owners, extract, extract_all, TrainingSample, DISCOUNT};
pub use generate::{GameGenerator, GeneratedGame, GeneratorConfig};
pub use selector::{AiMode, MoveSelector, ParseAiModeError, RandomSelector};
