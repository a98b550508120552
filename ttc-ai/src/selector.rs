//! 走法选择
//!
//! 引擎不关心走法如何产生，选手只需从当前合法走法中挑出一步

use std::str::FromStr;

use protocol::{Move, Position, SuperBoard};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 走法选择接口
pub trait MoveSelector {
    /// 选择一步合法走法，没有合法走法时返回 None
    fn select_move(&mut self, board: &SuperBoard) -> Option<Move>;
}

/// 随机选手
///
/// 先随机选一个可选的子棋盘，再随机选其中一个空格。
/// 选盘阶段格子固定为该子棋盘的第一个空格
pub struct RandomSelector<R = ChaCha8Rng> {
    rng: R,
}

impl RandomSelector<ChaCha8Rng> {
    /// 使用固定种子创建（可复现）
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// 使用系统熵创建
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> RandomSelector<R> {
    /// 使用指定随机数源创建
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// 取出随机数源
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> MoveSelector for RandomSelector<R> {
    fn select_move(&mut self, board: &SuperBoard) -> Option<Move> {
        let legal = board.legal_moves();
        let boards: Vec<Position> = legal.boards().collect();
        let target = *boards.choose(&mut self.rng)?;

        let cells = legal.cells(target);
        let cell = if board.is_choosing() {
            *cells.first()?
        } else {
            *cells.choose(&mut self.rng)?
        };

        Some(Move::at(target, cell))
    }
}

/// AI 模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiMode {
    /// 随机走子
    #[default]
    Random,
}

impl AiMode {
    /// 模式名
    pub fn as_str(&self) -> &'static str {
        match self {
            AiMode::Random => "random",
        }
    }

    /// 创建对应的选手
    pub fn selector(&self, seed: Option<u64>) -> Box<dyn MoveSelector + Send> {
        match self {
            AiMode::Random => match seed {
                Some(seed) => Box::new(RandomSelector::seeded(seed)),
                None => Box::new(RandomSelector::from_entropy()),
            },
        }
    }
}

impl std::fmt::Display for AiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的 AI 模式
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown AI mode: {0}")]
pub struct ParseAiModeError(pub String);

impl FromStr for AiMode {
    type Err = ParseAiModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(AiMode::Random),
            other => Err(ParseAiModeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Player;

    fn mv(big_row: u8, big_col: u8, row: u8, col: u8) -> Move {
        Move::new(big_row, big_col, row, col).unwrap()
    }

    #[test]
    fn test_random_selector_picks_legal_move() {
        let mut selector = RandomSelector::seeded(3);
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.apply_move(mv(0, 0, 1, 2)).unwrap();

        for _ in 0..50 {
            let chosen = selector.select_move(&board).unwrap();
            assert!(board.legal_moves().contains(&chosen));
            assert_eq!(chosen.board, Position::new_unchecked(1, 2));
        }
    }

    #[test]
    fn test_random_selector_is_reproducible() {
        let board = SuperBoard::with_starting_player(Player::O);
        let mut a = RandomSelector::seeded(11);
        let mut b = RandomSelector::seeded(11);
        for _ in 0..20 {
            assert_eq!(a.select_move(&board), b.select_move(&board));
        }
    }

    #[test]
    fn test_choosing_uses_first_empty_cell() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        for m in [
            mv(0, 0, 0, 1),
            mv(0, 1, 0, 0),
            mv(0, 0, 0, 2),
            mv(0, 2, 0, 0),
            mv(0, 0, 0, 0),
        ] {
            board.apply_move(m).unwrap();
        }
        assert!(board.is_choosing());

        let mut selector = RandomSelector::seeded(5);
        for _ in 0..20 {
            let chosen = selector.select_move(&board).unwrap();
            let first = board.legal_moves().cells(chosen.board)[0];
            assert_eq!(chosen.cell, first);
            assert_ne!(chosen.board, Position::new_unchecked(0, 0));
        }
    }

    #[test]
    fn test_no_move_when_over() {
        let mut board = SuperBoard::default();
        let mut selector = RandomSelector::seeded(9);
        while let Some(m) = selector.select_move(&board) {
            board.apply_move(m).unwrap();
        }
        assert!(board.is_over());
    }

    #[test]
    fn test_ai_mode_parse() {
        assert_eq!("random".parse::<AiMode>(), Ok(AiMode::Random));
        assert_eq!(" Random ".parse::<AiMode>(), Ok(AiMode::Random));
        assert!("minimax".parse::<AiMode>().is_err());
        assert_eq!(AiMode::Random.to_string(), "random");
    }

    #[test]
    fn test_ai_mode_selector() {
        let board = SuperBoard::default();
        let mut selector = AiMode::Random.selector(Some(1));
        let chosen = selector.select_move(&board).unwrap();
        assert!(board.legal_moves().contains(&chosen));
    }
}
