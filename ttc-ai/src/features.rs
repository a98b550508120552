//! 训练特征提取
//!
//! 每一步走法之前的局面从走子方视角编码为三进制整数：2 为走子方，1 为空，0 为对手，
//! 第一个位置为最高位。子棋盘胜者网格按行优先排列，子棋盘内的格子按列优先排列。
//! 每名玩家的走法按 `结果 * 0.9^k` 打分，k 为距离该玩家最后一步的步数

use protocol::{GameError, Move, Player, SuperBoard, SUB_BOARD_COUNT};
use serde::{Deserialize, Serialize};

use crate::generate::GeneratedGame;

/// 折扣系数
pub const DISCOUNT: f64 = 0.9;

/// 一条训练样本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// 子棋盘胜者网格的编码
    pub sub_board_winners: u32,
    /// 每个子棋盘格子的编码
    pub sub_boards: [u32; SUB_BOARD_COUNT],
    /// 走子方
    pub player: Player,
    /// 实际走法
    pub mv: Move,
    /// 是否为选盘走法
    pub choice: bool,
    /// 得分
    pub score: f64,
}

/// 以 `perspective` 的视角编码 9 个归属
pub fn encode_owners(owners: &[Option<Player>; 9], perspective: Player) -> u32 {
    owners.iter().fold(0, |acc, owner| {
        let digit = match owner {
            Some(p) if *p == perspective => 2,
            Some(_) => 0,
            None => 1,
        };
        acc * 3 + digit
    })
}

/// 列优先序号对应的行优先格子下标
fn column_major(p: usize) -> usize {
    (p % 3) * 3 + p / 3
}

/// 按结果为一名玩家的走法打分，最后一步得分为结果本身
fn rate(samples: &mut [TrainingSample], outcome: f64) {
    let n = samples.len();
    for (i, sample) in samples.iter_mut().enumerate() {
        sample.score = outcome * DISCOUNT.powi((n - 1 - i) as i32);
    }
}

/// 从一局棋中提取样本
///
/// 先手方的样本在前，后手方在后
pub fn extract(game: &GeneratedGame) -> Result<Vec<TrainingSample>, GameError> {
    let mut board = SuperBoard::with_starting_player(game.start);
    let mut first = Vec::new();
    let mut second = Vec::new();

    for (index, played) in game.moves.iter().enumerate() {
        let mover = board.turn();
        let sub_boards = std::array::from_fn(|i| {
            let cells = board.boards()[i].cells();
            let owners = std::array::from_fn(|p| cells[column_major(p)].player());
            encode_owners(&owners, mover)
        });
        let sample = TrainingSample {
            sub_board_winners: encode_owners(&board.sub_board_winners(), mover),
            sub_boards,
            player: mover,
            mv: played.mv(),
            choice: played.choice,
            score: 0.0,
        };

        let mv = played.mv();
        board
            .apply_move(mv)
            .map_err(|_| GameError::ReplayFailed { index, mv })?;

        if mover == game.start {
            first.push(sample);
        } else {
            second.push(sample);
        }
    }

    let outcome = match game.winner {
        Some(winner) if winner == game.start => 1.0,
        Some(_) => -1.0,
        None => 0.0,
    };
    rate(&mut first, outcome);
    rate(&mut second, -outcome);

    first.extend(second);
    Ok(first)
}

/// 从多局棋中提取样本
pub fn extract_all(games: &[GeneratedGame]) -> Result<Vec<TrainingSample>, GameError> {
    let mut samples = Vec::new();
    for game in games {
        samples.extend(extract(game)?);
    }
    Ok(samples)
}
