//! 随机自对弈棋局生成
//!
//! 生成的棋局可用于训练模型

use protocol::{GameError, PlayedMove, Player, SuperBoard};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::selector::{MoveSelector, RandomSelector};

/// 生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// 棋局数量
    pub games: usize,
    /// 随机种子（None 为系统熵）
    pub seed: Option<u64>,
    /// 每完成多少百分比输出一次进度
    pub progress_pct: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            games: 10,
            seed: None,
            progress_pct: 5.0,
        }
    }
}

/// 生成的一局棋
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedGame {
    /// 先手方
    pub start: Player,
    /// 完整走法历史
    pub moves: Vec<PlayedMove>,
    /// 胜者（None 为平局）
    pub winner: Option<Player>,
}

impl GeneratedGame {
    /// 复盘重建最终局面
    pub fn replay(&self) -> Result<SuperBoard, GameError> {
        SuperBoard::replay(self.start, self.moves.iter().map(PlayedMove::mv))
    }
}

/// 棋局生成器
pub struct GameGenerator {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
}

impl GameGenerator {
    /// 创建生成器
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { config, rng }
    }

    /// 随机下完一局
    pub fn play_one(&mut self) -> GeneratedGame {
        let mut board = SuperBoard::new(&mut self.rng);
        let mut selector = RandomSelector::new(&mut self.rng);

        while let Some(mv) = selector.select_move(&board) {
            if board.apply_move(mv).is_err() {
                break;
            }
        }

        debug!(moves = board.history().len(), winner = ?board.winner(), "生成一局");
        GeneratedGame {
            start: board.starting_player(),
            moves: board.history().to_vec(),
            winner: board.winner(),
        }
    }

    /// 按配置生成全部棋局
    pub fn generate(&mut self) -> Vec<GeneratedGame> {
        let total = self.config.games;
        let step = ((total as f64 * self.config.progress_pct / 100.0).ceil() as usize).max(1);
        let mut games = Vec::with_capacity(total);

        for i in 0..total {
            if i % step == 0 {
                info!(
                    "正在生成第 {} 局 ({:.2}%)",
                    i,
                    (i + 1) as f64 / total as f64 * 100.0
                );
            }
            games.push(self.play_one());
        }

        info!(games = games.len(), "生成完成");
        games
    }
}
