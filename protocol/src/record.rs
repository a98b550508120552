//! 棋谱记录格式
//!
//! 保存先手方和完整走法序列（含选盘走法），加载时逐步复盘重建对局

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cell::{Player, Position};
use crate::error::GameError;
use crate::moves::{Move, PlayedMove};
use crate::notation::Notation;
use crate::super_board::SuperBoard;

/// 棋谱版本
pub const RECORD_VERSION: &str = "1.0";

/// 对局结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// 一方获胜
    Win(Player),
    /// 平局
    Draw,
}

impl GameResult {
    /// 从已结束的棋盘读取结果
    pub fn of(board: &SuperBoard) -> Option<GameResult> {
        if !board.is_over() {
            return None;
        }
        Some(match board.winner() {
            Some(player) => GameResult::Win(player),
            None => GameResult::Draw,
        })
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Win(player) => write!(f, "{} 胜", player),
            GameResult::Draw => write!(f, "平局"),
        }
    }
}

/// 游戏元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// X 方玩家名
    pub player_x: String,
    /// O 方玩家名
    pub player_o: String,
    /// 游戏日期
    pub date: String,
    /// AI 模式（人机对局）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_mode: Option<String>,
    /// 游戏结果
    pub result: Option<GameResult>,
}

/// 走法记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 子棋盘位置 [行, 列]
    pub board: [u8; 2],
    /// 格子位置 [行, 列]
    pub cell: [u8; 2],
    /// 文本记号
    pub notation: String,
    /// 是否为选盘走法
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub choice: bool,
}

impl MoveRecord {
    /// 从历史条目创建
    pub fn from_played(played: &PlayedMove) -> Self {
        let mv = played.mv();
        Self {
            board: mv.board.to_array(),
            cell: mv.cell.to_array(),
            notation: Notation::format(&mv),
            choice: played.choice,
        }
    }

    /// 获取走法（坐标越界时为 None）
    pub fn to_move(&self) -> Option<Move> {
        Move::new(self.board[0], self.board[1], self.cell[0], self.cell[1])
    }
}

/// 完整的棋谱记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// 版本号
    pub version: String,
    /// 元数据
    pub metadata: GameMetadata,
    /// 先手方
    pub start: Player,
    /// 走法列表
    pub moves: Vec<MoveRecord>,
    /// 保存时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    /// 创建空棋谱
    pub fn new(player_x: String, player_o: String, start: Player) -> Self {
        Self {
            version: RECORD_VERSION.to_string(),
            metadata: GameMetadata {
                player_x,
                player_o,
                date: Utc::now().format("%Y-%m-%d").to_string(),
                ai_mode: None,
                result: None,
            },
            start,
            moves: Vec::new(),
            saved_at: None,
        }
    }

    /// 从当前棋盘导出棋谱
    pub fn from_board(board: &SuperBoard, player_x: String, player_o: String) -> Self {
        let mut record = Self::new(player_x, player_o, board.starting_player());
        record.moves = board.history().iter().map(MoveRecord::from_played).collect();
        record.metadata.result = GameResult::of(board);
        record
    }

    /// 设置 AI 模式
    pub fn set_ai_mode(&mut self, ai_mode: &str) {
        self.metadata.ai_mode = Some(ai_mode.to_string());
    }

    /// 添加走法
    pub fn add_move(&mut self, played: &PlayedMove) {
        self.moves.push(MoveRecord::from_played(played));
    }

    /// 设置游戏结果
    pub fn set_result(&mut self, result: GameResult) {
        self.metadata.result = Some(result);
    }

    /// 复盘重建对局
    ///
    /// 任何一步越界、非法，或选盘标记、记号与复盘局面不符都会使加载失败
    pub fn replay(&self) -> Result<SuperBoard, GameError> {
        let board = self.walk(|_, _, _| {})?;
        info!(moves = self.moves.len(), over = board.is_over(), "棋谱加载完成");
        Ok(board)
    }

    /// 逐步复盘，每步成功后以 (序号, 走子方, 记录) 调用 `visit`
    fn walk<F>(&self, mut visit: F) -> Result<SuperBoard, GameError>
    where
        F: FnMut(usize, Player, &MoveRecord),
    {
        let mut board = SuperBoard::with_starting_player(self.start);
        for (index, record) in self.moves.iter().enumerate() {
            let mv = record.to_move().ok_or(GameError::ReplayFailed {
                index,
                mv: Move::at(
                    Position::new_unchecked(record.board[0], record.board[1]),
                    Position::new_unchecked(record.cell[0], record.cell[1]),
                ),
            })?;
            let failed = GameError::ReplayFailed { index, mv };

            if record.choice != board.is_choosing() || Notation::parse(&record.notation) != Ok(mv) {
                debug!(index, %mv, choice = record.choice, notation = %record.notation, "棋谱记录与局面不符");
                return Err(failed);
            }

            let player = board.turn();
            board.apply_move(mv).map_err(|_| failed)?;
            visit(index, player, record);
        }
        Ok(board)
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 生成逐步走法文本
    ///
    /// 走子方由复盘得出，棋谱无法复盘时返回错误
    pub fn to_play_by_play(&self) -> Result<String, GameError> {
        let mut output = String::new();

        output.push_str(&format!("X: {}\n", self.metadata.player_x));
        output.push_str(&format!("O: {}\n", self.metadata.player_o));
        output.push_str(&format!("先手: {}\n", self.start));

        if !self.moves.is_empty() {
            output.push_str("\n走法：\n");
            self.walk(|i, player, record| {
                if record.choice {
                    output.push_str(&format!(
                        "{}. {} 选择子棋盘 ({}, {})\n",
                        i + 1,
                        player,
                        record.board[0],
                        record.board[1]
                    ));
                } else {
                    output.push_str(&format!("{}. {} {}\n", i + 1, player, record.notation));
                }
            })?;
        }

        if let Some(result) = self.metadata.result {
            output.push_str(&format!("\n结果: {}\n", result));
        }

        Ok(output)
    }
}
