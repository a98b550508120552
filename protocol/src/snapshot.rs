//! 对局快照
//!
//! 完整记录大棋盘的全部状态（格子、缓存胜者、走子方、选盘标记、合法走法、历史），
//! 供会话或存储层保存后原样恢复

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Player, Position};
use crate::constants::{CELL_COUNT, SNAPSHOT_VERSION, SUB_BOARD_COUNT};
use crate::error::{GameError, ProtocolError, Result};
use crate::moves::{LegalMoves, PlayedMove};
use crate::sub_board::SubBoard;
use crate::super_board::SuperBoard;

/// 子棋盘快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubBoardSnapshot {
    /// 行优先的 9 个格子
    pub cells: Vec<Cell>,
    /// 缓存的胜者
    pub winner: Option<Player>,
}

/// 大棋盘快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// 格式版本
    pub version: u8,
    /// 行优先的 9 个子棋盘
    pub boards: Vec<SubBoardSnapshot>,
    /// 先手方
    pub start: Player,
    /// 当前走子方
    pub turn: Player,
    /// 是否处于选盘阶段
    pub choosing: bool,
    /// 按子棋盘索引排列的合法格子
    pub legal_moves: Vec<Vec<Position>>,
    /// 走法历史
    pub history: Vec<PlayedMove>,
    /// 缓存的总胜者
    pub winner: Option<Player>,
}

impl Snapshot {
    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// 编码为二进制（bincode）
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// 从二进制解码
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: self.version,
            });
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> GameError {
    GameError::InvalidSnapshot {
        reason: reason.into(),
    }
}

impl SuperBoard {
    /// 生成快照
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            boards: self
                .boards
                .iter()
                .map(|sub| SubBoardSnapshot {
                    cells: sub.cells().to_vec(),
                    winner: sub.winner(),
                })
                .collect(),
            start: self.start,
            turn: self.turn,
            choosing: self.choosing,
            legal_moves: self.legal_moves.to_vec(),
            history: self.history.clone(),
            winner: self.winner,
        }
    }

    /// 从快照恢复
    ///
    /// 校验结构与缓存胜者的一致性，并按历史复盘核对走子方、选盘标记和合法走法，
    /// 不一致时返回 [`GameError::InvalidSnapshot`]
    pub fn from_snapshot(snapshot: Snapshot) -> std::result::Result<Self, GameError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(invalid(format!("unsupported version {}", snapshot.version)));
        }
        if snapshot.boards.len() != SUB_BOARD_COUNT {
            return Err(invalid(format!("expected 9 sub-boards, got {}", snapshot.boards.len())));
        }
        if snapshot.legal_moves.len() != SUB_BOARD_COUNT {
            return Err(invalid(format!(
                "expected 9 legal move lists, got {}",
                snapshot.legal_moves.len()
            )));
        }

        let mut boards: [SubBoard; SUB_BOARD_COUNT] = Default::default();
        for (index, saved) in snapshot.boards.iter().enumerate() {
            let cells: [Cell; CELL_COUNT] = saved
                .cells
                .as_slice()
                .try_into()
                .map_err(|_| invalid(format!("sub-board {} has {} cells", index, saved.cells.len())))?;
            let sub = SubBoard::from_cells(cells);
            if sub.winner() != saved.winner {
                return Err(invalid(format!("sub-board {} winner does not match its cells", index)));
            }
            boards[index] = sub;
        }

        let mut legal_moves = LegalMoves::new();
        for (index, cells) in snapshot.legal_moves.into_iter().enumerate() {
            if cells.is_empty() {
                continue;
            }
            let sub = &boards[index];
            if sub.is_over() {
                return Err(invalid(format!("legal moves listed for finished sub-board {}", index)));
            }
            if cells.iter().any(|c| !c.is_valid() || !sub.get(*c).is_empty()) {
                return Err(invalid(format!("sub-board {} lists an unavailable cell", index)));
            }
            if let Some(board) = Position::from_index(index) {
                legal_moves.set(board, cells);
            }
        }

        if snapshot.history.iter().any(|m| !m.board.is_valid() || !m.cell.is_valid()) {
            return Err(invalid("history contains an out-of-range move"));
        }

        let mut board = SuperBoard {
            boards,
            start: snapshot.start,
            turn: snapshot.turn,
            choosing: snapshot.choosing,
            legal_moves,
            history: snapshot.history,
            winner: None,
        };
        board.refresh_winner();
        if board.winner != snapshot.winner {
            return Err(invalid("overall winner does not match the sub-boards"));
        }
        if board.is_over() && !board.legal_moves.is_empty() {
            return Err(invalid("finished game still lists legal moves"));
        }

        let replayed = SuperBoard::replay(board.start, board.history.iter().map(PlayedMove::mv))
            .map_err(|e| invalid(format!("history cannot be replayed: {}", e)))?;
        if replayed != board {
            return Err(invalid("state does not match the replayed history"));
        }

        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Move;

    fn mv(big_row: u8, big_col: u8, row: u8, col: u8) -> Move {
        Move::new(big_row, big_col, row, col).unwrap()
    }

    fn sample_board() -> SuperBoard {
        let mut board = SuperBoard::with_starting_player(Player::O);
        board.apply_move(mv(1, 1, 1, 1)).unwrap();
        board.apply_move(mv(1, 1, 0, 2)).unwrap();
        board.apply_move(mv(0, 2, 2, 2)).unwrap();
        board
    }

    #[test]
    fn test_snapshot_round_trip() {
        let board = sample_board();
        let restored = SuperBoard::from_snapshot(board.to_snapshot()).unwrap();

        assert_eq!(restored, board);
        assert_eq!(restored.history(), board.history());
        assert_eq!(restored.turn(), board.turn());
        assert_eq!(restored.legal_moves(), board.legal_moves());
    }

    #[test]
    fn test_snapshot_json_and_bytes() {
        let board = sample_board();
        let snapshot = board.to_snapshot();

        let json = snapshot.to_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);

        let bytes = snapshot.to_bytes().unwrap();
        let decoded = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(SuperBoard::from_snapshot(decoded).unwrap(), board);
    }

    #[test]
    fn test_version_mismatch() {
        let mut snapshot = sample_board().to_snapshot();
        snapshot.version = 99;
        let json = serde_json::to_string(&snapshot).unwrap();

        assert!(matches!(
            Snapshot::from_json(&json),
            Err(ProtocolError::VersionMismatch { expected: 1, actual: 99 })
        ));
        assert!(matches!(
            SuperBoard::from_snapshot(snapshot),
            Err(GameError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_rejects_tampered_winner() {
        let mut snapshot = sample_board().to_snapshot();
        snapshot.boards[4].winner = Some(Player::X);
        assert!(SuperBoard::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_occupied_legal_cell() {
        let mut snapshot = sample_board().to_snapshot();
        // 子棋盘 4 的中心已被占用
        snapshot.legal_moves[4] = vec![Position::new_unchecked(1, 1)];
        assert!(SuperBoard::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_live_game_without_legal_moves() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.apply_move(mv(1, 1, 1, 1)).unwrap();
        let mut snapshot = board.to_snapshot();
        snapshot.legal_moves = vec![Vec::new(); SUB_BOARD_COUNT];

        assert!(matches!(
            SuperBoard::from_snapshot(snapshot),
            Err(GameError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_rejects_legal_moves_on_wrong_board() {
        // 历史要求下一手落在子棋盘 8
        let mut snapshot = sample_board().to_snapshot();
        snapshot.legal_moves[8] = Vec::new();
        snapshot.legal_moves[0] = (0..9).filter_map(Position::from_index).collect();
        snapshot.turn = Player::O;

        assert!(matches!(
            SuperBoard::from_snapshot(snapshot),
            Err(GameError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_rejects_tampered_turn_or_choosing() {
        let mut snapshot = sample_board().to_snapshot();
        snapshot.turn = snapshot.turn.opponent();
        assert!(SuperBoard::from_snapshot(snapshot).is_err());

        let mut snapshot = sample_board().to_snapshot();
        snapshot.choosing = true;
        assert!(SuperBoard::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_unreplayable_history() {
        let mut snapshot = sample_board().to_snapshot();
        snapshot.history.swap(1, 2);
        assert!(matches!(
            SuperBoard::from_snapshot(snapshot),
            Err(GameError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_choosing_snapshot_round_trip() {
        // X 连下子棋盘 (0,0) 顶行后获胜，进入选盘阶段
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

        let snapshot = board.to_snapshot();
        let restored = SuperBoard::from_snapshot(snapshot.clone()).unwrap();
        assert_eq!(restored, board);
        assert!(restored.is_choosing());
        assert_eq!(restored.turn(), Player::X);
        assert_eq!(restored.legal_moves(), board.legal_moves());

        let json = snapshot.to_json().unwrap();
        let from_json = SuperBoard::from_snapshot(Snapshot::from_json(&json).unwrap()).unwrap();
        assert!(from_json.is_choosing());

        let bytes = snapshot.to_bytes().unwrap();
        let from_bytes = SuperBoard::from_snapshot(Snapshot::from_bytes(&bytes).unwrap()).unwrap();
        assert_eq!(from_bytes, board);

        // 选盘后轮到 O 在所选子棋盘落子
        let mut next = restored;
        next.apply_move(mv(2, 2, 0, 0)).unwrap();
        assert!(!next.is_choosing());
        assert_eq!(next.turn(), Player::O);
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let mut snapshot = sample_board().to_snapshot();
        snapshot.boards.pop();
        assert!(SuperBoard::from_snapshot(snapshot).is_err());

        let mut snapshot = sample_board().to_snapshot();
        snapshot.boards[0].cells.push(Cell::Empty);
        assert!(SuperBoard::from_snapshot(snapshot).is_err());
    }
}
