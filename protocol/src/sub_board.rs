//! 子棋盘（普通的 3x3 井字棋）

use crate::cell::{Cell, Player, Position};
use crate::constants::{CELL_COUNT, WINNING_LINES};

/// 按固定连线顺序寻找三子连线的玩家
///
/// `owners` 为行优先的 9 个归属，`None` 视为空位，不参与连线
pub(crate) fn line_winner(owners: &[Option<Player>; 9]) -> Option<Player> {
    WINNING_LINES.iter().find_map(|&[a, b, c]| match owners[a] {
        Some(player) if owners[b] == Some(player) && owners[c] == Some(player) => Some(player),
        _ => None,
    })
}

/// 子棋盘
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubBoard {
    /// 行优先的 9 个格子
    cells: [Cell; CELL_COUNT],
    /// 缓存的胜者，一旦确定不再改变
    winner: Option<Player>,
}

impl SubBoard {
    /// 创建空子棋盘
    pub fn new() -> Self {
        Self::default()
    }

    /// 由格子内容重建（用于快照恢复）
    pub(crate) fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        let mut board = Self { cells, winner: None };
        board.winner = line_winner(&board.owners());
        board
    }

    /// 在指定格子落子
    ///
    /// 格子已被占用时返回 `false` 且不改变状态。
    ///
    /// # Panics
    ///
    /// 坐标越界或子棋盘已分出胜负时 panic，这属于调用方的编程错误
    pub fn place(&mut self, cell: Position, player: Player) -> bool {
        assert!(cell.is_valid(), "cell out of range: {}", cell);
        assert!(
            self.winner.is_none(),
            "sub-board already decided in favour of {:?}",
            self.winner
        );

        let slot = &mut self.cells[cell.to_index()];
        if !slot.is_empty() {
            return false;
        }
        *slot = player.to_cell();

        self.winner = line_winner(&self.owners());
        true
    }

    /// 获取指定格子
    pub fn get(&self, cell: Position) -> Cell {
        if cell.is_valid() {
            self.cells[cell.to_index()]
        } else {
            Cell::Empty
        }
    }

    /// 全部格子（行优先）
    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// 胜者（行、列、主对角线、副对角线依次判断）
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// 是否已填满
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| !c.is_empty())
    }

    /// 是否已结束（填满或有胜者）
    pub fn is_over(&self) -> bool {
        self.is_full() || self.winner.is_some()
    }

    /// 所有空格子，行优先
    pub fn empty_cells(&self) -> Vec<Position> {
        Position::all()
            .filter(|pos| self.cells[pos.to_index()].is_empty())
            .collect()
    }

    /// 已落子数
    pub fn mark_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    fn owners(&self) -> [Option<Player>; CELL_COUNT] {
        self.cells.map(|c| c.player())
    }
}
