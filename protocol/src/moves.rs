//! 走法与合法走法集合

use serde::{Deserialize, Serialize};

use crate::cell::{Player, Position};
use crate::constants::SUB_BOARD_COUNT;

/// 走法：(大行, 大列, 小行, 小列)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 子棋盘在大棋盘上的位置
    pub board: Position,
    /// 子棋盘内的格子
    pub cell: Position,
}

impl Move {
    /// 创建新走法（坐标越界时返回 None）
    pub fn new(big_row: u8, big_col: u8, row: u8, col: u8) -> Option<Self> {
        Some(Self {
            board: Position::new(big_row, big_col)?,
            cell: Position::new(row, col)?,
        })
    }

    /// 由两个位置组成走法
    pub fn at(board: Position, cell: Position) -> Self {
        Self { board, cell }
    }

    /// 坐标是否都在棋盘内
    pub fn is_valid(&self) -> bool {
        self.board.is_valid() && self.cell.is_valid()
    }

    /// 转换为 [大行, 大列, 小行, 小列]
    pub fn to_array(&self) -> [u8; 4] {
        [self.board.row, self.board.col, self.cell.row, self.cell.col]
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.board.row, self.board.col, self.cell.row, self.cell.col
        )
    }
}

/// 已执行的走法（历史记录条目）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayedMove {
    /// 走子方
    pub player: Player,
    /// 子棋盘位置
    pub board: Position,
    /// 格子位置（选盘走法中为该子棋盘第一个空格的占位）
    pub cell: Position,
    /// 是否为选盘走法（不落子，只指定对手下一步的子棋盘）
    #[serde(default)]
    pub choice: bool,
}

impl PlayedMove {
    /// 落子记录
    pub fn place(player: Player, mv: Move) -> Self {
        Self {
            player,
            board: mv.board,
            cell: mv.cell,
            choice: false,
        }
    }

    /// 选盘记录
    pub fn choose(player: Player, mv: Move) -> Self {
        Self {
            player,
            board: mv.board,
            cell: mv.cell,
            choice: true,
        }
    }

    /// 对应的走法
    pub fn mv(&self) -> Move {
        Move::at(self.board, self.cell)
    }
}

/// 合法走法集合
///
/// 以子棋盘索引（3 * 大行 + 大列）为下标，每项为该子棋盘内可落子的空格（行优先）。
/// 空列表表示该子棋盘不可选；全部为空表示当前没有合法走法
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegalMoves {
    boards: [Vec<Position>; SUB_BOARD_COUNT],
}

impl LegalMoves {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 只允许在一个子棋盘内落子
    pub fn only(board: Position, cells: Vec<Position>) -> Self {
        let mut moves = Self::new();
        moves.set(board, cells);
        moves
    }

    /// 设置某个子棋盘的可落子格子
    pub fn set(&mut self, board: Position, cells: Vec<Position>) {
        self.boards[board.to_index()] = cells;
    }

    /// 某个子棋盘的可落子格子（越界或不可选时为空）
    pub fn cells(&self, board: Position) -> &[Position] {
        if board.is_valid() {
            self.boards[board.to_index()].as_slice()
        } else {
            &[]
        }
    }

    /// 按索引获取某个子棋盘的可落子格子
    pub fn cells_at(&self, index: usize) -> &[Position] {
        self.boards.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 子棋盘是否可选
    pub fn has_board(&self, board: Position) -> bool {
        !self.cells(board).is_empty()
    }

    /// 走法是否合法
    pub fn contains(&self, mv: &Move) -> bool {
        self.cells(mv.board).contains(&mv.cell)
    }

    /// 所有可选的子棋盘
    pub fn boards(&self) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(move |b| self.has_board(*b))
    }

    /// 遍历所有合法走法
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.boards()
            .flat_map(move |b| self.cells(b).iter().map(move |&cell| Move::at(b, cell)))
    }

    /// 合法走法数量
    pub fn len(&self) -> usize {
        self.boards.iter().map(Vec::len).sum()
    }

    /// 是否没有任何合法走法
    pub fn is_empty(&self) -> bool {
        self.boards.iter().all(Vec::is_empty)
    }

    /// 清空
    pub fn clear(&mut self) {
        for cells in &mut self.boards {
            cells.clear();
        }
    }

    /// 转换为按子棋盘索引排列的列表
    pub fn to_vec(&self) -> Vec<Vec<Position>> {
        self.boards.to_vec()
    }
}
