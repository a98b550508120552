//! 规则常量定义

/// 棋盘边长（子棋盘和大棋盘都是 3x3）
pub const BOARD_SIZE: usize = 3;

/// 每个子棋盘的格子数
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 大棋盘中子棋盘的数量
pub const SUB_BOARD_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 整盘棋最多可落子数
pub const MAX_MARKS: usize = SUB_BOARD_COUNT * CELL_COUNT;

/// 快照格式版本号
pub const SNAPSHOT_VERSION: u8 = 1;

/// 胜利连线（行优先索引）
///
/// 顺序固定：三行、三列、主对角线、副对角线，先匹配者胜
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];
