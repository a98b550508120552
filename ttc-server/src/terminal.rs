//! 终端界面
//!
//! 棋盘绘制与输入解析

use protocol::{GameError, Move, Notation, Position, SuperBoard, BOARD_SIZE};

/// 子棋盘之间的竖线
const BOARD_GAP: &str = "  ||  ";

/// 绘制大棋盘，合法落点标为 `*`
pub fn render(board: &SuperBoard) -> String {
    let legal = board.legal_moves();
    let size = BOARD_SIZE as u8;
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(BOARD_SIZE);

    for big_row in 0..size {
        let band = (0..size)
            .map(|row| {
                (0..size)
                    .map(|big_col| {
                        let board_pos = Position::new_unchecked(big_row, big_col);
                        let sub = board.sub_board(board_pos);
                        (0..size)
                            .map(|col| {
                                let cell = Position::new_unchecked(row, col);
                                if legal.cells(board_pos).contains(&cell) {
                                    '*'
                                } else {
                                    sub.get(cell).to_char()
                                }
                            })
                            .map(String::from)
                            .collect::<Vec<_>>()
                            .join(" | ")
                    })
                    .collect::<Vec<_>>()
                    .join(BOARD_GAP)
            })
            .collect();
        rows.push(band);
    }

    let width = rows[0][0].chars().count();
    let thin = format!("\n{}\n", "-".repeat(width));
    let thick = format!("\n{}\n", "=".repeat(width));
    let bands: Vec<String> = rows.iter().map(|band| band.join(thin.as_str())).collect();

    let mut out = bands.join(thick.as_str());
    out.push('\n');
    out
}

/// 子棋盘胜负一览（3x3）
pub fn render_winners(board: &SuperBoard) -> String {
    board
        .sub_board_winners()
        .chunks(BOARD_SIZE)
        .map(|row| {
            row.iter()
                .map(|w| w.map_or('.', |p| p.to_char()).to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 当前回合的提示
pub fn prompt(board: &SuperBoard) -> String {
    if board.is_choosing() {
        format!("玩家 {} 赢下子棋盘，请为对手选择子棋盘 (x,y)：", board.turn())
    } else {
        format!("玩家 {} 请落子 (x,y,i,j)：", board.turn())
    }
}

/// 对局结果描述
pub fn describe_result(board: &SuperBoard) -> Option<String> {
    if !board.is_over() {
        return None;
    }
    Some(match board.winner() {
        Some(player) => format!("玩家 {} 获胜！", player),
        None => "平局！".to_string(),
    })
}

/// 解析一行输入
///
/// 选盘阶段只需输入子棋盘坐标 "x,y"
pub fn parse_input(line: &str, choosing: bool) -> Result<Move, GameError> {
    let line = line.trim();
    if choosing && line.split(',').count() == 2 {
        return Notation::parse(&format!("{},0,0", line));
    }
    Notation::parse(line)
}
