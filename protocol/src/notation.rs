//! 走法记号
//!
//! 文本格式为 `x,y,i,j`：(x, y) 为子棋盘在大棋盘上的行列，(i, j) 为子棋盘内格子的行列。
//! 例如 `1,1,1,1` 表示中央子棋盘的中心格

use crate::error::GameError;
use crate::moves::Move;

/// 走法记号处理
pub struct Notation;

impl Notation {
    /// 生成记号
    pub fn format(mv: &Move) -> String {
        mv.to_string()
    }

    /// 解析记号
    pub fn parse(input: &str) -> Result<Move, GameError> {
        let fail = |reason: &str| GameError::InvalidNotation {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = input.trim().split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(fail("expected four comma-separated numbers"));
        }

        let mut coords = [0u8; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| fail("not a number"))?;
        }

        let [big_row, big_col, row, col] = coords;
        Move::new(big_row, big_col, row, col).ok_or_else(|| fail("coordinates must be 0, 1 or 2"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let mv = Notation::parse("1,2,0,1").unwrap();
        assert_eq!(mv, Move::new(1, 2, 0, 1).unwrap());

        // 允许空白
        let mv = Notation::parse(" 0, 0 ,2,2 \n").unwrap();
        assert_eq!(mv, Move::new(0, 0, 2, 2).unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Notation::parse("1,1,1"),
            Err(GameError::InvalidNotation { .. })
        ));
        assert!(Notation::parse("a,1,1,1").is_err());
        assert!(Notation::parse("1,1,1,3").is_err());
        assert!(Notation::parse("-1,1,1,1").is_err());
        assert!(Notation::parse("").is_err());
    }

    #[test]
    fn test_format_matches_parse() {
        let mv = Move::new(2, 0, 1, 2).unwrap();
        assert_eq!(Notation::format(&mv), "2,0,1,2");
        assert_eq!(Notation::parse(&Notation::format(&mv)).unwrap(), mv);
    }
}
