//! 大棋盘与回合状态机

use rand::Rng;
use tracing::{debug, info, trace};

use crate::cell::{Player, Position};
use crate::constants::SUB_BOARD_COUNT;
use crate::error::GameError;
use crate::moves::{LegalMoves, Move, PlayedMove};
use crate::sub_board::{line_winner, SubBoard};

/// 对局阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// 玩家需要指定子棋盘和格子
    Playing(Player),
    /// 玩家需要为对手选择下一步的子棋盘
    Choosing(Player),
    /// 对局结束（None 为平局）
    GameOver(Option<Player>),
}

/// 大棋盘
///
/// 持有 9 个子棋盘、走子方、选盘标记、合法走法集合、走法历史和缓存的总胜者。
/// 只能通过 [`SuperBoard::apply_move`] 修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBoard {
    /// 行优先的子棋盘
    pub(crate) boards: [SubBoard; SUB_BOARD_COUNT],
    /// 先手方
    pub(crate) start: Player,
    /// 当前走子方
    pub(crate) turn: Player,
    /// 当前走子方是否在为对手选盘
    pub(crate) choosing: bool,
    /// 当前局面下的全部合法走法
    pub(crate) legal_moves: LegalMoves,
    /// 走法历史
    pub(crate) history: Vec<PlayedMove>,
    /// 缓存的总胜者
    pub(crate) winner: Option<Player>,
}

impl SuperBoard {
    /// 创建新对局，先手方由随机数源决定
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let start = if rng.gen_bool(0.5) { Player::O } else { Player::X };
        Self::with_starting_player(start)
    }

    /// 以指定先手方创建新对局
    pub fn with_starting_player(start: Player) -> Self {
        let mut board = Self {
            boards: Default::default(),
            start,
            turn: start,
            choosing: false,
            legal_moves: LegalMoves::new(),
            history: Vec::new(),
            winner: None,
        };
        board.legal_moves = board.open_board_moves();
        board
    }

    /// 从先手方和走法序列复盘
    ///
    /// 任何一步非法都会使整个复盘失败
    pub fn replay<I>(start: Player, moves: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = Move>,
    {
        let mut board = Self::with_starting_player(start);
        for (index, mv) in moves.into_iter().enumerate() {
            if !mv.is_valid() {
                return Err(GameError::ReplayFailed { index, mv });
            }
            if let Err(e) = board.apply_move(mv) {
                debug!(index, %mv, error = %e, "复盘失败");
                return Err(GameError::ReplayFailed { index, mv });
            }
        }
        Ok(board)
    }

    /// 执行走法
    ///
    /// 非法走法返回错误且不改变任何状态。选盘阶段只使用走法中的子棋盘位置，
    /// 格子被替换为该子棋盘的第一个空格。
    ///
    /// # Panics
    ///
    /// 坐标越界时 panic
    pub fn apply_move(&mut self, mv: Move) -> Result<(), GameError> {
        assert!(mv.is_valid(), "move out of range: {}", mv);

        if self.is_over() {
            trace!(%mv, "对局已结束，忽略走法");
            return Err(GameError::GameOver);
        }

        if self.choosing {
            return self.choose_board(mv);
        }

        if !self.legal_moves.contains(&mv) {
            trace!(%mv, turn = %self.turn, "非法走法");
            return Err(GameError::IllegalMove { mv });
        }

        let player = self.turn;
        let placed = self.boards[mv.board.to_index()].place(mv.cell, player);
        debug_assert!(placed, "legal move targeted an occupied cell");
        self.history.push(PlayedMove::place(player, mv));
        self.refresh_winner();

        if self.is_over() {
            self.legal_moves.clear();
            info!(winner = ?self.winner, moves = self.history.len(), "对局结束");
        } else {
            // 对手被送往与刚落子格子位置对应的子棋盘
            self.derive_legal_moves(mv.cell);
        }

        debug!(%mv, %player, next = %self.turn, choosing = self.choosing, "落子");
        Ok(())
    }

    /// 选盘：只改变走子方和可选范围，不落子
    fn choose_board(&mut self, mv: Move) -> Result<(), GameError> {
        let Some(&placeholder) = self.legal_moves.cells(mv.board).first() else {
            trace!(%mv, "选择了不可选的子棋盘");
            return Err(GameError::IllegalMove { mv });
        };

        let player = self.turn;
        self.history.push(PlayedMove::choose(player, Move::at(mv.board, placeholder)));
        self.derive_legal_moves(mv.board);

        debug!(board = %mv.board, %player, next = %self.turn, "选盘");
        Ok(())
    }

    /// 根据目标子棋盘推导新的合法走法和走子方
    ///
    /// 目标已结束时可在任意未结束的子棋盘落子；若目标的胜者正是当前走子方，
    /// 该玩家进入选盘阶段且走子方不变
    fn derive_legal_moves(&mut self, target: Position) {
        let sub = &self.boards[target.to_index()];

        if sub.is_over() {
            self.choosing = sub.winner() == Some(self.turn);
            self.legal_moves = self.open_board_moves();
        } else {
            self.choosing = false;
            self.legal_moves = LegalMoves::only(target, sub.empty_cells());
        }

        if !self.choosing {
            self.turn = self.turn.opponent();
        }
    }

    /// 所有未结束子棋盘的空格
    fn open_board_moves(&self) -> LegalMoves {
        let mut moves = LegalMoves::new();
        for pos in Position::all() {
            let sub = &self.boards[pos.to_index()];
            if !sub.is_over() {
                moves.set(pos, sub.empty_cells());
            }
        }
        moves
    }

    /// 重新判断总胜者（已确定时不再改变）
    pub(crate) fn refresh_winner(&mut self) {
        if self.winner.is_some() {
            return;
        }

        let owners = self.sub_board_winners();
        if let Some(player) = line_winner(&owners) {
            self.winner = Some(player);
            return;
        }

        // 全部子棋盘结束且无连线时，按赢下的子棋盘数判定
        if self.boards.iter().all(SubBoard::is_over) {
            let x_wins = owners.iter().filter(|w| **w == Some(Player::X)).count();
            let o_wins = owners.iter().filter(|w| **w == Some(Player::O)).count();
            self.winner = match x_wins.cmp(&o_wins) {
                std::cmp::Ordering::Greater => Some(Player::X),
                std::cmp::Ordering::Less => Some(Player::O),
                std::cmp::Ordering::Equal => None,
            };
        }
    }

    /// 全部子棋盘
    pub fn boards(&self) -> &[SubBoard; SUB_BOARD_COUNT] {
        &self.boards
    }

    /// 指定位置的子棋盘
    ///
    /// # Panics
    ///
    /// 位置越界时 panic
    pub fn sub_board(&self, board: Position) -> &SubBoard {
        assert!(board.is_valid(), "board out of range: {}", board);
        &self.boards[board.to_index()]
    }

    /// 各子棋盘的胜者（行优先）
    pub fn sub_board_winners(&self) -> [Option<Player>; SUB_BOARD_COUNT] {
        std::array::from_fn(|i| self.boards[i].winner())
    }

    /// 先手方
    pub fn starting_player(&self) -> Player {
        self.start
    }

    /// 当前走子方
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// 当前合法走法
    pub fn legal_moves(&self) -> &LegalMoves {
        &self.legal_moves
    }

    /// 是否处于选盘阶段
    pub fn is_choosing(&self) -> bool {
        self.choosing
    }

    /// 走法历史
    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    /// 总胜者
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// 对局是否结束
    pub fn is_over(&self) -> bool {
        self.winner.is_some() || self.boards.iter().all(SubBoard::is_over)
    }

    /// 当前阶段
    pub fn state(&self) -> GameState {
        if self.is_over() {
            GameState::GameOver(self.winner)
        } else if self.choosing {
            GameState::Choosing(self.turn)
        } else {
            GameState::Playing(self.turn)
        }
    }
}

impl Default for SuperBoard {
    fn default() -> Self {
        Self::with_starting_player(Player::X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pos(row: u8, col: u8) -> Position {
        Position::new_unchecked(row, col)
    }

    fn mv(big_row: u8, big_col: u8, row: u8, col: u8) -> Move {
        Move::new(big_row, big_col, row, col).unwrap()
    }

    fn won_by(player: Player) -> SubBoard {
        let mut cells = [Cell::Empty; 9];
        cells[0] = player.to_cell();
        cells[1] = player.to_cell();
        cells[2] = player.to_cell();
        SubBoard::from_cells(cells)
    }

    fn drawn() -> SubBoard {
        use Cell::{O, X};
        SubBoard::from_cells([X, O, X, X, O, O, O, X, X])
    }

    /// X 在子棋盘 0 的第一行连成三子，最后一手落在 (0,0)，目标正是子棋盘 0
    fn board_after_x_wins_corner() -> SuperBoard {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.apply_move(mv(0, 0, 0, 1)).unwrap();
        board.apply_move(mv(0, 1, 0, 0)).unwrap();
        board.apply_move(mv(0, 0, 0, 2)).unwrap();
        board.apply_move(mv(0, 2, 0, 0)).unwrap();
        board.apply_move(mv(0, 0, 0, 0)).unwrap();
        board
    }

    #[test]
    fn test_initial_state() {
        let board = SuperBoard::with_starting_player(Player::O);

        assert_eq!(board.turn(), Player::O);
        assert_eq!(board.starting_player(), Player::O);
        assert!(!board.is_choosing());
        assert!(!board.is_over());
        assert_eq!(board.legal_moves().len(), 81);
        assert_eq!(board.legal_moves().boards().count(), 9);
        assert!(board.history().is_empty());
        assert_eq!(board.state(), GameState::Playing(Player::O));
    }

    #[test]
    fn test_random_starting_player_is_seeded() {
        let a = SuperBoard::new(&mut ChaCha8Rng::seed_from_u64(7));
        let b = SuperBoard::new(&mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a.turn(), b.turn());

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let starts: Vec<Player> = (0..32).map(|_| SuperBoard::new(&mut rng).turn()).collect();
        assert!(starts.contains(&Player::X));
        assert!(starts.contains(&Player::O));
    }

    #[test]
    fn test_center_of_center() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.apply_move(mv(1, 1, 1, 1)).unwrap();

        let legal = board.legal_moves();
        assert_eq!(legal.boards().collect::<Vec<_>>(), vec![pos(1, 1)]);
        assert_eq!(legal.cells(pos(1, 1)).len(), 8);
        assert!(!legal.cells(pos(1, 1)).contains(&pos(1, 1)));
        assert_eq!(board.turn(), Player::O);
        assert!(!board.is_choosing());
        assert_eq!(
            board.history(),
            &[PlayedMove::place(Player::X, mv(1, 1, 1, 1))]
        );
    }

    #[test]
    fn test_forced_board_follows_cell() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.apply_move(mv(0, 0, 2, 1)).unwrap();

        // 对手被送往索引 3*2+1 = 7 的子棋盘
        let legal = board.legal_moves();
        assert_eq!(legal.boards().collect::<Vec<_>>(), vec![pos(2, 1)]);
        assert_eq!(legal.cells_at(7).len(), 9);
        assert!(board.apply_move(mv(0, 0, 0, 0)).is_err());
        assert!(board.apply_move(mv(2, 1, 0, 0)).is_ok());
    }

    #[test]
    fn test_illegal_move_leaves_state_unchanged() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.apply_move(mv(1, 1, 0, 0)).unwrap();
        let before = board.clone();

        // 错误的子棋盘
        assert_eq!(
            board.apply_move(mv(2, 2, 0, 0)),
            Err(GameError::IllegalMove { mv: mv(2, 2, 0, 0) })
        );
        assert_eq!(board, before);

        // 已占用的格子
        board.apply_move(mv(0, 0, 1, 1)).unwrap();
        let before = board.clone();
        assert!(board.apply_move(mv(1, 1, 0, 0)).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_winning_sub_board_grants_choice() {
        let board = board_after_x_wins_corner();

        assert_eq!(board.sub_board(pos(0, 0)).winner(), Some(Player::X));
        assert!(board.is_choosing());
        assert_eq!(board.turn(), Player::X);
        assert_eq!(board.state(), GameState::Choosing(Player::X));

        // 可选范围为所有未结束的子棋盘
        let open: Vec<Position> = board.legal_moves().boards().collect();
        assert_eq!(open.len(), 8);
        assert!(!open.contains(&pos(0, 0)));
    }

    #[test]
    fn test_choosing_sends_opponent_to_board() {
        let mut board = board_after_x_wins_corner();
        let history_len = board.history().len();

        // 选盘时格子坐标被忽略
        board.apply_move(mv(1, 1, 2, 2)).unwrap();

        assert!(!board.is_choosing());
        assert_eq!(board.turn(), Player::O);
        assert_eq!(board.legal_moves().boards().collect::<Vec<_>>(), vec![pos(1, 1)]);
        assert_eq!(board.legal_moves().cells(pos(1, 1)).len(), 9);
        assert_eq!(board.history().len(), history_len + 1);

        let last = board.history().last().unwrap();
        assert!(last.choice);
        assert_eq!(last.player, Player::X);
        assert_eq!(last.cell, pos(0, 0));
        assert_eq!(board.sub_board(pos(1, 1)).mark_count(), 0);
    }

    #[test]
    fn test_choosing_decided_board_is_rejected() {
        let mut board = board_after_x_wins_corner();
        let before = board.clone();

        assert!(board.apply_move(mv(0, 0, 1, 1)).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_decided_target_without_own_win_flips_turn() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.boards[2] = won_by(Player::O);
        board.boards[5] = drawn();
        board.legal_moves = board.open_board_moves();

        board.derive_legal_moves(pos(0, 2));
        assert!(!board.is_choosing());
        assert_eq!(board.turn(), Player::O);
        assert_eq!(board.legal_moves().boards().count(), 7);

        board.derive_legal_moves(pos(1, 2));
        assert!(!board.is_choosing());
        assert_eq!(board.turn(), Player::X);
    }

    #[test]
    fn test_diagonal_of_sub_boards_wins() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.boards[0] = won_by(Player::O);
        board.boards[4] = won_by(Player::O);
        board.refresh_winner();
        assert_eq!(board.winner(), None);

        board.boards[8] = won_by(Player::O);
        board.refresh_winner();
        assert_eq!(board.winner(), Some(Player::O));
        assert!(board.is_over());
        assert_eq!(board.state(), GameState::GameOver(Some(Player::O)));
    }

    #[test]
    fn test_majority_decides_full_board() {
        // 没有连线：X 赢 0、5、7，O 赢 1、3，其余平局
        let mut board = SuperBoard::with_starting_player(Player::X);
        let layout = [
            won_by(Player::X), won_by(Player::O), drawn(),
            won_by(Player::O), drawn(), won_by(Player::X),
            drawn(), won_by(Player::X), drawn(),
        ];
        board.boards = layout;
        board.refresh_winner();
        assert_eq!(board.winner(), Some(Player::X));
    }

    #[test]
    fn test_majority_tie_is_draw() {
        let mut board = SuperBoard::with_starting_player(Player::X);
        board.boards = std::array::from_fn(|_| drawn());
        board.boards[0] = won_by(Player::X);
        board.boards[8] = won_by(Player::O);
        board.refresh_winner();

        assert!(board.is_over());
        assert_eq!(board.winner(), None);
        assert_eq!(board.state(), GameState::GameOver(None));
    }

    #[test]
    fn test_game_over_rejects_moves() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut board = SuperBoard::new(&mut rng);

        while !board.is_over() {
            let moves: Vec<Move> = board.legal_moves().iter().collect();
            let chosen = *moves.choose(&mut rng).unwrap();
            board.apply_move(chosen).unwrap();
        }

        assert!(board.legal_moves().is_empty());
        let before = board.clone();
        assert_eq!(board.apply_move(mv(0, 0, 0, 0)), Err(GameError::GameOver));
        assert_eq!(board, before);
    }

    #[test]
    fn test_every_legal_move_is_accepted() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for _ in 0..20 {
            let mut board = SuperBoard::new(&mut rng);
            while !board.is_over() {
                let moves: Vec<Move> = board.legal_moves().iter().collect();
                assert!(!moves.is_empty());
                for candidate in &moves {
                    let mut probe = board.clone();
                    probe.apply_move(*candidate).unwrap();
                    assert_eq!(probe.history().len(), board.history().len() + 1);
                }
                let chosen = *moves.choose(&mut rng).unwrap();
                board.apply_move(chosen).unwrap();
            }
        }
    }

    #[test]
    fn test_replay_rebuilds_game() {
        let original = board_after_x_wins_corner();
        let moves = original.history().iter().map(PlayedMove::mv);

        let replayed = SuperBoard::replay(Player::X, moves).unwrap();
        assert_eq!(replayed, original);
    }

    #[test]
    fn test_replay_rejects_illegal_move() {
        let moves = vec![mv(1, 1, 1, 1), mv(0, 0, 0, 0)];
        assert_eq!(
            SuperBoard::replay(Player::X, moves),
            Err(GameError::ReplayFailed { index: 1, mv: mv(0, 0, 0, 0) })
        );

        let out_of_range = vec![Move::at(pos(1, 1), pos(3, 3))];
        assert!(matches!(
            SuperBoard::replay(Player::X, out_of_range),
            Err(GameError::ReplayFailed { index: 0, .. })
        ));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_move_panics() {
        let mut board = SuperBoard::default();
        let _ = board.apply_move(Move::at(pos(0, 0), pos(0, 5)));
    }
}
