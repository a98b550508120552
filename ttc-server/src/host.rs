//! 对局托管
//!
//! 每局棋持有独立的锁，同一局的所有操作串行执行，不同对局互不阻塞

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use protocol::{GameError, GameRecord, GameState, Move, Player, Snapshot, SuperBoard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use ttc_ai::{AiMode, MoveSelector};

/// 对局 ID
pub type GameId = u64;

/// 托管错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("It is the AI's turn ({0})")]
    NotYourTurn(Player),

    #[error("No move available")]
    NoMove,

    #[error(transparent)]
    Game(#[from] GameError),
}

pub type Result<T> = std::result::Result<T, HostError>;

/// AI 对手设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiOpponent {
    pub mode: AiMode,
    pub player: Player,
}

/// 创建对局的选项
#[derive(Debug, Clone, Default)]
pub struct GameOptions {
    /// AI 对手（None 为双人对局）
    pub ai: Option<AiOpponent>,
    /// 随机种子，决定先手和 AI 走法
    pub seed: Option<u64>,
    /// 指定先手（None 为随机）
    pub start: Option<Player>,
}

/// 对局概览
#[derive(Debug, Clone, PartialEq)]
pub struct GameView {
    pub id: GameId,
    pub state: GameState,
    pub turn: Player,
    pub choosing: bool,
    pub winner: Option<Player>,
    pub legal_moves: Vec<Move>,
    pub moves_played: usize,
    pub ai_player: Option<Player>,
    pub created_at: DateTime<Utc>,
}

struct HostedAi {
    mode: AiMode,
    player: Player,
    selector: Box<dyn MoveSelector + Send>,
}

/// 托管中的一局棋
struct HostedGame {
    board: SuperBoard,
    ai: Option<HostedAi>,
    created_at: DateTime<Utc>,
}

impl HostedGame {
    fn new(board: SuperBoard, options: &GameOptions) -> Self {
        // AI 与先手抽签使用不同的随机流
        let ai_seed = options.seed.map(|s| s.wrapping_add(1));
        let ai = options.ai.map(|ai| HostedAi {
            mode: ai.mode,
            player: ai.player,
            selector: ai.mode.selector(ai_seed),
        });
        Self {
            board,
            ai,
            created_at: Utc::now(),
        }
    }

    fn is_ai_turn(&self) -> bool {
        !self.board.is_over()
            && matches!(&self.ai, Some(ai) if ai.player == self.board.turn())
    }

    /// AI 连续走子，直到轮到对手或对局结束
    ///
    /// AI 赢下子棋盘后仍由它选盘，因此一次可能走两步
    fn run_ai(&mut self) -> Result<usize> {
        let mut played = 0;
        while self.is_ai_turn() {
            let Some(ai) = self.ai.as_mut() else { break };
            let mv = ai.selector.select_move(&self.board).ok_or(HostError::NoMove)?;
            self.board.apply_move(mv)?;
            debug!(%mv, player = %ai.player, "AI 走子");
            played += 1;
        }
        Ok(played)
    }

    fn view(&self, id: GameId) -> GameView {
        GameView {
            id,
            state: self.board.state(),
            turn: self.board.turn(),
            choosing: self.board.is_choosing(),
            winner: self.board.winner(),
            legal_moves: self.board.legal_moves().iter().collect(),
            moves_played: self.board.history().len(),
            ai_player: self.ai.as_ref().map(|ai| ai.player),
            created_at: self.created_at,
        }
    }
}

/// 对局托管器
pub struct GameHost {
    games: RwLock<HashMap<GameId, Arc<Mutex<HostedGame>>>>,
    next_id: AtomicU64,
}

impl GameHost {
    pub fn new() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn generate_id(&self) -> GameId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn game(&self, id: GameId) -> Result<Arc<Mutex<HostedGame>>> {
        self.games
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(HostError::GameNotFound(id))
    }

    /// 登记一局棋；轮到 AI 时立即走子
    async fn register(&self, board: SuperBoard, options: &GameOptions) -> Result<GameView> {
        let mut game = HostedGame::new(board, options);
        game.run_ai()?;

        let id = self.generate_id();
        let view = game.view(id);
        self.games.write().await.insert(id, Arc::new(Mutex::new(game)));
        Ok(view)
    }

    /// 创建新对局
    pub async fn create_game(&self, options: GameOptions) -> Result<GameView> {
        let board = match (options.start, options.seed) {
            (Some(start), _) => SuperBoard::with_starting_player(start),
            (None, Some(seed)) => SuperBoard::new(&mut StdRng::seed_from_u64(seed)),
            (None, None) => SuperBoard::new(&mut rand::thread_rng()),
        };
        let start = board.starting_player();
        let view = self.register(board, &options).await?;
        info!(id = view.id, %start, ai = ?view.ai_player, "创建对局");
        Ok(view)
    }

    /// 玩家走子，之后若轮到 AI 则由 AI 接着走
    pub async fn play(&self, id: GameId, mv: Move) -> Result<GameView> {
        let game = self.game(id).await?;
        let mut game = game.lock().await;

        if game.is_ai_turn() {
            return Err(HostError::NotYourTurn(game.board.turn()));
        }
        game.board.apply_move(mv)?;
        game.run_ai()?;

        let view = game.view(id);
        if let GameState::GameOver(winner) = view.state {
            info!(id, ?winner, moves = view.moves_played, "对局结束");
        }
        Ok(view)
    }

    /// 替当前走子方走一步
    ///
    /// 有 AI 对手时使用它的选手，否则随机走子
    pub async fn ai_move(&self, id: GameId) -> Result<GameView> {
        let game = self.game(id).await?;
        let mut game = game.lock().await;
        let game = &mut *game;

        let mv = match game.ai.as_mut() {
            Some(ai) => ai.selector.select_move(&game.board),
            None => AiMode::Random.selector(None).select_move(&game.board),
        }
        .ok_or(HostError::NoMove)?;
        game.board.apply_move(mv)?;
        debug!(id, %mv, "代为走子");

        Ok(game.view(id))
    }

    /// 获取对局概览
    pub async fn view(&self, id: GameId) -> Result<GameView> {
        let game = self.game(id).await?;
        let game = game.lock().await;
        Ok(game.view(id))
    }

    /// 获取棋盘副本
    pub async fn board(&self, id: GameId) -> Result<SuperBoard> {
        let game = self.game(id).await?;
        let game = game.lock().await;
        Ok(game.board.clone())
    }

    /// 导出快照
    pub async fn snapshot(&self, id: GameId) -> Result<Snapshot> {
        let game = self.game(id).await?;
        let game = game.lock().await;
        Ok(game.board.to_snapshot())
    }

    /// 从快照恢复一局棋
    pub async fn restore(&self, snapshot: Snapshot, options: GameOptions) -> Result<GameView> {
        let board = SuperBoard::from_snapshot(snapshot)?;
        let view = self.register(board, &options).await?;
        info!(id = view.id, moves = view.moves_played, "从快照恢复对局");
        Ok(view)
    }

    /// 从棋谱复盘一局棋，复盘失败时不登记
    pub async fn load_record(&self, record: &GameRecord, options: GameOptions) -> Result<GameView> {
        let board = record.replay()?;
        let view = self.register(board, &options).await?;
        info!(id = view.id, moves = view.moves_played, "从棋谱加载对局");
        Ok(view)
    }

    /// 导出棋谱
    pub async fn export_record(
        &self,
        id: GameId,
        player_x: String,
        player_o: String,
    ) -> Result<GameRecord> {
        let game = self.game(id).await?;
        let game = game.lock().await;

        let mut record = GameRecord::from_board(&game.board, player_x, player_o);
        if let Some(ai) = &game.ai {
            record.set_ai_mode(ai.mode.as_str());
        }
        Ok(record)
    }

    /// 移除对局
    pub async fn remove(&self, id: GameId) -> bool {
        let removed = self.games.write().await.remove(&id).is_some();
        if removed {
            debug!(id, "移除对局");
        }
        removed
    }

    /// 列出所有对局 ID（升序）
    pub async fn list(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self.games.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for GameHost {
    fn default() -> Self {
        Self::new()
    }
}
