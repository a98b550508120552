//! `ttc`：超级井字棋命令行
//!
//! - `ttc play` - 终端对局（双人或人机）
//! - `ttc generate` - 随机自对弈生成棋局
//! - `ttc features` - 从生成的棋局提取训练样本
//! - `ttc replay` - 复盘棋谱
//! - `ttc list` - 列出保存的棋谱

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use protocol::{GameRecord, Player};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ttc_ai::{extract_all, GameGenerator, GeneratedGame, GeneratorConfig};
use ttc_server::{terminal, AiOpponent, GameHost, GameOptions, Settings, StorageManager};

/// 超级井字棋（Tic-Tac-Ception）
#[derive(Parser)]
#[command(name = "ttc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 设置文件路径（默认在配置目录下）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 在终端下一局
    Play {
        /// 与 AI 对局
        #[arg(long)]
        ai: bool,
        /// 随机种子
        #[arg(long)]
        seed: Option<u64>,
        /// 对局结束后保存棋谱
        #[arg(long)]
        save: bool,
    },
    /// 随机自对弈生成棋局
    Generate {
        /// 棋局数量
        #[arg(short = 'n', long = "num", default_value_t = 10)]
        num: usize,
        /// 输出文件（默认输出到标准输出）
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// 随机种子
        #[arg(long)]
        seed: Option<u64>,
        /// 进度输出间隔（百分比）
        #[arg(short, long, default_value_t = 5.0)]
        pct: f64,
    },
    /// 从生成的棋局中提取训练样本
    Features {
        /// `generate` 输出的棋局文件
        input: PathBuf,
        /// 输出文件（默认只打印摘要）
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// 复盘棋谱文件，显示最终局面
    Replay {
        /// 棋谱文件路径或已保存棋谱的 ID
        file: PathBuf,
    },
    /// 列出保存的棋谱
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&settings.log_filter))
                .context("无效的日志过滤规则")?,
        )
        .init();

    match cli.command {
        Commands::Play { ai, seed, save } => run_play(&settings, ai, seed, save).await,
        Commands::Generate {
            num,
            out,
            seed,
            pct,
        } => run_generate(num, out.as_deref(), seed.or(settings.seed), pct),
        Commands::Features { input, out } => run_features(&input, out.as_deref()),
        Commands::Replay { file } => run_replay(&settings, &file),
        Commands::List => run_list(&settings),
    }
}

fn open_storage(settings: &Settings) -> Result<StorageManager> {
    match &settings.saves_dir {
        Some(dir) => StorageManager::with_dir(dir),
        None => StorageManager::new(),
    }
}

async fn run_play(settings: &Settings, ai: bool, seed: Option<u64>, save: bool) -> Result<()> {
    let host = GameHost::new();
    let options = GameOptions {
        ai: ai.then_some(AiOpponent {
            mode: settings.ai_mode,
            player: settings.ai_player,
        }),
        seed: seed.or(settings.seed),
        start: None,
    };
    let id = host.create_game(options).await?.id;

    let board = host.board(id).await?;
    println!("玩家 {} 先手", board.starting_player());
    if ai {
        println!("AI 执 {}", settings.ai_player);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let board = host.board(id).await?;
        println!("\n{}", terminal::render(&board));
        if let Some(result) = terminal::describe_result(&board) {
            println!("{}", result);
            break;
        }

        print!("{}", terminal::prompt(&board));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            warn!("输入结束，对局未完成");
            return Ok(());
        };

        let mv = match terminal::parse_input(&line, board.is_choosing()) {
            Ok(mv) => mv,
            Err(e) => {
                println!("无效输入: {}", e);
                continue;
            }
        };
        if let Err(e) = host.play(id, mv).await {
            println!("无效走法: {}", e);
        }
    }

    if save {
        let (player_x, player_o) = match (ai, settings.ai_player) {
            (true, Player::X) => (format!("AI-{}", settings.ai_mode), settings.player_name.clone()),
            (true, Player::O) => (settings.player_name.clone(), format!("AI-{}", settings.ai_mode)),
            (false, _) => ("X".to_string(), "O".to_string()),
        };
        let mut record = host.export_record(id, player_x, player_o).await?;
        let storage = open_storage(settings)?;
        let game_id = storage.save_record(&mut record)?;
        println!("棋谱已保存: {}", storage.saves_directory().join(game_id).display());
    }

    Ok(())
}

fn run_generate(num: usize, out: Option<&Path>, seed: Option<u64>, pct: f64) -> Result<()> {
    let games = GameGenerator::new(GeneratorConfig {
        games: num,
        seed,
        progress_pct: pct,
    })
    .generate();

    let json = serde_json::to_string(&games).context("序列化棋局失败")?;
    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("写入文件失败: {:?}", path))?;
            info!(games = games.len(), "棋局已写入 {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_features(input: &Path, out: Option<&Path>) -> Result<()> {
    let content =
        std::fs::read_to_string(input).with_context(|| format!("读取文件失败: {:?}", input))?;
    let games: Vec<GeneratedGame> = serde_json::from_str(&content).context("解析棋局文件失败")?;
    let samples = extract_all(&games)?;

    match out {
        Some(path) => {
            let json = serde_json::to_string(&samples).context("序列化样本失败")?;
            std::fs::write(path, json).with_context(|| format!("写入文件失败: {:?}", path))?;
            info!(samples = samples.len(), "样本已写入 {:?}", path);
        }
        None => {
            println!("{} 局，{} 条样本", games.len(), samples.len());
            if let Some(sample) = samples.first() {
                println!("样本: {:?}", sample);
            }
        }
    }
    Ok(())
}

fn load_record(settings: &Settings, file: &Path) -> Result<GameRecord> {
    if file.exists() {
        let content =
            std::fs::read_to_string(file).with_context(|| format!("读取文件失败: {:?}", file))?;
        return GameRecord::from_json(&content).context("解析棋谱文件失败");
    }
    let game_id = file.to_string_lossy();
    open_storage(settings)?.load_record(&game_id)
}

fn run_replay(settings: &Settings, file: &Path) -> Result<()> {
    let board = load_record(settings, file)
        .and_then(|record| {
            let board = record.replay()?;
            print!("{}", record.to_play_by_play()?);
            Ok(board)
        })
        .context("无法加载棋局")?;

    println!("\n{}", terminal::render(&board));
    println!("{}", terminal::render_winners(&board));
    match terminal::describe_result(&board) {
        Some(result) => println!("{}", result),
        None => println!("对局未结束，轮到玩家 {}", board.turn()),
    }
    Ok(())
}

fn run_list(settings: &Settings) -> Result<()> {
    let storage = open_storage(settings)?;
    let games = storage.list_saved_games()?;

    if games.is_empty() {
        println!("没有保存的棋谱（{}）", storage.saves_directory().display());
        return Ok(());
    }

    for game in games {
        let result = match game.result {
            Some(result) => result.to_string(),
            None => "未完成".to_string(),
        };
        println!(
            "{}  {} vs {}  {} 步  {}  {}",
            game.saved_at.format("%Y-%m-%d %H:%M:%S"),
            game.player_x,
            game.player_o,
            game.move_count,
            result,
            game.game_id
        );
    }
    Ok(())
}
