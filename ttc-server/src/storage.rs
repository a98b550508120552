//! 棋谱存储
//!
//! 棋谱以 JSON 文件保存在数据目录下

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use protocol::{GameRecord, GameResult};
use tracing::{info, warn};

/// 存储管理器
pub struct StorageManager {
    saves_dir: PathBuf,
}

impl StorageManager {
    /// 使用默认目录创建存储管理器
    pub fn new() -> Result<Self> {
        Self::with_dir(get_saves_directory()?)
    }

    /// 使用指定目录创建存储管理器
    pub fn with_dir(saves_dir: impl Into<PathBuf>) -> Result<Self> {
        let saves_dir = saves_dir.into();
        if !saves_dir.exists() {
            fs::create_dir_all(&saves_dir)
                .with_context(|| format!("无法创建存储目录: {:?}", saves_dir))?;
        }
        Ok(Self { saves_dir })
    }

    /// 保存棋谱，返回文件名
    pub fn save_record(&self, record: &mut GameRecord) -> Result<String> {
        let timestamp = Utc::now();
        let filename = generate_filename(
            &timestamp,
            &record.metadata.player_x,
            &record.metadata.player_o,
        );
        let filepath = self.saves_dir.join(&filename);

        record.saved_at = Some(timestamp);

        let json_content = record.to_json().context("序列化棋谱失败")?;
        fs::write(&filepath, json_content)
            .with_context(|| format!("写入文件失败: {:?}", filepath))?;

        info!(file = %filename, moves = record.moves.len(), "棋谱已保存");
        Ok(filename)
    }

    /// 加载棋谱
    pub fn load_record(&self, game_id: &str) -> Result<GameRecord> {
        let filepath = self.saves_dir.join(game_id);

        if !filepath.exists() {
            anyhow::bail!("棋谱文件不存在: {}", game_id);
        }

        let content = fs::read_to_string(&filepath)
            .with_context(|| format!("读取文件失败: {:?}", filepath))?;

        GameRecord::from_json(&content).context("解析棋谱文件失败")
    }

    /// 列出所有保存的棋谱，最新的在前
    pub fn list_saved_games(&self) -> Result<Vec<SavedGameInfo>> {
        let mut games = Vec::new();

        if !self.saves_dir.exists() {
            return Ok(games);
        }

        let entries = fs::read_dir(&self.saves_dir)
            .with_context(|| format!("读取存储目录失败: {:?}", self.saves_dir))?;

        for entry in entries {
            let entry = entry.context("读取目录项失败")?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.load_record(filename) {
                Ok(record) => games.push(SavedGameInfo {
                    game_id: filename.to_string(),
                    player_x: record.metadata.player_x,
                    player_o: record.metadata.player_o,
                    result: record.metadata.result,
                    saved_at: record.saved_at.unwrap_or_else(|| {
                        // 使用文件修改时间作为后备
                        entry
                            .metadata()
                            .and_then(|m| m.modified())
                            .map(DateTime::from)
                            .unwrap_or_else(|_| Utc::now())
                    }),
                    move_count: record.moves.len(),
                }),
                Err(e) => warn!(file = %filename, "跳过损坏的棋谱: {:#}", e),
            }
        }

        games.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(games)
    }

    /// 删除保存的棋谱
    pub fn delete_record(&self, game_id: &str) -> Result<()> {
        let filepath = self.saves_dir.join(game_id);

        if filepath.exists() {
            fs::remove_file(&filepath)
                .with_context(|| format!("删除文件失败: {:?}", filepath))?;
        }

        Ok(())
    }

    /// 获取存储目录路径
    pub fn saves_directory(&self) -> &Path {
        &self.saves_dir
    }
}

/// 保存的棋谱信息
#[derive(Debug, Clone)]
pub struct SavedGameInfo {
    /// 棋谱 ID（文件名）
    pub game_id: String,
    pub player_x: String,
    pub player_o: String,
    pub result: Option<GameResult>,
    pub saved_at: DateTime<Utc>,
    pub move_count: usize,
}

/// 获取跨平台存储目录
fn get_saves_directory() -> Result<PathBuf> {
    let app_data_dir = dirs::data_dir().context("无法获取应用数据目录")?;

    Ok(app_data_dir.join("tictacception").join("saves"))
}

/// 生成文件名
fn generate_filename(timestamp: &DateTime<Utc>, player_x: &str, player_o: &str) -> String {
    let timestamp_str = timestamp.format("%Y%m%d_%H%M%S%3f").to_string();

    format!(
        "{}_{}vs{}.json",
        timestamp_str,
        sanitize_filename(player_x),
        sanitize_filename(player_o)
    )
}

/// 清理文件名中的特殊字符
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
