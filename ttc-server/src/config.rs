//! 设置
//!
//! 设置保存在 `<配置目录>/tictacception/settings.json`，文件缺失或无效时使用默认值

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use protocol::Player;
use serde::{Deserialize, Serialize};
use ttc_ai::AiMode;

/// 默认日志过滤规则
pub const DEFAULT_LOG_FILTER: &str = "ttc=info,ttc_server=info,ttc_ai=info,protocol=warn";

/// 程序设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 人机对局时 AI 的走法模式
    pub ai_mode: AiMode,
    /// AI 执哪一方
    pub ai_player: Player,
    /// 随机种子（None 为系统熵）
    pub seed: Option<u64>,
    /// 棋谱保存目录（None 为数据目录下的默认位置）
    pub saves_dir: Option<PathBuf>,
    /// 日志过滤规则（RUST_LOG 优先）
    pub log_filter: String,
    /// 本地玩家名
    pub player_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_mode: AiMode::Random,
            ai_player: Player::O,
            seed: None,
            saves_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            player_name: "玩家".to_string(),
        }
    }
}

impl Settings {
    /// 获取默认设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("tictacception");
            path.push("settings.json");
            path
        })
    }

    /// 从默认位置加载设置
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("无法获取配置目录，使用默认设置");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// 从指定文件加载设置
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("设置文件不存在，使用默认设置");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::info!("已加载设置: {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("设置文件格式无效: {}，使用默认设置", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("无法读取设置文件: {}，使用默认设置", e);
                Self::default()
            }
        }
    }

    /// 保存设置到默认位置
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().context("无法获取配置目录")?;
        self.save_to(&path)
    }

    /// 保存设置到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化设置失败")?;
        std::fs::write(path, content).with_context(|| format!("写入设置文件失败: {:?}", path))?;

        tracing::info!("设置已保存: {:?}", path);
        Ok(())
    }
}
