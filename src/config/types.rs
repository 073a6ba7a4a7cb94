//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::application::session::NarrationOptions;
use crate::domain::voice::{VoiceHeuristics, DEFAULT_FEMALE_NAMES, DEFAULT_MALE_NAMES};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 合成引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 旁白会话配置
    #[serde(default)]
    pub narration: NarrationConfig,

    /// 音色角色解析配置
    #[serde(default)]
    pub voices: VoicesConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 合成引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// espeak-ng 可执行文件
    #[serde(default = "default_program")]
    pub program: String,

    /// 初始语速（每分钟词数）
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// 初始音量 (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// 初始音色
    #[serde(default = "default_voice")]
    pub voice: String,

    /// 语速下限
    #[serde(default = "default_min_rate")]
    pub min_rate: u32,

    /// 语速上限
    #[serde(default = "default_max_rate")]
    pub max_rate: u32,
}

fn default_program() -> String {
    "espeak-ng".to_string()
}

fn default_rate() -> u32 {
    175
}

fn default_volume() -> f32 {
    1.0
}

fn default_voice() -> String {
    "en".to_string()
}

fn default_min_rate() -> u32 {
    80
}

fn default_max_rate() -> u32 {
    450
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            rate: default_rate(),
            volume: default_volume(),
            voice: default_voice(),
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
        }
    }
}

/// 旁白会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// 朗读前去掉 `*`
    #[serde(default = "default_strip_asterisks")]
    pub strip_asterisks: bool,

    /// Worker 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_strip_asterisks() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    16
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            strip_asterisks: default_strip_asterisks(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl NarrationConfig {
    pub fn options(&self) -> NarrationOptions {
        NarrationOptions {
            strip_asterisks: self.strip_asterisks,
        }
    }
}

/// 音色角色解析配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoicesConfig {
    /// 男声名称片段
    #[serde(default = "default_male_names")]
    pub male_names: Vec<String>,

    /// 女声名称片段
    #[serde(default = "default_female_names")]
    pub female_names: Vec<String>,
}

fn default_male_names() -> Vec<String> {
    DEFAULT_MALE_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_female_names() -> Vec<String> {
    DEFAULT_FEMALE_NAMES.iter().map(|s| s.to_string()).collect()
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            male_names: default_male_names(),
            female_names: default_female_names(),
        }
    }
}

impl VoicesConfig {
    pub fn heuristics(&self) -> VoiceHeuristics {
        VoiceHeuristics {
            male_names: self.male_names.clone(),
            female_names: self.female_names.clone(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
