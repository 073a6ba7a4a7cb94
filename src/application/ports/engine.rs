//! Engine Port - 语音合成引擎抽象
//!
//! 会话状态机通过该接口设置属性、入队文本并等待朗读完成，
//! 具体实现在 infrastructure/adapters 层

use thiserror::Error;

use crate::domain::voice::{VoiceDescriptor, VoiceId};

/// 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid {property}: {reason}")]
    InvalidProperty {
        property: &'static str,
        reason: String,
    },

    #[error("Voice not found: {0}")]
    VoiceNotFound(VoiceId),

    #[error("Synthesis process failed: {0}")]
    ProcessFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_property(property: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            property,
            reason: reason.into(),
        }
    }
}

/// Engine Port
///
/// 同一个引擎实例同一时刻只能服务一个会话，调用方负责串行化访问。
pub trait EngineAdapter: Send {
    /// 引擎名称（用于日志）
    fn name(&self) -> &str {
        "engine"
    }

    /// 当前语速（引擎定义的单位，通常为每分钟词数）
    fn get_rate(&self) -> Result<u32, EngineError>;

    /// 当前音量
    fn get_volume(&self) -> Result<f32, EngineError>;

    /// 当前音色
    fn get_voice(&self) -> Result<VoiceId, EngineError>;

    fn set_rate(&mut self, rate: u32) -> Result<(), EngineError>;

    /// 超出引擎取值范围时返回 `InvalidProperty`
    fn set_volume(&mut self, volume: f32) -> Result<(), EngineError>;

    fn set_voice(&mut self, voice: &VoiceId) -> Result<(), EngineError>;

    /// 查询可用音色目录
    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, EngineError>;

    /// 按调用时生效的属性排队一段文本，不要求立即朗读
    fn enqueue_speech(&mut self, text: &str) -> Result<(), EngineError>;

    /// 按入队顺序朗读所有排队文本，阻塞直到完成
    fn flush_and_wait(&mut self) -> Result<(), EngineError>;
}
