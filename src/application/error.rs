//! 应用层错误定义
//!
//! 词法分析不会失败，音色角色未解析也不是错误；
//! 唯一向外传播的是引擎调用失败导致的 SynthesisError

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::application::ports::EngineError;

/// 失败发生的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    SetRate,
    SetVolume,
    SetVoice,
    Enqueue,
    Flush,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SetRate => "set_rate",
            Self::SetVolume => "set_volume",
            Self::SetVoice => "set_voice",
            Self::Enqueue => "enqueue",
            Self::Flush => "flush",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 合成错误
///
/// 发生后立即中止当前会话剩余片段的处理
#[derive(Debug, Error)]
#[error("Synthesis failed at {stage}: {cause}")]
pub struct SynthesisError {
    pub stage: Stage,
    #[source]
    pub cause: EngineError,
}

impl SynthesisError {
    pub fn new(stage: Stage, cause: EngineError) -> Self {
        Self { stage, cause }
    }

    /// 用于 `map_err`
    pub fn at(stage: Stage) -> impl FnOnce(EngineError) -> Self {
        move |cause| Self::new(stage, cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_message_and_source() {
        let err = SynthesisError::new(
            Stage::SetVolume,
            EngineError::invalid_property("volume", "1.5 is outside 0.0..=1.0"),
        );
        assert_eq!(
            err.to_string(),
            "Synthesis failed at set_volume: Invalid volume: 1.5 is outside 0.0..=1.0"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_at_helper() {
        let result: Result<(), EngineError> = Err(EngineError::ProcessFailed("exit 1".into()));
        let err = result.map_err(SynthesisError::at(Stage::Flush)).unwrap_err();
        assert_eq!(err.stage, Stage::Flush);
    }
}
