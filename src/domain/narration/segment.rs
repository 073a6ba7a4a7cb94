//! Narration Context - 片段类型

use serde::Serialize;
use std::fmt;

/// 音色角色
///
/// 抽象选择器，由 VoiceResolution 映射到具体的引擎音色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceRole {
    Male,
    Female,
    Default,
}

impl VoiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for VoiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 词法片段
///
/// 要么是待朗读的文本，要么是改变合成状态的指令
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// 字面文本（原样保留）
    Text(String),
    /// `<rate=N>`
    SetRate(u32),
    /// `<volume=F>`
    SetVolume(f32),
    /// `<voice=male|female|default>`
    SelectVoice(VoiceRole),
    /// `<default>`：恢复语速和音量（不含音色）
    ResetDefaults,
}

impl Segment {
    pub fn is_directive(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{:?}", text),
            Self::SetRate(rate) => write!(f, "<rate={}>", rate),
            Self::SetVolume(volume) => write!(f, "<volume={}>", volume),
            Self::SelectVoice(role) => write!(f, "<voice={}>", role),
            Self::ResetDefaults => f.write_str("<default>"),
        }
    }
}

/// 带原始文本的片段
///
/// `raw` 是输入中对应的原始切片，所有 Token 的 `raw` 依次拼接即为原输入
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub segment: Segment,
    pub raw: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_directives() {
        assert_eq!(Segment::SetRate(200).to_string(), "<rate=200>");
        assert_eq!(Segment::SetVolume(0.5).to_string(), "<volume=0.5>");
        assert_eq!(
            Segment::SelectVoice(VoiceRole::Female).to_string(),
            "<voice=female>"
        );
        assert_eq!(Segment::ResetDefaults.to_string(), "<default>");
        assert_eq!(Segment::Text("hi".into()).to_string(), "\"hi\"");
    }

    #[test]
    fn test_is_directive() {
        assert!(!Segment::Text("a".into()).is_directive());
        assert!(Segment::ResetDefaults.is_directive());
    }
}
