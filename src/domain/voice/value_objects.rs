//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

/// 引擎音色句柄
///
/// 由引擎定义的不透明标识，核心只做比较和透传
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VoiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 引擎声明的音色性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
    Unknown,
}

impl VoiceGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }
}

/// 音色描述
///
/// 由引擎在查询音色目录时提供，核心只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub id: VoiceId,
    pub name: String,
    /// 引擎未声明时为 None
    pub gender: Option<VoiceGender>,
    pub age: Option<u32>,
    pub languages: Vec<String>,
}

impl VoiceDescriptor {
    pub fn new(id: impl Into<VoiceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender: None,
            age: None,
            languages: Vec::new(),
        }
    }

    pub fn with_gender(mut self, gender: VoiceGender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let voice = VoiceDescriptor::new("en-gb", "English (Great Britain)")
            .with_gender(VoiceGender::Male)
            .with_age(30)
            .with_languages(["en-gb", "en"]);

        assert_eq!(voice.id.as_str(), "en-gb");
        assert_eq!(voice.gender, Some(VoiceGender::Male));
        assert_eq!(voice.age, Some(30));
        assert_eq!(voice.languages, vec!["en-gb", "en"]);
    }

    #[test]
    fn test_voice_id_serializes_transparently() {
        let json = serde_json::to_string(&VoiceId::new("en")).unwrap();
        assert_eq!(json, "\"en\"");
    }
}
