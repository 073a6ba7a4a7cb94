//! Narrate Commands

/// 朗读一段带控制标签的文本
#[derive(Debug, Clone)]
pub struct NarrateCommand {
    pub text: String,
}

impl NarrateCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
