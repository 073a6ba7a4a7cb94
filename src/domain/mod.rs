//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Narration Context: 控制标签与片段
//! - Voice Context: 音色目录与角色解析

pub mod narration;
pub mod voice;

pub use narration::{lex, tokenize, Segment, Token, VoiceRole};
pub use voice::{resolve, resolve_with, VoiceDescriptor, VoiceGender, VoiceId, VoiceResolution};
