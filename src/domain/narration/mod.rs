//! Narration Context - 旁白控制语言
//!
//! 职责:
//! - 控制标签的词法分析
//! - 片段与音色角色的定义

mod lexer;
mod segment;

pub use lexer::{lex, tokenize};
pub use segment::{Segment, Token, VoiceRole};
