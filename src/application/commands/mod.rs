//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：驱动引擎朗读

mod narrate_commands;

pub mod handlers;

pub use narrate_commands::*;
