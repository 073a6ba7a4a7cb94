//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：只读取引擎状态，不修改属性

mod voice_queries;

pub mod handlers;

pub use voice_queries::*;
