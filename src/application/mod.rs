//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（EngineAdapter）
//! - session: 旁白会话状态机
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod session;

// Re-exports
pub use commands::{handlers::NarrateHandler, NarrateCommand};

pub use error::{Stage, SynthesisError};

pub use ports::{EngineAdapter, EngineError};

pub use queries::{
    handlers::{ListVoicesHandler, VoiceCatalogResponse},
    ListVoices,
};

pub use session::{
    run_session, NarrationOptions, NarrationReport, NarrationSession, SessionId, SessionState,
    Utterance,
};
