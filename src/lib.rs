//! Narrator - 带内联控制标签的旁白朗读
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Narration Context: 控制标签词法分析
//! - Voice Context: 音色目录与 male / female 角色解析
//!
//! 应用层 (application/):
//! - Ports: EngineAdapter 端口定义
//! - Session: 会话状态机（属性变更与文本入队的有序执行）
//! - Commands / Queries: 朗读命令、音色目录查询
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: espeak-ng 引擎、Fake 引擎
//! - Worker: NarrationWorker 后台顺序执行会话

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config_from_path, AppConfig};
