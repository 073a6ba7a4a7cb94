//! Voice Queries

/// 列出引擎音色目录及角色解析结果
#[derive(Debug, Clone)]
pub struct ListVoices;
