//! 音色目录解析
//!
//! 从引擎音色目录中为 male / female 角色挑选候选音色，分三轮，两个角色都确定后停止：
//! 1. 声明属性：按目录顺序取第一个声明为 male / female 的音色
//! 2. 名称启发：名称（小写）包含已知人名片段
//! 3. 位置兜底：male 取第一个音色（已被 female 占用时取第二个），female 取第二个音色
//!
//! 这是尽力而为的启发式，找不到候选不是错误。

use serde::Serialize;

use super::value_objects::{VoiceDescriptor, VoiceGender, VoiceId};
use crate::domain::narration::VoiceRole;

/// 默认男声名称片段
pub const DEFAULT_MALE_NAMES: &[&str] = &["david", "mark", "james", "microsoft david"];

/// 默认女声名称片段
pub const DEFAULT_FEMALE_NAMES: &[&str] = &["zira", "hazel", "susan", "microsoft zira"];

/// 名称启发规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceHeuristics {
    pub male_names: Vec<String>,
    pub female_names: Vec<String>,
}

impl Default for VoiceHeuristics {
    fn default() -> Self {
        Self {
            male_names: DEFAULT_MALE_NAMES.iter().map(|s| s.to_string()).collect(),
            female_names: DEFAULT_FEMALE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl VoiceHeuristics {
    fn matches(tokens: &[String], name: &str) -> bool {
        tokens
            .iter()
            .any(|token| name.contains(token.to_lowercase().as_str()))
    }
}

/// 解析结果
///
/// 不变量: 目录非空时至少有一个角色被填充
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoiceResolution {
    pub male_id: Option<VoiceId>,
    pub female_id: Option<VoiceId>,
}

impl VoiceResolution {
    /// 角色对应的音色，`Default` 角色不经过解析
    pub fn id_for(&self, role: VoiceRole) -> Option<&VoiceId> {
        match role {
            VoiceRole::Male => self.male_id.as_ref(),
            VoiceRole::Female => self.female_id.as_ref(),
            VoiceRole::Default => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.male_id.is_some() && self.female_id.is_some()
    }
}

/// 使用默认名称规则解析
pub fn resolve(catalog: &[VoiceDescriptor]) -> VoiceResolution {
    resolve_with(catalog, &VoiceHeuristics::default())
}

/// 解析音色目录
pub fn resolve_with(catalog: &[VoiceDescriptor], heuristics: &VoiceHeuristics) -> VoiceResolution {
    let mut resolution = VoiceResolution::default();

    // 第一轮：声明属性
    for voice in catalog {
        match voice.gender {
            Some(VoiceGender::Male) if resolution.male_id.is_none() => {
                resolution.male_id = Some(voice.id.clone());
            }
            Some(VoiceGender::Female) if resolution.female_id.is_none() => {
                resolution.female_id = Some(voice.id.clone());
            }
            _ => {}
        }
        if resolution.is_complete() {
            return resolution;
        }
    }

    // 第二轮：名称启发
    for voice in catalog {
        let name = voice.name.to_lowercase();
        if resolution.male_id.is_none() && VoiceHeuristics::matches(&heuristics.male_names, &name) {
            resolution.male_id = Some(voice.id.clone());
        }
        if resolution.female_id.is_none()
            && VoiceHeuristics::matches(&heuristics.female_names, &name)
        {
            resolution.female_id = Some(voice.id.clone());
        }
        if resolution.is_complete() {
            return resolution;
        }
    }

    // 第三轮：位置兜底
    if resolution.male_id.is_none() {
        resolution.male_id = positional_male(catalog, resolution.female_id.as_ref());
    }
    if resolution.female_id.is_none() {
        resolution.female_id = catalog.get(1).map(|voice| voice.id.clone());
    }

    resolution
}

/// 第一个音色已被 female 占用且目录中还有第二个时，male 改取第二个
fn positional_male(catalog: &[VoiceDescriptor], female: Option<&VoiceId>) -> Option<VoiceId> {
    let first = catalog.first()?;
    match catalog.get(1) {
        Some(second) if Some(&first.id) == female => Some(second.id.clone()),
        _ => Some(first.id.clone()),
    }
}
