//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 引擎音色描述
//! - male / female 角色解析

mod resolver;
mod value_objects;

pub use resolver::{
    resolve, resolve_with, VoiceHeuristics, VoiceResolution, DEFAULT_FEMALE_NAMES,
    DEFAULT_MALE_NAMES,
};
pub use value_objects::{VoiceDescriptor, VoiceGender, VoiceId};
