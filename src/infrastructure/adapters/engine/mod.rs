//! Engine Adapter - 合成引擎实现

mod espeak_engine;
mod fake_engine;

pub use espeak_engine::{parse_voice_list, EspeakEngine, EspeakEngineConfig};
pub use fake_engine::{EngineCall, EngineJournal, FakeEngine, FakeEngineConfig, FakeOperation};
