//! Fake Engine - 用于测试和 dry-run 的合成引擎
//!
//! 不发出任何声音，只记录收到的调用；可以指定某个操作失败

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::ports::{EngineAdapter, EngineError};
use crate::application::session::Utterance;
use crate::domain::voice::{VoiceDescriptor, VoiceGender, VoiceId};

/// 可注入失败的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOperation {
    /// get_rate / get_volume / get_voice
    GetProperties,
    ListVoices,
    SetRate,
    SetVolume,
    SetVoice,
    Enqueue,
    Flush,
}

/// 引擎收到的调用（只记录成功的调用）
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    GetRate,
    GetVolume,
    GetVoice,
    ListVoices,
    SetRate(u32),
    SetVolume(f32),
    SetVoice(VoiceId),
    Enqueue(String),
    Flush,
}

impl EngineCall {
    /// 是否改变引擎状态或输出
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::GetRate | Self::GetVolume | Self::GetVoice | Self::ListVoices
        )
    }
}

impl fmt::Display for EngineCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetRate => f.write_str("get_rate"),
            Self::GetVolume => f.write_str("get_volume"),
            Self::GetVoice => f.write_str("get_voice"),
            Self::ListVoices => f.write_str("list_voices"),
            Self::SetRate(rate) => write!(f, "set_rate({})", rate),
            Self::SetVolume(volume) => write!(f, "set_volume({})", volume),
            Self::SetVoice(voice) => write!(f, "set_voice({})", voice),
            Self::Enqueue(text) => write!(f, "enqueue_speech({:?})", text),
            Self::Flush => f.write_str("flush_and_wait"),
        }
    }
}

#[derive(Debug, Default)]
struct JournalInner {
    calls: Vec<EngineCall>,
    spoken: Vec<Utterance>,
}

/// 调用日志
///
/// 可克隆，引擎移交给 worker 之后仍可读取
#[derive(Debug, Clone, Default)]
pub struct EngineJournal {
    inner: Arc<Mutex<JournalInner>>,
}

impl EngineJournal {
    fn lock(&self) -> MutexGuard<'_, JournalInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: EngineCall) {
        self.lock().calls.push(call);
    }

    /// 全部调用
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    /// 已经 flush 的文本及其朗读属性
    pub fn spoken(&self) -> Vec<Utterance> {
        self.lock().spoken.clone()
    }
}

/// Fake Engine 配置
#[derive(Debug, Clone)]
pub struct FakeEngineConfig {
    pub rate: u32,
    pub volume: f32,
    pub voice: VoiceId,
    pub catalog: Vec<VoiceDescriptor>,
    pub fail_on: Option<FakeOperation>,
}

impl Default for FakeEngineConfig {
    fn default() -> Self {
        Self {
            rate: 175,
            volume: 1.0,
            voice: VoiceId::new("default"),
            catalog: Vec::new(),
            fail_on: None,
        }
    }
}

impl FakeEngineConfig {
    /// 带一男一女两个示例音色，dry-run 时也能看到音色切换
    pub fn with_sample_catalog(mut self) -> Self {
        self.catalog = vec![
            VoiceDescriptor::new("fake-male", "Sample Male")
                .with_gender(VoiceGender::Male)
                .with_languages(["en"]),
            VoiceDescriptor::new("fake-female", "Sample Female")
                .with_gender(VoiceGender::Female)
                .with_languages(["en"]),
        ];
        self
    }
}

/// Fake Engine
pub struct FakeEngine {
    config: FakeEngineConfig,
    rate: u32,
    volume: f32,
    voice: VoiceId,
    queue: Vec<Utterance>,
    journal: EngineJournal,
}

impl FakeEngine {
    pub fn new(config: FakeEngineConfig) -> Self {
        tracing::debug!(
            voices = config.catalog.len(),
            fail_on = ?config.fail_on,
            "FakeEngine initialized"
        );
        Self {
            rate: config.rate,
            volume: config.volume,
            voice: config.voice.clone(),
            config,
            queue: Vec::new(),
            journal: EngineJournal::default(),
        }
    }

    pub fn config(&self) -> &FakeEngineConfig {
        &self.config
    }

    pub fn journal(&self) -> EngineJournal {
        self.journal.clone()
    }

    fn check(&self, operation: FakeOperation) -> Result<(), EngineError> {
        if self.config.fail_on != Some(operation) {
            return Ok(());
        }
        Err(match operation {
            FakeOperation::GetProperties | FakeOperation::ListVoices => {
                EngineError::Unavailable("fake engine offline".to_string())
            }
            FakeOperation::SetRate => EngineError::invalid_property("rate", "injected failure"),
            FakeOperation::SetVolume => EngineError::invalid_property("volume", "injected failure"),
            FakeOperation::SetVoice => EngineError::VoiceNotFound(self.voice.clone()),
            FakeOperation::Enqueue | FakeOperation::Flush => {
                EngineError::ProcessFailed("injected failure".to_string())
            }
        })
    }

    fn knows_voice(&self, voice: &VoiceId) -> bool {
        self.config.catalog.is_empty()
            || voice == &self.config.voice
            || self.config.catalog.iter().any(|v| &v.id == voice)
    }
}

impl EngineAdapter for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn get_rate(&self) -> Result<u32, EngineError> {
        self.check(FakeOperation::GetProperties)?;
        self.journal.record(EngineCall::GetRate);
        Ok(self.rate)
    }

    fn get_volume(&self) -> Result<f32, EngineError> {
        self.check(FakeOperation::GetProperties)?;
        self.journal.record(EngineCall::GetVolume);
        Ok(self.volume)
    }

    fn get_voice(&self) -> Result<VoiceId, EngineError> {
        self.check(FakeOperation::GetProperties)?;
        self.journal.record(EngineCall::GetVoice);
        Ok(self.voice.clone())
    }

    fn set_rate(&mut self, rate: u32) -> Result<(), EngineError> {
        self.check(FakeOperation::SetRate)?;
        self.rate = rate;
        self.journal.record(EngineCall::SetRate(rate));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), EngineError> {
        self.check(FakeOperation::SetVolume)?;
        if !(0.0..=1.0).contains(&volume) {
            return Err(EngineError::invalid_property(
                "volume",
                format!("{} is outside 0.0..=1.0", volume),
            ));
        }
        self.volume = volume;
        self.journal.record(EngineCall::SetVolume(volume));
        Ok(())
    }

    fn set_voice(&mut self, voice: &VoiceId) -> Result<(), EngineError> {
        self.check(FakeOperation::SetVoice)?;
        if !self.knows_voice(voice) {
            return Err(EngineError::VoiceNotFound(voice.clone()));
        }
        self.voice = voice.clone();
        self.journal.record(EngineCall::SetVoice(voice.clone()));
        Ok(())
    }

    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, EngineError> {
        self.check(FakeOperation::ListVoices)?;
        self.journal.record(EngineCall::ListVoices);
        Ok(self.config.catalog.clone())
    }

    fn enqueue_speech(&mut self, text: &str) -> Result<(), EngineError> {
        self.check(FakeOperation::Enqueue)?;
        self.queue.push(Utterance {
            text: text.to_string(),
            rate: self.rate,
            volume: self.volume,
            voice: self.voice.clone(),
        });
        self.journal.record(EngineCall::Enqueue(text.to_string()));
        Ok(())
    }

    fn flush_and_wait(&mut self) -> Result<(), EngineError> {
        let queued = std::mem::take(&mut self.queue);
        self.check(FakeOperation::Flush)?;
        self.journal.lock().spoken.extend(queued);
        self.journal.record(EngineCall::Flush);
        Ok(())
    }
}
