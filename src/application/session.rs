//! Narration Session - 会话状态机
//!
//! 一次会话处理一个输入字符串：
//! 1. 从引擎读取当前语速、音量、音色，同时作为当前值和默认值
//! 2. 按顺序处理片段：指令立即修改状态并下发引擎，文本按当前状态入队
//! 3. 全部处理完后调用一次 flush_and_wait
//!
//! 任一引擎调用失败都会中止会话（fail-fast），不做部分恢复。

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::error::{Stage, SynthesisError};
use crate::application::ports::EngineAdapter;
use crate::domain::narration::{Segment, VoiceRole};
use crate::domain::voice::{VoiceId, VoiceResolution};

/// 会话唯一标识（日志关联用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 会话状态
///
/// 不变量:
/// - default_* 在会话开始时捕获，之后不再改变
/// - 只有 `<default>` 会把 default_rate / default_volume 复制回 current_*
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    current_rate: u32,
    current_volume: f32,
    current_voice: VoiceId,
    default_rate: u32,
    default_volume: f32,
    default_voice: VoiceId,
}

impl SessionState {
    fn capture(rate: u32, volume: f32, voice: VoiceId) -> Self {
        Self {
            current_rate: rate,
            current_volume: volume,
            current_voice: voice.clone(),
            default_rate: rate,
            default_volume: volume,
            default_voice: voice,
        }
    }

    pub fn current_rate(&self) -> u32 {
        self.current_rate
    }

    pub fn current_volume(&self) -> f32 {
        self.current_volume
    }

    pub fn current_voice(&self) -> &VoiceId {
        &self.current_voice
    }

    pub fn default_rate(&self) -> u32 {
        self.default_rate
    }

    pub fn default_volume(&self) -> f32 {
        self.default_volume
    }

    pub fn default_voice(&self) -> &VoiceId {
        &self.default_voice
    }
}

/// 会话选项
#[derive(Debug, Clone, Default)]
pub struct NarrationOptions {
    /// 入队前去掉文本中的 `*`（LLM 输出常带 markdown 强调）
    pub strip_asterisks: bool,
}

/// 已入队的一段文本及入队时生效的属性
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub rate: u32,
    pub volume: f32,
    pub voice: VoiceId,
}

/// 会话报告
#[derive(Debug, Clone, Serialize)]
pub struct NarrationReport {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub final_state: SessionState,
    pub utterances: Vec<Utterance>,
    /// 已下发到引擎的指令数
    pub directives_applied: usize,
    /// 因音色角色未解析而忽略的指令数
    pub directives_skipped: usize,
}

/// 会话状态机
pub struct NarrationSession<'a> {
    id: SessionId,
    engine: &'a mut dyn EngineAdapter,
    resolution: &'a VoiceResolution,
    options: NarrationOptions,
    state: SessionState,
    started_at: DateTime<Utc>,
    utterances: Vec<Utterance>,
    directives_applied: usize,
    directives_skipped: usize,
}

impl<'a> NarrationSession<'a> {
    /// 开始会话，捕获引擎当前属性作为默认值
    pub fn start(
        engine: &'a mut dyn EngineAdapter,
        resolution: &'a VoiceResolution,
        options: NarrationOptions,
    ) -> Result<Self, SynthesisError> {
        let id = SessionId::new();
        let rate = engine.get_rate().map_err(SynthesisError::at(Stage::Init))?;
        let volume = engine.get_volume().map_err(SynthesisError::at(Stage::Init))?;
        let voice = engine.get_voice().map_err(SynthesisError::at(Stage::Init))?;

        tracing::info!(
            session_id = %id,
            engine = engine.name(),
            rate = rate,
            volume = volume,
            voice = %voice,
            "Narration session started"
        );

        Ok(Self {
            id,
            engine,
            resolution,
            options,
            state: SessionState::capture(rate, volume, voice),
            started_at: Utc::now(),
            utterances: Vec::new(),
            directives_applied: 0,
            directives_skipped: 0,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// 处理单个片段
    pub fn apply(&mut self, segment: &Segment) -> Result<(), SynthesisError> {
        match segment {
            Segment::Text(text) => self.speak(text),
            Segment::SetRate(rate) => {
                self.set_rate(*rate)?;
                self.directives_applied += 1;
                Ok(())
            }
            Segment::SetVolume(volume) => {
                self.set_volume(*volume)?;
                self.directives_applied += 1;
                Ok(())
            }
            Segment::SelectVoice(role) => self.select_voice(*role),
            Segment::ResetDefaults => {
                self.set_rate(self.state.default_rate)?;
                self.set_volume(self.state.default_volume)?;
                self.directives_applied += 1;
                Ok(())
            }
        }
    }

    /// 按顺序处理全部片段并等待朗读完成
    pub fn run(mut self, segments: &[Segment]) -> Result<NarrationReport, SynthesisError> {
        for (index, segment) in segments.iter().enumerate() {
            if let Err(e) = self.apply(segment) {
                tracing::error!(
                    session_id = %self.id,
                    index = index,
                    stage = %e.stage,
                    error = %e.cause,
                    "Narration session aborted"
                );
                return Err(e);
            }
        }

        self.engine
            .flush_and_wait()
            .map_err(SynthesisError::at(Stage::Flush))
            .inspect_err(|e| {
                tracing::error!(session_id = %self.id, error = %e.cause, "Flush failed");
            })?;

        let report = NarrationReport {
            session_id: self.id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            final_state: self.state,
            utterances: self.utterances,
            directives_applied: self.directives_applied,
            directives_skipped: self.directives_skipped,
        };

        tracing::info!(
            session_id = %report.session_id,
            utterances = report.utterances.len(),
            directives_applied = report.directives_applied,
            directives_skipped = report.directives_skipped,
            "Narration session finished"
        );

        Ok(report)
    }

    fn set_rate(&mut self, rate: u32) -> Result<(), SynthesisError> {
        self.engine
            .set_rate(rate)
            .map_err(SynthesisError::at(Stage::SetRate))?;
        self.state.current_rate = rate;
        tracing::debug!(session_id = %self.id, rate = rate, "Rate changed");
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), SynthesisError> {
        self.engine
            .set_volume(volume)
            .map_err(SynthesisError::at(Stage::SetVolume))?;
        self.state.current_volume = volume;
        tracing::debug!(session_id = %self.id, volume = volume, "Volume changed");
        Ok(())
    }

    fn select_voice(&mut self, role: VoiceRole) -> Result<(), SynthesisError> {
        let voice = match role {
            VoiceRole::Default => self.state.default_voice.clone(),
            _ => match self.resolution.id_for(role) {
                Some(id) => id.clone(),
                None => {
                    // 未找到候选音色，保持当前音色继续朗读
                    tracing::warn!(
                        session_id = %self.id,
                        role = %role,
                        "No voice resolved for role, keeping current voice"
                    );
                    self.directives_skipped += 1;
                    return Ok(());
                }
            },
        };

        self.engine
            .set_voice(&voice)
            .map_err(SynthesisError::at(Stage::SetVoice))?;
        tracing::debug!(session_id = %self.id, role = %role, voice = %voice, "Voice switched");
        self.state.current_voice = voice;
        self.directives_applied += 1;
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<(), SynthesisError> {
        let text = if self.options.strip_asterisks {
            text.replace('*', "")
        } else {
            text.to_string()
        };

        if self.options.strip_asterisks && text.trim().is_empty() {
            tracing::debug!(session_id = %self.id, "Nothing left to speak after stripping markup");
            return Ok(());
        }

        self.engine
            .enqueue_speech(&text)
            .map_err(SynthesisError::at(Stage::Enqueue))?;
        tracing::debug!(
            session_id = %self.id,
            text_len = text.len(),
            rate = self.state.current_rate,
            volume = self.state.current_volume,
            voice = %self.state.current_voice,
            "Speech enqueued"
        );

        self.utterances.push(Utterance {
            text,
            rate: self.state.current_rate,
            volume: self.state.current_volume,
            voice: self.state.current_voice.clone(),
        });
        Ok(())
    }
}

/// 以默认选项执行一次完整会话
pub fn run_session(
    segments: &[Segment],
    resolution: &VoiceResolution,
    engine: &mut dyn EngineAdapter,
) -> Result<NarrationReport, SynthesisError> {
    NarrationSession::start(engine, resolution, NarrationOptions::default())?.run(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::EngineError;
    use crate::domain::narration::lex;
    use crate::domain::voice::{resolve, VoiceDescriptor, VoiceGender};
    use crate::infrastructure::adapters::{EngineCall, FakeEngine, FakeEngineConfig, FakeOperation};

    fn catalog() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("v-default", "Narrator"),
            VoiceDescriptor::new("v-male", "Microsoft David").with_gender(VoiceGender::Male),
            VoiceDescriptor::new("v-female", "Microsoft Zira").with_gender(VoiceGender::Female),
        ]
    }

    fn engine() -> FakeEngine {
        FakeEngine::new(FakeEngineConfig {
            rate: 150,
            volume: 0.8,
            voice: VoiceId::new("v-default"),
            catalog: catalog(),
            fail_on: None,
        })
    }

    fn mutations(engine: &FakeEngine) -> Vec<EngineCall> {
        engine
            .journal()
            .calls()
            .into_iter()
            .filter(|call| call.is_mutation())
            .collect()
    }

    #[test]
    fn test_text_only_enqueues_then_flushes() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        let report = run_session(&lex("hello"), &resolution, &mut engine).unwrap();

        assert_eq!(report.utterances.len(), 1);
        assert_eq!(report.utterances[0].text, "hello");
        assert_eq!(
            mutations(&engine),
            vec![EngineCall::Enqueue("hello".into()), EngineCall::Flush]
        );
    }

    #[test]
    fn test_directive_is_not_retroactive() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        let report = run_session(&lex("A <rate=200> B"), &resolution, &mut engine).unwrap();

        assert_eq!(
            mutations(&engine),
            vec![
                EngineCall::Enqueue("A ".into()),
                EngineCall::SetRate(200),
                EngineCall::Enqueue(" B".into()),
                EngineCall::Flush,
            ]
        );
        assert_eq!(report.utterances[0].rate, 150);
        assert_eq!(report.utterances[1].rate, 200);
    }

    #[test]
    fn test_reset_defaults_restores_rate_and_volume_only() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        let segments = lex("<voice=male><rate=300><volume=0.1><default> C");
        let report = run_session(&segments, &resolution, &mut engine).unwrap();

        let state = &report.final_state;
        assert_eq!(state.current_rate(), 150);
        assert_eq!(state.current_volume(), 0.8);
        // <default> 不恢复音色
        assert_eq!(state.current_voice(), &VoiceId::new("v-male"));

        let utterance = &report.utterances[0];
        assert_eq!(utterance.text, " C");
        assert_eq!(utterance.rate, 150);
        assert_eq!(utterance.volume, 0.8);
        assert_eq!(utterance.voice, VoiceId::new("v-male"));
    }

    #[test]
    fn test_voice_default_restores_only_voice() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        let segments = lex("<rate=220><voice=female>x<voice=default>y");
        let report = run_session(&segments, &resolution, &mut engine).unwrap();

        assert_eq!(report.utterances[0].voice, VoiceId::new("v-female"));
        assert_eq!(report.utterances[1].voice, VoiceId::new("v-default"));
        assert_eq!(report.utterances[1].rate, 220);
    }

    #[test]
    fn test_unresolved_role_is_noop() {
        let mut engine = engine();
        let resolution = resolve(&[]);
        let report = run_session(&lex("<voice=male> hi"), &resolution, &mut engine).unwrap();

        assert_eq!(report.final_state.current_voice(), &VoiceId::new("v-default"));
        assert_eq!(report.directives_skipped, 1);
        assert!(!mutations(&engine)
            .iter()
            .any(|call| matches!(call, EngineCall::SetVoice(_))));
    }

    #[test]
    fn test_set_voice_failure_aborts_session() {
        let mut engine = FakeEngine::new(FakeEngineConfig {
            fail_on: Some(FakeOperation::SetVoice),
            ..engine().config().clone()
        });
        let resolution = resolve(&catalog());
        let err = run_session(&lex("one <voice=male> two <rate=90> three"), &resolution, &mut engine)
            .unwrap_err();

        assert_eq!(err.stage, Stage::SetVoice);
        assert_eq!(
            mutations(&engine),
            vec![EngineCall::Enqueue("one ".into())]
        );
    }

    #[test]
    fn test_init_failure_is_reported() {
        let mut engine = FakeEngine::new(FakeEngineConfig {
            fail_on: Some(FakeOperation::GetProperties),
            ..engine().config().clone()
        });
        let resolution = VoiceResolution::default();
        let err = run_session(&lex("x"), &resolution, &mut engine).unwrap_err();
        assert_eq!(err.stage, Stage::Init);
        assert!(mutations(&engine).is_empty());
    }

    #[test]
    fn test_out_of_range_volume_fails_at_set_volume() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        let err = run_session(&lex("a<volume=1.5>b"), &resolution, &mut engine).unwrap_err();
        assert_eq!(err.stage, Stage::SetVolume);
        assert!(matches!(err.cause, EngineError::InvalidProperty { .. }));
    }

    #[test]
    fn test_flush_failure() {
        let mut engine = FakeEngine::new(FakeEngineConfig {
            fail_on: Some(FakeOperation::Flush),
            ..engine().config().clone()
        });
        let resolution = resolve(&catalog());
        let err = run_session(&lex("a"), &resolution, &mut engine).unwrap_err();
        assert_eq!(err.stage, Stage::Flush);
    }

    #[test]
    fn test_flush_called_once_for_empty_input() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        run_session(&[], &resolution, &mut engine).unwrap();
        assert_eq!(mutations(&engine), vec![EngineCall::Flush]);
    }

    #[test]
    fn test_strip_asterisks() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        let options = NarrationOptions {
            strip_asterisks: true,
        };
        let session = NarrationSession::start(&mut engine, &resolution, options).unwrap();
        let report = session
            .run(&lex("**Bold** move<rate=100>***"))
            .unwrap();

        // 只剩星号的片段被跳过
        assert_eq!(report.utterances.len(), 1);
        assert_eq!(report.utterances[0].text, "Bold move");
    }

    #[test]
    fn test_apply_updates_state_incrementally() {
        let mut engine = engine();
        let resolution = resolve(&catalog());
        let mut session =
            NarrationSession::start(&mut engine, &resolution, NarrationOptions::default()).unwrap();

        session.apply(&Segment::SetRate(180)).unwrap();
        assert_eq!(session.state().current_rate(), 180);
        assert_eq!(session.state().default_rate(), 150);

        session.apply(&Segment::SelectVoice(VoiceRole::Female)).unwrap();
        assert_eq!(session.state().current_voice(), &VoiceId::new("v-female"));
        assert_eq!(session.state().default_voice(), &VoiceId::new("v-default"));
    }
}
