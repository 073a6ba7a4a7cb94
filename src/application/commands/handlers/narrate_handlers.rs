//! Narrate Command Handler
//!
//! 查询音色目录 → 解析角色 → 词法分析 → 会话状态机 → 等待朗读完成

use crate::application::commands::NarrateCommand;
use crate::application::error::{Stage, SynthesisError};
use crate::application::ports::EngineAdapter;
use crate::application::session::{NarrationOptions, NarrationReport, NarrationSession};
use crate::domain::narration::{tokenize, Segment};
use crate::domain::voice::{resolve_with, VoiceHeuristics};

/// Narrate Handler
#[derive(Debug, Clone, Default)]
pub struct NarrateHandler {
    heuristics: VoiceHeuristics,
    options: NarrationOptions,
}

impl NarrateHandler {
    pub fn new(heuristics: VoiceHeuristics, options: NarrationOptions) -> Self {
        Self {
            heuristics,
            options,
        }
    }

    /// 同步执行，flush_and_wait 会阻塞直到朗读完成
    pub fn handle(
        &self,
        engine: &mut dyn EngineAdapter,
        command: NarrateCommand,
    ) -> Result<NarrationReport, SynthesisError> {
        let catalog = engine
            .list_voices()
            .map_err(SynthesisError::at(Stage::Init))?;
        let resolution = resolve_with(&catalog, &self.heuristics);

        tracing::debug!(
            voices = catalog.len(),
            male = ?resolution.male_id,
            female = ?resolution.female_id,
            "Voice catalog resolved"
        );

        let tokens = tokenize(&command.text);
        for token in tokens.iter().filter(|t| t.segment.is_directive()) {
            tracing::trace!(directive = token.raw, "Directive recognised");
        }
        let segments: Vec<Segment> = tokens.into_iter().map(|t| t.segment).collect();

        NarrationSession::start(engine, &resolution, self.options.clone())?.run(&segments)
    }
}
