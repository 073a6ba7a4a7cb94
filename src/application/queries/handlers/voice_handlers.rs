//! Voice Query Handlers

use serde::Serialize;

use crate::application::ports::{EngineAdapter, EngineError};
use crate::application::queries::ListVoices;
use crate::domain::voice::{resolve_with, VoiceDescriptor, VoiceHeuristics, VoiceResolution};

/// 音色目录响应
#[derive(Debug, Clone, Serialize)]
pub struct VoiceCatalogResponse {
    pub voices: Vec<VoiceDescriptor>,
    pub resolution: VoiceResolution,
}

/// ListVoices Handler
#[derive(Debug, Clone, Default)]
pub struct ListVoicesHandler {
    heuristics: VoiceHeuristics,
}

impl ListVoicesHandler {
    pub fn new(heuristics: VoiceHeuristics) -> Self {
        Self { heuristics }
    }

    pub fn handle(
        &self,
        engine: &dyn EngineAdapter,
        _query: ListVoices,
    ) -> Result<VoiceCatalogResponse, EngineError> {
        let voices = engine.list_voices()?;
        let resolution = resolve_with(&voices, &self.heuristics);

        tracing::info!(
            engine = engine.name(),
            voices = voices.len(),
            male = ?resolution.male_id,
            female = ?resolution.female_id,
            "Voice catalog listed"
        );

        Ok(VoiceCatalogResponse { voices, resolution })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::{VoiceGender, VoiceId};
    use crate::infrastructure::adapters::{FakeEngine, FakeEngineConfig};

    #[test]
    fn test_list_voices_with_resolution() {
        let engine = FakeEngine::new(FakeEngineConfig {
            catalog: vec![
                VoiceDescriptor::new("a", "Alpha").with_gender(VoiceGender::Female),
                VoiceDescriptor::new("b", "Beta"),
            ],
            ..FakeEngineConfig::default()
        });

        let response = ListVoicesHandler::default()
            .handle(&engine, ListVoices)
            .unwrap();

        assert_eq!(response.voices.len(), 2);
        assert_eq!(response.resolution.female_id, Some(VoiceId::new("a")));
        assert_eq!(response.resolution.male_id, Some(VoiceId::new("b")));
    }

    #[test]
    fn test_response_serializes_to_json() {
        let engine = FakeEngine::new(FakeEngineConfig {
            catalog: vec![VoiceDescriptor::new("a", "Alpha").with_gender(VoiceGender::Male)],
            ..FakeEngineConfig::default()
        });
        let response = ListVoicesHandler::default()
            .handle(&engine, ListVoices)
            .unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["voices"][0]["gender"], "male");
        assert_eq!(json["resolution"]["male_id"], "a");
        assert!(json["resolution"]["female_id"].is_null());
    }
}
