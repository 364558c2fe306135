use serde::{Deserialize, Serialize};

use crate::domain::phase::Phase;

pub const DEFAULT_PROVIDER: &str = "openrouter";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Backend settings one reasoning call runs under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelProfile {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

/// Per-phase model table, passed into the sequencer at construction.
///
/// Every phase is always mapped; there is no ambient or global lookup to
/// fall back on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseModels {
    discovery: ModelProfile,
    planning: ModelProfile,
    analysis: ModelProfile,
    synthesis: ModelProfile,
    consolidation: ModelProfile,
    report: ModelProfile,
}

impl PhaseModels {
    /// Same profile for every phase.
    pub fn uniform(profile: ModelProfile) -> Self {
        Self {
            discovery: profile.clone(),
            planning: profile.clone(),
            analysis: profile.clone(),
            synthesis: profile.clone(),
            consolidation: profile.clone(),
            report: profile,
        }
    }

    pub fn with_profile(mut self, phase: Phase, profile: ModelProfile) -> Self {
        match phase {
            Phase::Discovery => self.discovery = profile,
            Phase::Planning => self.planning = profile,
            Phase::Analysis => self.analysis = profile,
            Phase::Synthesis => self.synthesis = profile,
            Phase::Consolidation => self.consolidation = profile,
            Phase::Report => self.report = profile,
        }
        self
    }

    pub fn profile(&self, phase: Phase) -> &ModelProfile {
        match phase {
            Phase::Discovery => &self.discovery,
            Phase::Planning => &self.planning,
            Phase::Analysis => &self.analysis,
            Phase::Synthesis => &self.synthesis,
            Phase::Consolidation => &self.consolidation,
            Phase::Report => &self.report,
        }
    }
}

impl Default for PhaseModels {
    /// Low temperature where precision matters (Discovery, Report), higher
    /// for the free-form Consolidation pass.
    fn default() -> Self {
        Self::uniform(ModelProfile::default())
            .with_profile(Phase::Discovery, ModelProfile::default().with_temperature(0.2))
            .with_profile(Phase::Report, ModelProfile::default().with_temperature(0.2))
            .with_profile(
                Phase::Consolidation,
                ModelProfile::default().with_temperature(0.7),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_maps_every_phase() {
        let profile = ModelProfile::new("openai/gpt-4o");
        let models = PhaseModels::uniform(profile.clone());

        for phase in Phase::SEQUENCE {
            assert_eq!(models.profile(phase), &profile);
        }
    }

    #[test]
    fn test_with_profile_overrides_one_phase() {
        let models = PhaseModels::default()
            .with_profile(Phase::Analysis, ModelProfile::new("openai/gpt-4o-mini"));

        assert_eq!(models.profile(Phase::Analysis).model, "openai/gpt-4o-mini");
        assert_eq!(models.profile(Phase::Planning).model, DEFAULT_MODEL);
    }

    #[test]
    fn test_default_temperatures() {
        let models = PhaseModels::default();

        assert_eq!(models.profile(Phase::Discovery).temperature, Some(0.2));
        assert_eq!(models.profile(Phase::Consolidation).temperature, Some(0.7));
        assert_eq!(models.profile(Phase::Planning).temperature, None);
    }
}
