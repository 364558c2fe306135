use serde::{Deserialize, Serialize};

/// One stage in the fixed pipeline order.
///
/// The catalog is static: six phases, strictly increasing ordinals, exactly
/// one of them dynamic. Analysis is the dynamic phase — its task set is
/// derived at run time from Planning's output instead of being fixed here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Planning,
    Analysis,
    Synthesis,
    Consolidation,
    Report,
}

impl Phase {
    /// The full pipeline in execution order.
    pub const SEQUENCE: [Phase; 6] = [
        Self::Discovery,
        Self::Planning,
        Self::Analysis,
        Self::Synthesis,
        Self::Consolidation,
        Self::Report,
    ];

    /// 1-based position in the pipeline order.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Discovery => 1,
            Self::Planning => 2,
            Self::Analysis => 3,
            Self::Synthesis => 4,
            Self::Consolidation => 5,
            Self::Report => 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Discovery => "Discovery",
            Self::Planning => "Planning",
            Self::Analysis => "Analysis",
            Self::Synthesis => "Synthesis",
            Self::Consolidation => "Consolidation",
            Self::Report => "Report",
        }
    }

    /// Stable identifier used in logs, events, and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Planning => "planning",
            Self::Analysis => "analysis",
            Self::Synthesis => "synthesis",
            Self::Consolidation => "consolidation",
            Self::Report => "report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "discovery" => Some(Self::Discovery),
            "planning" => Some(Self::Planning),
            "analysis" => Some(Self::Analysis),
            "synthesis" => Some(Self::Synthesis),
            "consolidation" => Some(Self::Consolidation),
            "report" => Some(Self::Report),
            _ => None,
        }
    }

    /// Whether this phase's task set is planned at run time and fanned out
    /// concurrently.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Analysis)
    }

    /// Required phases abort the whole run when they exhaust their retries;
    /// optional phases record a degraded result and let the run continue.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Discovery | Self::Report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_strictly_increase() {
        for pair in Phase::SEQUENCE.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
    }

    #[test]
    fn test_exactly_one_dynamic_phase() {
        let dynamic: Vec<_> = Phase::SEQUENCE.iter().filter(|p| p.is_dynamic()).collect();
        assert_eq!(dynamic.len(), 1);
        assert_eq!(*dynamic[0], Phase::Analysis);
    }

    #[test]
    fn test_as_str_round_trip() {
        for phase in Phase::SEQUENCE {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(Phase::parse("deployment"), None);
    }

    #[test]
    fn test_required_phases() {
        assert!(Phase::Discovery.is_required());
        assert!(Phase::Report.is_required());
        assert!(!Phase::Planning.is_required());
        assert!(!Phase::Synthesis.is_required());
    }
}
