use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::QuoteConfig;

//
// ─── REQUEST ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuoteInputError {
    #[error("material name cannot be empty")]
    EmptyMaterial,

    #[error("weight must be greater than 0 g, got {0}")]
    NonPositiveWeight(f64),

    #[error("unknown difficulty level {0}")]
    UnknownDifficulty(u8),

    #[error("risk {0} is not one of the offered surcharges")]
    UnsupportedRisk(f64),

    #[error("post-processing hours must be >= 0, got {0}")]
    NegativePostProcessHours(f64),

    #[error("post-processing rate must be >= 0, got {0}")]
    NegativePostProcessRate(f64),
}

/// Job parameters collected by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub material_name: String,
    pub weight_g: f64,
    pub difficulty: u8,
    pub risk: f64,
    pub post_process_hours: f64,
    pub post_process_rate: f64,
}

impl QuoteRequest {
    /// A request with normal difficulty, no risk and no post-processing.
    #[must_use]
    pub fn new(material_name: impl Into<String>, weight_g: f64) -> Self {
        Self {
            material_name: material_name.into(),
            weight_g,
            difficulty: 1,
            risk: 0.0,
            post_process_hours: 0.0,
            post_process_rate: 0.0,
        }
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_risk(mut self, risk: f64) -> Self {
        self.risk = risk;
        self
    }

    #[must_use]
    pub fn with_post_process(mut self, hours: f64, rate: f64) -> Self {
        self.post_process_hours = hours;
        self.post_process_rate = rate;
        self
    }

    /// Boundary check run before a request reaches the quote engine.
    ///
    /// The engine itself is only defined for `weight_g > 0` and for the
    /// difficulty and risk values offered by `config`. The material name is
    /// trimmed so it matches the name materials are stored under.
    ///
    /// # Errors
    ///
    /// Returns the first `QuoteInputError` found.
    pub fn validate(self, config: &QuoteConfig) -> Result<Self, QuoteInputError> {
        let material_name = self.material_name.trim().to_owned();
        if material_name.is_empty() {
            return Err(QuoteInputError::EmptyMaterial);
        }
        if !self.weight_g.is_finite() || self.weight_g <= 0.0 {
            return Err(QuoteInputError::NonPositiveWeight(self.weight_g));
        }
        if config.difficulty_tier(self.difficulty).is_none() {
            return Err(QuoteInputError::UnknownDifficulty(self.difficulty));
        }
        if !config.allows_risk(self.risk) {
            return Err(QuoteInputError::UnsupportedRisk(self.risk));
        }
        if !self.post_process_hours.is_finite() || self.post_process_hours < 0.0 {
            return Err(QuoteInputError::NegativePostProcessHours(
                self.post_process_hours,
            ));
        }
        if !self.post_process_rate.is_finite() || self.post_process_rate < 0.0 {
            return Err(QuoteInputError::NegativePostProcessRate(
                self.post_process_rate,
            ));
        }
        Ok(Self {
            material_name,
            ..self
        })
    }
}

//
// ─── EFFICIENCY ────────────────────────────────────────────────────────────────
//

/// Where an efficiency figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EfficiencySource {
    /// Material unknown; the configured fallback rate was used.
    Default,
    /// No usable history; the material's factory rate was used.
    Preset,
    /// Weighted over this many non-lattice work orders.
    History { records: u32 },
}

impl fmt::Display for EfficiencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EfficiencySource::Default => write!(f, "default"),
            EfficiencySource::Preset => write!(f, "preset"),
            EfficiencySource::History { records } => write!(f, "based on {records} records"),
        }
    }
}

/// Best-estimate print rate for a material plus its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyEstimate {
    /// g/min
    pub efficiency: f64,
    pub source: EfficiencySource,
    pub sample_count: u32,
}

impl EfficiencyEstimate {
    #[must_use]
    pub fn fallback(efficiency: f64) -> Self {
        Self {
            efficiency,
            source: EfficiencySource::Default,
            sample_count: 0,
        }
    }

    #[must_use]
    pub fn preset(efficiency: f64) -> Self {
        Self {
            efficiency,
            source: EfficiencySource::Preset,
            sample_count: 0,
        }
    }

    #[must_use]
    pub fn from_history(efficiency: f64, records: u32) -> Self {
        Self {
            efficiency,
            source: EfficiencySource::History { records },
            sample_count: records,
        }
    }

    /// Label shown next to the figure, e.g. `"based on 5 records"`.
    #[must_use]
    pub fn source_label(&self) -> String {
        self.source.to_string()
    }
}

//
// ─── BREAKDOWN ─────────────────────────────────────────────────────────────────
//

/// Every intermediate value of a quote, so callers can render an audit trail
/// without recomputing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub material_name: String,
    pub weight_g: f64,
    pub efficiency: EfficiencyEstimate,
    pub cost_per_min: f64,
    pub time_min: f64,
    pub time_formatted: String,
    pub base_print_price: f64,
    pub difficulty: u8,
    pub difficulty_label: String,
    pub difficulty_factor: f64,
    pub risk: f64,
    pub coefficient: f64,
    pub print_price: f64,
    pub post_process_hours: f64,
    pub post_process_rate: f64,
    pub post_process_price: f64,
    pub total_quote: f64,
    pub total_formatted: String,
}
