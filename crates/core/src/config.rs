//! Process-wide pricing constants.
//!
//! Everything the engine treats as fixed for the lifetime of the process
//! (working calendar, machine price list, option sets, cold-start materials)
//! lives in [`QuoteConfig`], which is handed to services at construction so
//! tests can substitute their own catalogs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Print rate used when a material is not known at all (g/min).
pub const FALLBACK_EFFICIENCY: f64 = 0.05;

const RISK_EPSILON: f64 = 1e-9;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error("work days per year must be between 1 and 366")]
    InvalidWorkDays,

    #[error("hours per day must be between 1 and 24")]
    InvalidHoursPerDay,

    #[error("machine catalog cannot be empty")]
    EmptyMachineCatalog,

    #[error("machine `{0}` appears more than once in the catalog")]
    DuplicateMachine(String),

    #[error("machine `{0}` must have a name and a price > 0")]
    InvalidMachine(String),

    #[error("depreciation options must be non-empty and > 0")]
    InvalidDepreciationOptions,

    #[error("default machine `{0}` is not in the catalog")]
    UnknownDefaultMachine(String),

    #[error("default depreciation of {0} years is not an allowed option")]
    UnsupportedDefaultYears(u32),

    #[error("difficulty tiers must be non-empty with unique levels and factors > 0")]
    InvalidDifficultyTiers,

    #[error("risk options must be non-empty, finite and >= 0")]
    InvalidRiskOptions,

    #[error("fallback efficiency must be > 0")]
    InvalidFallbackEfficiency,

    #[error("material `{0}` must have a name and a default efficiency > 0")]
    InvalidMaterial(String),
}

//
// ─── CATALOG TYPES ─────────────────────────────────────────────────────────────
//

/// Working calendar used to spread a machine's price over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub work_days_per_year: u32,
    pub hours_per_day: u32,
}

impl WorkSchedule {
    /// Machine minutes available per year.
    #[must_use]
    pub fn minutes_per_year(&self) -> u64 {
        u64::from(self.work_days_per_year) * u64::from(self.hours_per_day) * 60
    }
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            work_days_per_year: 330,
            hours_per_day: 8,
        }
    }
}

/// Catalog entry for a purchasable machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub name: String,
    pub total_price: u64,
}

/// Named difficulty level and the multiplier it contributes to the coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTier {
    pub level: u8,
    pub label: String,
    pub factor: f64,
}

/// A historical print shipped with the cold-start data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleWorkOrder {
    pub weight_g: f64,
    pub time_min: f64,
    #[serde(default)]
    pub is_lattice: bool,
    #[serde(default)]
    pub note: String,
}

/// Material created on first start, with optional sample history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    pub default_efficiency: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub samples: Vec<SampleWorkOrder>,
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub schedule: WorkSchedule,
    pub machines: Vec<MachineSpec>,
    pub depreciation_years_options: Vec<u32>,
    pub default_machine: String,
    pub default_depreciation_years: u32,
    pub difficulty_tiers: Vec<DifficultyTier>,
    pub risk_options: Vec<f64>,
    pub fallback_efficiency: f64,
    pub currency_symbol: String,
    pub materials: Vec<MaterialSpec>,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            schedule: WorkSchedule::default(),
            machines: vec![
                MachineSpec {
                    name: "DW-HP120".into(),
                    total_price: 1_500_000,
                },
                MachineSpec {
                    name: "DW-HP200".into(),
                    total_price: 3_000_000,
                },
            ],
            depreciation_years_options: vec![1, 2, 3],
            default_machine: "DW-HP120".into(),
            default_depreciation_years: 3,
            difficulty_tiers: vec![
                tier(1, "normal", 1.0),
                tier(2, "hard", 1.5),
                tier(3, "very hard", 2.0),
            ],
            risk_options: vec![0.0, 0.5, 1.0, 1.5, 2.0],
            fallback_efficiency: FALLBACK_EFFICIENCY,
            currency_symbol: "¥".into(),
            materials: default_materials(),
        }
    }
}

impl QuoteConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and any validation
    /// error reported by [`QuoteConfig::validate`].
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency of the catalogs.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=366).contains(&self.schedule.work_days_per_year) {
            return Err(ConfigError::InvalidWorkDays);
        }
        if !(1..=24).contains(&self.schedule.hours_per_day) {
            return Err(ConfigError::InvalidHoursPerDay);
        }

        if self.machines.is_empty() {
            return Err(ConfigError::EmptyMachineCatalog);
        }
        for (idx, machine) in self.machines.iter().enumerate() {
            if machine.name.trim().is_empty() || machine.total_price == 0 {
                return Err(ConfigError::InvalidMachine(machine.name.clone()));
            }
            if self.machines[..idx].iter().any(|m| m.name == machine.name) {
                return Err(ConfigError::DuplicateMachine(machine.name.clone()));
            }
        }

        if self.depreciation_years_options.is_empty()
            || self.depreciation_years_options.contains(&0)
        {
            return Err(ConfigError::InvalidDepreciationOptions);
        }
        if self.machine(&self.default_machine).is_none() {
            return Err(ConfigError::UnknownDefaultMachine(
                self.default_machine.clone(),
            ));
        }
        if !self.allows_depreciation_years(self.default_depreciation_years) {
            return Err(ConfigError::UnsupportedDefaultYears(
                self.default_depreciation_years,
            ));
        }

        let tiers_ok = !self.difficulty_tiers.is_empty()
            && self.difficulty_tiers.iter().enumerate().all(|(idx, t)| {
                t.factor.is_finite()
                    && t.factor > 0.0
                    && !self.difficulty_tiers[..idx]
                        .iter()
                        .any(|other| other.level == t.level)
            });
        if !tiers_ok {
            return Err(ConfigError::InvalidDifficultyTiers);
        }

        if self.risk_options.is_empty()
            || self
                .risk_options
                .iter()
                .any(|r| !r.is_finite() || *r < 0.0)
        {
            return Err(ConfigError::InvalidRiskOptions);
        }

        if !self.fallback_efficiency.is_finite() || self.fallback_efficiency <= 0.0 {
            return Err(ConfigError::InvalidFallbackEfficiency);
        }

        for material in &self.materials {
            if material.name.trim().is_empty()
                || !material.default_efficiency.is_finite()
                || material.default_efficiency <= 0.0
            {
                return Err(ConfigError::InvalidMaterial(material.name.clone()));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn machine(&self, name: &str) -> Option<&MachineSpec> {
        self.machines.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn allows_depreciation_years(&self, years: u32) -> bool {
        self.depreciation_years_options.contains(&years)
    }

    #[must_use]
    pub fn difficulty_tier(&self, level: u8) -> Option<&DifficultyTier> {
        self.difficulty_tiers.iter().find(|t| t.level == level)
    }

    /// Risk values are compared with a small tolerance since they come from
    /// user-entered decimals.
    #[must_use]
    pub fn allows_risk(&self, risk: f64) -> bool {
        self.risk_options
            .iter()
            .any(|option| (option - risk).abs() < RISK_EPSILON)
    }
}

fn tier(level: u8, label: &str, factor: f64) -> DifficultyTier {
    DifficultyTier {
        level,
        label: label.into(),
        factor,
    }
}

fn sample(weight_g: f64, time_min: f64, note: &str) -> SampleWorkOrder {
    SampleWorkOrder {
        weight_g,
        time_min,
        is_lattice: false,
        note: note.into(),
    }
}

fn default_materials() -> Vec<MaterialSpec> {
    vec![
        MaterialSpec {
            name: "316L Stainless Steel".into(),
            default_efficiency: 0.053,
            description: "Austenitic stainless steel with excellent corrosion resistance".into(),
            samples: vec![
                sample(150.0, 2830.0, "structural part"),
                sample(85.0, 1603.0, "bracket"),
                sample(220.0, 4150.0, "housing"),
                sample(45.0, 849.0, "small part"),
                sample(180.0, 3396.0, "flange"),
            ],
        },
        MaterialSpec {
            name: "TC4 Titanium Alloy".into(),
            default_efficiency: 0.047,
            description: "Ti-6Al-4V, common in aerospace".into(),
            samples: vec![
                sample(120.0, 2553.0, "aerospace fitting"),
                sample(65.0, 1383.0, "medical implant"),
                sample(200.0, 4255.0, "structural part"),
                sample(35.0, 745.0, "small fitting"),
                sample(95.0, 2021.0, "support structure"),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = QuoteConfig::default();
        config.validate().unwrap();
        assert_eq!(config.schedule.minutes_per_year(), 330 * 8 * 60);
        assert_eq!(config.machine("DW-HP200").map(|m| m.total_price), Some(3_000_000));
        assert_eq!(config.difficulty_tier(2).map(|t| t.label.as_str()), Some("hard"));
        assert!(config.allows_risk(1.5));
        assert!(!config.allows_risk(0.7));
    }

    #[test]
    fn toml_overrides_keep_other_defaults() {
        let config = QuoteConfig::from_toml_str(
            r#"
            currency_symbol = "$"
            depreciation_years_options = [1, 2, 3, 5]

            [schedule]
            work_days_per_year = 250
            hours_per_day = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.schedule.work_days_per_year, 250);
        assert!(config.allows_depreciation_years(5));
        assert_eq!(config.machines.len(), 2);
        assert_eq!(config.materials.len(), 2);
    }

    #[test]
    fn toml_rejects_inconsistent_catalogs() {
        let err = QuoteConfig::from_toml_str(r#"default_machine = "XYZ""#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDefaultMachine(_)));

        let err = QuoteConfig::from_toml_str("depreciation_years_options = [0, 1]").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDepreciationOptions));

        let err = QuoteConfig::from_toml_str("risk_options = [-1.0]").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRiskOptions));

        let err = QuoteConfig::from_toml_str("not toml = = =").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn duplicate_machines_are_rejected() {
        let mut config = QuoteConfig::default();
        config.machines.push(MachineSpec {
            name: "DW-HP120".into(),
            total_price: 1,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateMachine(_))
        ));
    }

    #[test]
    fn seeded_316l_history_matches_reference_totals() {
        let config = QuoteConfig::default();
        let steel = &config.materials[0];
        let weight: f64 = steel.samples.iter().map(|s| s.weight_g).sum();
        let time: f64 = steel.samples.iter().map(|s| s.time_min).sum();
        assert!((weight - 680.0).abs() < 1e-9);
        assert!((time - 12_828.0).abs() < 1e-9);
    }
}
