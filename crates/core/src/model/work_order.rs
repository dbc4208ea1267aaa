use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{MaterialId, WorkOrderId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum WorkOrderError {
    #[error("material name cannot be empty")]
    EmptyMaterial,

    #[error("weight must be greater than 0 g, got {0}")]
    NonPositiveWeight(f64),

    #[error("print time must be greater than 0 min, got {0}")]
    NonPositiveTime(f64),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// User-entered print record, not yet persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkOrderDraft {
    pub material_name: String,
    pub weight_g: f64,
    pub time_min: f64,
    pub is_lattice: bool,
    pub note: String,
}

impl WorkOrderDraft {
    /// Builds a draft from a duration entered as hours plus minutes.
    #[must_use]
    pub fn from_hours_minutes(
        material_name: impl Into<String>,
        weight_g: f64,
        hours: f64,
        minutes: f64,
        is_lattice: bool,
        note: impl Into<String>,
    ) -> Self {
        Self {
            material_name: material_name.into(),
            weight_g,
            time_min: hours * 60.0 + minutes,
            is_lattice,
            note: note.into(),
        }
    }

    /// Validate the draft and normalize its text fields.
    ///
    /// # Errors
    ///
    /// Returns `WorkOrderError` when the material is blank or the weight or
    /// duration is not strictly positive.
    pub fn validate(self) -> Result<Self, WorkOrderError> {
        let material_name = self.material_name.trim().to_owned();
        if material_name.is_empty() {
            return Err(WorkOrderError::EmptyMaterial);
        }
        if !self.weight_g.is_finite() || self.weight_g <= 0.0 {
            return Err(WorkOrderError::NonPositiveWeight(self.weight_g));
        }
        if !self.time_min.is_finite() || self.time_min <= 0.0 {
            return Err(WorkOrderError::NonPositiveTime(self.time_min));
        }

        Ok(Self {
            material_name,
            note: self.note.trim().to_owned(),
            ..self
        })
    }

    /// Print rate of this single record in g/min.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        per_record_efficiency(self.weight_g, self.time_min)
    }
}

//
// ─── WORK ORDER ────────────────────────────────────────────────────────────────
//

/// A completed print job as stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    id: WorkOrderId,
    material_id: MaterialId,
    material_name: String,
    weight_g: f64,
    time_min: f64,
    is_lattice: bool,
    note: String,
    created_at: DateTime<Utc>,
}

impl WorkOrder {
    /// Rehydrate a stored record. Values are trusted as written.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: WorkOrderId,
        material_id: MaterialId,
        material_name: String,
        weight_g: f64,
        time_min: f64,
        is_lattice: bool,
        note: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            material_id,
            material_name,
            weight_g,
            time_min,
            is_lattice,
            note,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> WorkOrderId {
        self.id
    }

    #[must_use]
    pub fn material_id(&self) -> MaterialId {
        self.material_id
    }

    #[must_use]
    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    #[must_use]
    pub fn weight_g(&self) -> f64 {
        self.weight_g
    }

    #[must_use]
    pub fn time_min(&self) -> f64 {
        self.time_min
    }

    /// Lattice records are excluded from efficiency aggregation.
    #[must_use]
    pub fn is_lattice(&self) -> bool {
        self.is_lattice
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn efficiency(&self) -> f64 {
        per_record_efficiency(self.weight_g, self.time_min)
    }
}

fn per_record_efficiency(weight_g: f64, time_min: f64) -> f64 {
    if time_min > 0.0 { weight_g / time_min } else { 0.0 }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
