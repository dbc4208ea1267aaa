use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::MaterialId;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MaterialError {
    #[error("material name cannot be empty")]
    EmptyName,

    #[error("default efficiency must be a positive number of g/min, got {0}")]
    InvalidDefaultEfficiency(f64),
}

/// A printable powder with its factory print rate.
///
/// The stored `default_efficiency` is never overwritten; estimates computed
/// from work-order history supersede it at read time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    id: MaterialId,
    name: String,
    default_efficiency: f64,
    description: String,
}

impl Material {
    /// Creates a material snapshot.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError` if the name is blank or the default efficiency
    /// is not a positive finite number.
    pub fn new(
        id: MaterialId,
        name: impl Into<String>,
        default_efficiency: f64,
        description: impl Into<String>,
    ) -> Result<Self, MaterialError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(MaterialError::EmptyName);
        }
        if !default_efficiency.is_finite() || default_efficiency <= 0.0 {
            return Err(MaterialError::InvalidDefaultEfficiency(default_efficiency));
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            default_efficiency,
            description: description.into().trim().to_owned(),
        })
    }

    #[must_use]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Factory print rate in g/min.
    #[must_use]
    pub fn default_efficiency(&self) -> f64 {
        self.default_efficiency
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
