use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slm_core::config::MaterialSpec;
use slm_core::model::{
    MachineConfig, MachineConfigId, Material, MaterialId, WorkOrder, WorkOrderId,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Insert shape for a material; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMaterialRecord {
    pub name: String,
    pub default_efficiency: f64,
    pub description: String,
}

impl NewMaterialRecord {
    #[must_use]
    pub fn from_spec(spec: &MaterialSpec) -> Self {
        Self {
            name: spec.name.trim().to_owned(),
            default_efficiency: spec.default_efficiency,
            description: spec.description.clone(),
        }
    }
}

/// Insert shape for a work order; `material_id` must reference a stored material.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkOrderRecord {
    pub material_id: MaterialId,
    pub weight_g: f64,
    pub time_min: f64,
    pub is_lattice: bool,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Machine selection to activate. A row with the same machine and horizon is
/// reused rather than duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMachineConfigRecord {
    pub machine_name: String,
    pub total_price: u64,
    pub depreciation_years: u32,
    pub updated_at: DateTime<Utc>,
}

/// Which work orders an aggregate covers. `None` means "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkOrderFilter {
    pub material_id: Option<MaterialId>,
    pub is_lattice: Option<bool>,
}

impl WorkOrderFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_material(material_id: MaterialId) -> Self {
        Self {
            material_id: Some(material_id),
            is_lattice: None,
        }
    }

    /// Records of one material that may feed efficiency estimates.
    #[must_use]
    pub fn efficiency_samples(material_id: MaterialId) -> Self {
        Self {
            material_id: Some(material_id),
            is_lattice: Some(false),
        }
    }

    #[must_use]
    pub fn lattice(mut self, is_lattice: bool) -> Self {
        self.is_lattice = Some(is_lattice);
        self
    }

    fn matches(&self, order: &WorkOrder) -> bool {
        self.material_id.is_none_or(|id| order.material_id() == id)
            && self.is_lattice.is_none_or(|flag| order.is_lattice() == flag)
    }
}

/// Count and sums over a filtered set of work orders.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkOrderAggregate {
    pub count: u32,
    pub total_weight_g: f64,
    pub total_time_min: f64,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Return the material with this name, creating it if missing.
    ///
    /// An existing material keeps its stored efficiency and description.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the material cannot be stored or read back.
    async fn ensure_material(&self, material: NewMaterialRecord) -> Result<Material, StorageError>;

    /// Fetch a material by exact name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn get_material_by_name(&self, name: &str) -> Result<Option<Material>, StorageError>;

    /// All materials ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn list_materials(&self) -> Result<Vec<Material>, StorageError>;
}

#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Append a work order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the material does not exist, or
    /// other storage errors.
    async fn insert_work_order(&self, order: NewWorkOrderRecord)
    -> Result<WorkOrderId, StorageError>;

    /// Delete a work order. Returns `false` when nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn delete_work_order(&self, id: WorkOrderId) -> Result<bool, StorageError>;

    /// Newest work orders first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn recent_work_orders(&self, limit: u32) -> Result<Vec<WorkOrder>, StorageError>;

    /// Count, total weight and total time over the filtered orders.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn aggregate(&self, filter: WorkOrderFilter) -> Result<WorkOrderAggregate, StorageError>;
}

#[async_trait]
pub trait MachineConfigRepository: Send + Sync {
    /// Make `config` the single active configuration.
    ///
    /// Deactivating the previous configuration and activating the new one
    /// happen atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the swap cannot be committed.
    async fn activate(&self, config: NewMachineConfigRecord)
    -> Result<MachineConfig, StorageError>;

    /// The active configuration, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn active_config(&self) -> Result<Option<MachineConfig>, StorageError>;

    /// Every stored configuration ordered by id, with the active flag set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn list_configs(&self) -> Result<Vec<MachineConfig>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MachineState {
    configs: Vec<MachineConfig>,
    active: Option<MachineConfigId>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    materials: Arc<Mutex<Vec<Material>>>,
    work_orders: Arc<Mutex<BTreeMap<WorkOrderId, WorkOrder>>>,
    machines: Arc<Mutex<MachineState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn next_id(last: Option<u64>) -> u64 {
    last.map_or(1, |id| id + 1)
}

#[async_trait]
impl MaterialRepository for InMemoryRepository {
    async fn ensure_material(&self, material: NewMaterialRecord) -> Result<Material, StorageError> {
        let mut guard = self.materials.lock().map_err(poisoned)?;
        if let Some(existing) = guard.iter().find(|m| m.name() == material.name) {
            return Ok(existing.clone());
        }

        let id = MaterialId::new(next_id(guard.last().map(|m| m.id().value())));
        let created = Material::new(
            id,
            material.name,
            material.default_efficiency,
            material.description,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.push(created.clone());
        Ok(created)
    }

    async fn get_material_by_name(&self, name: &str) -> Result<Option<Material>, StorageError> {
        let guard = self.materials.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|m| m.name() == name).cloned())
    }

    async fn list_materials(&self) -> Result<Vec<Material>, StorageError> {
        let guard = self.materials.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl WorkOrderRepository for InMemoryRepository {
    async fn insert_work_order(
        &self,
        order: NewWorkOrderRecord,
    ) -> Result<WorkOrderId, StorageError> {
        let material_name = {
            let materials = self.materials.lock().map_err(poisoned)?;
            materials
                .iter()
                .find(|m| m.id() == order.material_id)
                .map(|m| m.name().to_owned())
                .ok_or(StorageError::NotFound)?
        };

        let mut guard = self.work_orders.lock().map_err(poisoned)?;
        let id = WorkOrderId::new(next_id(guard.keys().next_back().map(WorkOrderId::value)));
        guard.insert(
            id,
            WorkOrder::from_persisted(
                id,
                order.material_id,
                material_name,
                order.weight_g,
                order.time_min,
                order.is_lattice,
                order.note,
                order.created_at,
            ),
        );
        Ok(id)
    }

    async fn delete_work_order(&self, id: WorkOrderId) -> Result<bool, StorageError> {
        let mut guard = self.work_orders.lock().map_err(poisoned)?;
        Ok(guard.remove(&id).is_some())
    }

    async fn recent_work_orders(&self, limit: u32) -> Result<Vec<WorkOrder>, StorageError> {
        let guard = self.work_orders.lock().map_err(poisoned)?;
        let mut orders: Vec<WorkOrder> = guard.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        orders.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(orders)
    }

    async fn aggregate(&self, filter: WorkOrderFilter) -> Result<WorkOrderAggregate, StorageError> {
        let guard = self.work_orders.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|order| filter.matches(order))
            .fold(WorkOrderAggregate::default(), |mut acc, order| {
                acc.count += 1;
                acc.total_weight_g += order.weight_g();
                acc.total_time_min += order.time_min();
                acc
            }))
    }
}

#[async_trait]
impl MachineConfigRepository for InMemoryRepository {
    async fn activate(
        &self,
        config: NewMachineConfigRecord,
    ) -> Result<MachineConfig, StorageError> {
        // One lock covers both the row upsert and the active pointer.
        let mut state = self.machines.lock().map_err(poisoned)?;

        let existing = state.configs.iter().position(|c| {
            c.machine_name() == config.machine_name
                && c.depreciation_years() == config.depreciation_years
        });
        let id = match existing {
            Some(idx) => state.configs[idx].id(),
            None => MachineConfigId::new(next_id(state.configs.last().map(|c| c.id().value()))),
        };

        let stored = MachineConfig::new(
            id,
            config.machine_name,
            config.total_price,
            config.depreciation_years,
            false,
            config.updated_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        match existing {
            Some(idx) => state.configs[idx] = stored.clone(),
            None => state.configs.push(stored.clone()),
        }
        state.active = Some(id);

        Ok(stored.with_active(true))
    }

    async fn active_config(&self) -> Result<Option<MachineConfig>, StorageError> {
        let state = self.machines.lock().map_err(poisoned)?;
        Ok(state.active.and_then(|id| {
            state
                .configs
                .iter()
                .find(|c| c.id() == id)
                .map(|c| c.clone().with_active(true))
        }))
    }

    async fn list_configs(&self) -> Result<Vec<MachineConfig>, StorageError> {
        let state = self.machines.lock().map_err(poisoned)?;
        Ok(state
            .configs
            .iter()
            .map(|c| c.clone().with_active(state.active == Some(c.id())))
            .collect())
    }
}

//
// ─── STORAGE ───────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub materials: Arc<dyn MaterialRepository>,
    pub work_orders: Arc<dyn WorkOrderRepository>,
    pub machines: Arc<dyn MachineConfigRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let materials: Arc<dyn MaterialRepository> = Arc::new(repo.clone());
        let work_orders: Arc<dyn WorkOrderRepository> = Arc::new(repo.clone());
        let machines: Arc<dyn MachineConfigRepository> = Arc::new(repo);
        Self {
            materials,
            work_orders,
            machines,
        }
    }
}
