mod ids;
mod machine_config;
mod material;
mod quote;
mod work_order;

pub use ids::{MachineConfigId, MaterialId, ParseIdError, WorkOrderId};

pub use machine_config::{MachineConfig, MachineConfigError};
pub use material::{Material, MaterialError};
pub use quote::{
    EfficiencyEstimate, EfficiencySource, QuoteBreakdown, QuoteInputError, QuoteRequest,
};
pub use work_order::{WorkOrder, WorkOrderDraft, WorkOrderError};
