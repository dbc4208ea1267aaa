#![forbid(unsafe_code)]

pub mod app_services;
pub mod cost_calculator;
pub mod efficiency_service;
pub mod error;
pub mod machine_config_service;
pub mod quote_service;
pub mod seed;
pub mod statistics_service;
pub mod work_order_service;

pub use slm_core::{Clock, QuoteConfig};

pub use app_services::AppServices;
pub use cost_calculator::{CostCalculator, CostTable};
pub use efficiency_service::{EfficiencyService, MaterialEfficiency};
pub use error::{
    AppServicesError, MachineConfigServiceError, QuoteServiceError, WorkOrderServiceError,
};
pub use machine_config_service::{ActiveMachine, MachineConfigService};
pub use quote_service::QuoteService;
pub use seed::{SeedReport, ensure_cold_start_data};
pub use statistics_service::{MaterialOrderCount, OverviewStats, StatisticsService};
pub use work_order_service::{RecordedWorkOrder, WorkOrderService};
