//! Configuration loading and management for the HR engine.
//!
//! Defaults come from a YAML file; the `app_settings` table can override
//! individual policy values at runtime (see [`Policy::apply_setting`]).
//!
//! # Example
//!
//! ```no_run
//! use hr_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/hr.yaml").unwrap();
//! println!("Company: {}", config.config().company.name);
//! ```

mod loader;
mod policy;
mod types;

pub use loader::{ConfigLoader, DATABASE_PATH_ENV};
pub use policy::{Policy, keys};
pub use types::{
    AlertsConfig, AppConfig, CompanyConfig, DatabaseConfig, GeneralConfig, LatePenaltyType,
    VacationMethod, WorkScheduleConfig,
};
