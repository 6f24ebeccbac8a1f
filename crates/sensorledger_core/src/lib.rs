//! Core domain logic for the SensorLedger catalog.
//! This crate owns record validation, alert rules and canonical encoding;
//! persistence and caller identity are injected.

pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod service;
pub mod state;

pub use config::{ConfigError, ContractSettings, DEFAULT_AUTHORIZED_ORG};
pub use identity::{CallerIdentity, StaticIdentity};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::data_point::{
    alert_message, exceeds_threshold, validate_id, validate_temperature, CodecError, DataPoint,
    ValidationError, DATA_POINT_DOC_TYPE, DEFAULT_ALERT_THRESHOLD, MAX_TEMPERATURE,
    MIN_TEMPERATURE,
};
pub use service::data_point_service::{
    CatalogEntry, ContractError, ContractResult, DataPointService, RecheckOutcome,
};
pub use state::{
    MemoryStateStore, RangeScan, SqliteStateStore, StateEntry, StateError, StateResult,
    StateStore,
};

/// Minimal health-check API for CLI smoke runs.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
