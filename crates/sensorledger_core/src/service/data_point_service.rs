//! Data point lifecycle service.
//!
//! # Responsibility
//! - Validate arguments, compute alerts, and persist canonical records
//!   through an injected `StateStore`.
//! - Gate the consensus alert recheck on caller organization.
//!
//! # Invariants
//! - Argument validation always runs before any backend access.
//! - Every failing operation leaves the backend untouched.
//! - No operation clears a non-empty alert.
//! - Enumeration never fails on a single undecodable entry.

use crate::config::ContractSettings;
use crate::identity::CallerIdentity;
use crate::model::data_point::{
    alert_message, exceeds_threshold, initial_alert, validate_id, validate_temperature,
    CodecError, DataPoint, ValidationError,
};
use crate::state::{StateError, StateStore};
use log::{debug, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Organization owning every seeded record.
const SEED_OWNER: &str = "Org1";

/// `(id, temperature)` of the records written by `init_ledger`.
const SEED_DATA_POINTS: [(&str, f64); 5] = [
    ("data1", 20.0),
    ("data2", 25.0),
    ("data3", 18.0),
    ("data4", 22.0),
    ("data5", 24.0),
];

pub type ContractResult<T> = Result<T, ContractError>;

/// Failure of a data point operation.
#[derive(Debug)]
pub enum ContractError {
    /// Malformed `id` or `temperature`.
    InvalidArgument(ValidationError),
    /// `add_data_point` on an existing ID.
    AlreadyExists(String),
    /// Operation on an ID with no stored record.
    NotFound(String),
    /// Caller organization is not allowed to run the operation.
    PermissionDenied { caller: String, required: String },
    /// Stored bytes could not be decoded, or output could not be encoded.
    Codec(CodecError),
    /// Backend failure.
    State(StateError),
}

impl Display for ContractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "invalid argument: {err}"),
            Self::AlreadyExists(id) => write!(f, "the data point {id} already exists"),
            Self::NotFound(id) => write!(f, "the data point {id} does not exist"),
            Self::PermissionDenied { caller, required } => write!(
                f,
                "caller organization `{caller}` is not permitted; requires `{required}`"
            ),
            Self::Codec(err) => write!(f, "{err}"),
            Self::State(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::State(err) => Some(err),
            Self::AlreadyExists(_) | Self::NotFound(_) | Self::PermissionDenied { .. } => None,
        }
    }
}

impl From<ValidationError> for ContractError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<CodecError> for ContractError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<StateError> for ContractError {
    fn from(value: StateError) -> Self {
        Self::State(value)
    }
}

/// One item of a full-catalog enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    /// Value decoded as a data point.
    Record(DataPoint),
    /// Undecodable value, kept as lossy UTF-8 text.
    Raw(String),
}

impl CatalogEntry {
    /// JSON form used when rendering the catalog.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Record(record) => record.canonical_value(),
            Self::Raw(text) => Value::String(text.clone()),
        }
    }

    pub fn as_record(&self) -> Option<&DataPoint> {
        match self {
            Self::Record(record) => Some(record),
            Self::Raw(_) => None,
        }
    }
}

/// Result of `consensus_on_threshold_crossed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecheckOutcome {
    /// Alert was missing or stale and has been rewritten.
    AlertRaised,
    /// Stored alert already matches; nothing written.
    AlreadyCurrent,
    /// Temperature does not exceed the threshold; nothing written.
    WithinThreshold,
}

/// Use-case service over a world-state backend.
pub struct DataPointService<S: StateStore> {
    store: S,
    settings: ContractSettings,
}

impl<S: StateStore> DataPointService<S> {
    /// Creates a service with default settings.
    pub fn new(store: S) -> Self {
        Self::with_settings(store, ContractSettings::default())
    }

    pub fn with_settings(store: S, settings: ContractSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ContractSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Seeds `data1`..`data5` owned by `Org1`.
    ///
    /// Seed records always carry an empty alert, including the ones above
    /// the threshold. Re-running overwrites the same five keys and leaves
    /// every other key alone.
    pub fn init_ledger(&self) -> ContractResult<()> {
        for (id, temperature) in SEED_DATA_POINTS {
            self.write(&DataPoint::new(id, temperature, "", SEED_OWNER))?;
        }
        info!(
            "event=ledger_init module=service status=ok records={}",
            SEED_DATA_POINTS.len()
        );
        Ok(())
    }

    /// Creates a new record, raising an alert when above threshold.
    ///
    /// # Errors
    /// - `InvalidArgument` for an empty `id` or out-of-range temperature.
    /// - `AlreadyExists` when `id` is taken.
    pub fn add_data_point(
        &self,
        id: &str,
        temperature: f64,
        owner: &str,
    ) -> ContractResult<DataPoint> {
        validate_id(id)?;
        validate_temperature(temperature)?;

        if self.data_point_exists(id)? {
            return Err(ContractError::AlreadyExists(id.to_string()));
        }

        let alert = initial_alert(id, temperature, self.settings.threshold);
        let record = DataPoint::new(id, temperature, alert, owner);
        self.write(&record)?;

        info!(
            "event=data_point_add module=service status=ok id={id} alert={}",
            record.has_alert()
        );
        Ok(record)
    }

    /// Returns the stored canonical JSON of one record.
    pub fn read_data_point(&self, id: &str) -> ContractResult<String> {
        validate_id(id)?;
        let bytes = self.load_bytes(id)?;
        let text = String::from_utf8(bytes).map_err(CodecError::NotUtf8)?;
        debug!("event=data_point_read module=service status=ok id={id}");
        Ok(text)
    }

    /// Returns one decoded record.
    pub fn get_data_point(&self, id: &str) -> ContractResult<DataPoint> {
        validate_id(id)?;
        self.load(id)
    }

    /// Replaces the temperature of an existing record.
    ///
    /// An alert is raised only when the new reading exceeds the threshold
    /// and no alert is stored yet; an existing alert is never cleared or
    /// refreshed here.
    pub fn update_data_point(&self, id: &str, temperature: f64) -> ContractResult<DataPoint> {
        validate_id(id)?;
        validate_temperature(temperature)?;

        let mut record = self.load(id)?;
        record.temperature = temperature;
        if exceeds_threshold(temperature, self.settings.threshold) && !record.has_alert() {
            record.alert = alert_message(id, temperature, self.settings.threshold);
        }
        self.write(&record)?;

        info!(
            "event=data_point_update module=service status=ok id={id} alert={}",
            record.has_alert()
        );
        Ok(record)
    }

    /// True iff a non-empty value is stored at `id`.
    ///
    /// Does not validate `id`; public callers validate first.
    pub fn data_point_exists(&self, id: &str) -> ContractResult<bool> {
        let value = self.store.get_state(id)?;
        Ok(value.is_some_and(|bytes| !bytes.is_empty()))
    }

    /// Removes a record.
    pub fn delete_data_point(&self, id: &str) -> ContractResult<()> {
        validate_id(id)?;
        if !self.data_point_exists(id)? {
            return Err(ContractError::NotFound(id.to_string()));
        }
        self.store.delete_state(id)?;
        info!("event=data_point_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Reassigns a record to `new_owner`.
    ///
    /// `new_owner` is stored as given; only `id` is validated.
    pub fn transfer_data_point(&self, id: &str, new_owner: &str) -> ContractResult<DataPoint> {
        validate_id(id)?;
        let mut record = self.load(id)?;
        let previous_owner = std::mem::replace(&mut record.owner, new_owner.to_string());
        self.write(&record)?;

        info!(
            "event=data_point_transfer module=service status=ok id={id} from={previous_owner} to={new_owner}"
        );
        Ok(record)
    }

    /// Scans the whole key space in backend key order.
    ///
    /// Values that do not decode as data points are returned as
    /// `CatalogEntry::Raw` instead of failing the scan. Backend errors
    /// still abort.
    pub fn list_data_points(&self) -> ContractResult<Vec<CatalogEntry>> {
        let mut entries = Vec::new();
        let mut fallbacks = 0usize;

        for entry in self
            .store
            .range_scan("", "", self.settings.scan_page_size)
        {
            let entry = entry?;
            match DataPoint::from_bytes(&entry.value) {
                Ok(record) => entries.push(CatalogEntry::Record(record)),
                Err(err) => {
                    warn!(
                        "event=catalog_decode module=service status=fallback key={} error={err}",
                        entry.key
                    );
                    fallbacks += 1;
                    entries.push(CatalogEntry::Raw(
                        String::from_utf8_lossy(&entry.value).into_owned(),
                    ));
                }
            }
        }

        debug!(
            "event=catalog_list module=service status=ok entries={} fallbacks={fallbacks}",
            entries.len()
        );
        Ok(entries)
    }

    /// Renders the whole catalog as a pretty-printed JSON array.
    pub fn get_all_data_points(&self) -> ContractResult<String> {
        let values: Vec<Value> = self
            .list_data_points()?
            .iter()
            .map(CatalogEntry::to_value)
            .collect();
        serde_json::to_string_pretty(&values)
            .map_err(|err| ContractError::Codec(CodecError::Encode(err)))
    }

    /// Re-derives the alert of one record from its current temperature.
    ///
    /// Only the configured authorized organization may call this. A write
    /// happens only when the temperature exceeds the threshold and the
    /// stored alert differs from the canonical message, so repeated calls
    /// are no-ops. `id` is not validated here.
    ///
    /// # Errors
    /// - `PermissionDenied` for any other caller organization, checked first.
    /// - `NotFound` when no record is stored at `id`.
    pub fn consensus_on_threshold_crossed(
        &self,
        caller: &dyn CallerIdentity,
        id: &str,
    ) -> ContractResult<RecheckOutcome> {
        let caller_org = caller.caller_org();
        if caller_org != self.settings.authorized_org {
            warn!(
                "event=alert_recheck module=service status=denied id={id} caller={caller_org}"
            );
            return Err(ContractError::PermissionDenied {
                caller: caller_org,
                required: self.settings.authorized_org.clone(),
            });
        }

        let mut record = self.load(id)?;
        let threshold = self.settings.threshold;
        if !exceeds_threshold(record.temperature, threshold) {
            return Ok(RecheckOutcome::WithinThreshold);
        }

        let message = alert_message(id, record.temperature, threshold);
        if record.alert == message {
            return Ok(RecheckOutcome::AlreadyCurrent);
        }

        record.alert = message;
        self.write(&record)?;
        info!("event=alert_recheck module=service status=ok id={id} outcome=alert_raised");
        Ok(RecheckOutcome::AlertRaised)
    }

    fn load_bytes(&self, id: &str) -> ContractResult<Vec<u8>> {
        match self.store.get_state(id)? {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(ContractError::NotFound(id.to_string())),
        }
    }

    fn load(&self, id: &str) -> ContractResult<DataPoint> {
        let bytes = self.load_bytes(id)?;
        Ok(DataPoint::from_bytes(&bytes)?)
    }

    fn write(&self, record: &DataPoint) -> ContractResult<()> {
        let bytes = record.to_canonical_bytes()?;
        self.store.put_state(&record.id, &bytes)?;
        Ok(())
    }
}
