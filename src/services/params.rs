//! Parameter types for the named remote actions

use crate::client::models::{Flag, KeySpec, LockRef, PinAssignment, ScheduleEntry};
use crate::error::{Result, RingoError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters of `create_key`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreateKeyParams {
    #[schemars(description = "Display name of the key")]
    pub name: String,
    #[schemars(description = "Validity entries, each of type date or schedule")]
    pub times: Vec<ScheduleEntry>,
    #[schemars(description = "Lock/relay pairs the key opens")]
    pub locks: Vec<LockRef>,
    #[schemars(description = "Whether the key requires a PIN (bool or 0/1)")]
    pub use_pin: Flag,
    #[serde(default)]
    #[schemars(description = "PIN holders")]
    pub pins: Option<Vec<PinAssignment>>,
}

impl CreateKeyParams {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_binary("use_pin", self.use_pin)?;

        for lock in &self.locks {
            if lock.lock_id < 0 || lock.relay_id < 0 {
                return Err(RingoError::invalid_input(format!(
                    "lock_id and relay_id must be non-negative ({lock})"
                )));
            }
        }

        for entry in &self.times {
            if let ScheduleEntry::Schedule(schedule) = entry {
                for flag in schedule.weekdays().into_iter().flatten() {
                    require_binary("weekday", flag)?;
                }
            }
        }

        for pin in self.pins.iter().flatten() {
            require_text("email", &pin.email)?;
            require_text("firstname", &pin.firstname)?;
            require_text("lastname", &pin.lastname)?;
            require_text("pin", &pin.pin)?;
        }

        Ok(())
    }

    /// Request body for the vendor; missing pins become an empty list
    pub fn to_spec(&self) -> KeySpec {
        KeySpec {
            name: self.name.clone(),
            times: self.times.clone(),
            locks: self.locks.clone(),
            use_pin: self.use_pin.is_set(),
            pins: self.pins.clone().unwrap_or_default(),
        }
    }
}

/// Parameters of `update_key`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UpdateKeyParams {
    #[schemars(description = "Key to update")]
    pub digital_key: String,
    #[serde(flatten)]
    pub key: CreateKeyParams,
}

impl UpdateKeyParams {
    pub fn validate(&self) -> Result<()> {
        require_text("digital_key", &self.digital_key)?;
        self.key.validate()
    }
}

/// Parameters of actions addressing one key (`delete_key`, `get_key_status`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DigitalKeyParams {
    #[schemars(description = "Vendor digital key string")]
    pub digital_key: String,
}

impl DigitalKeyParams {
    pub fn validate(&self) -> Result<()> {
        require_text("digital_key", &self.digital_key)
    }
}

/// Parameters of `set_digital_key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SetDigitalKeyParams {
    #[schemars(description = "Lock entity id (\"{lock_id}_{relay_id}\")")]
    pub entity_id: String,
    #[schemars(description = "Key to pin on the lock")]
    pub digital_key: String,
}

impl SetDigitalKeyParams {
    pub fn validate(&self) -> Result<()> {
        require_text("entity_id", &self.entity_id)?;
        require_text("digital_key", &self.digital_key)
    }
}

/// Parameters of the list actions, which take none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RingoError::invalid_input(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_binary(field: &str, flag: Flag) -> Result<()> {
    if !matches!(flag.value(), 0 | 1) {
        return Err(RingoError::invalid_input(format!(
            "{field} must be a boolean or 0/1, got {}",
            flag.value()
        )));
    }
    Ok(())
}
