//! Vendor data model
//!
//! Typed views over the Ringo JSON payloads. Unknown fields are kept in an
//! `extra` map where callers may want to pass records through untouched.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Vendor boolean, sent either as `true`/`false` or as `0`/`1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flag(i64);

#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

impl Flag {
    /// Flag set to 1
    pub const ON: Flag = Flag(1);
    /// Flag set to 0
    pub const OFF: Flag = Flag(0);

    /// Raw integer value
    pub fn value(self) -> i64 {
        self.0
    }

    /// Truthy in the vendor's loose sense (any non-zero value)
    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Flag(i64::from(value))
    }
}

impl From<FlagRepr> for Flag {
    fn from(repr: FlagRepr) -> Self {
        match repr {
            FlagRepr::Bool(b) => Flag::from(b),
            FlagRepr::Int(i) => Flag(i),
        }
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        FlagRepr::deserialize(deserializer).map(Flag::from)
    }
}

impl JsonSchema for Flag {
    fn schema_name() -> String {
        "Flag".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        FlagRepr::json_schema(gen)
    }
}

/// Composite identifier of a single controllable door mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct LockRef {
    /// Lock controller id
    pub lock_id: i64,
    /// Relay on that controller
    pub relay_id: i64,
}

impl LockRef {
    /// Create a lock/relay pair
    pub fn new(lock_id: i64, relay_id: i64) -> Self {
        Self { lock_id, relay_id }
    }
}

impl fmt::Display for LockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock_id={}, relay_id={}", self.lock_id, self.relay_id)
    }
}

/// Lock record from `GET /locks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Lock controller id
    pub lock_id: i64,
    /// Relay id
    pub relay_id: i64,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Remaining vendor fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LockInfo {
    /// Identifier pair of this lock
    pub fn lock_ref(&self) -> LockRef {
        LockRef::new(self.lock_id, self.relay_id)
    }
}

/// Absolute validity window, in vendor epoch units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange {
    /// Window start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    /// Window end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
}

/// Recurring weekly window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WeeklySchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monday: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thursday: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friday: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturday: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunday: Option<Flag>,
    /// Daily start, vendor time string (e.g. `08:00`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Daily end, vendor time string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl WeeklySchedule {
    /// Weekday flags, Monday first
    pub fn weekdays(&self) -> [Option<Flag>; 7] {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
    }
}

/// One validity entry of a key. Fields belonging to the other variant are
/// ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScheduleEntry {
    /// Absolute start/end window
    Date(DateRange),
    /// Recurring weekly window
    Schedule(WeeklySchedule),
}

/// PIN assigned to a person on a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PinAssignment {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub firstname: String,
    pub lastname: String,
    pub pin: String,
}

/// Digital key record from `GET /key-list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalKey {
    /// Vendor-issued key string
    pub digital_key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_valid: Option<Flag>,
    #[serde(default)]
    pub is_ended: Option<Flag>,
    /// Lock/relay pairs this key opens
    #[serde(default, deserialize_with = "lenient_list")]
    pub locks: Vec<LockRef>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub times: Vec<ScheduleEntry>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub pins: Vec<PinAssignment>,
    /// Remaining vendor fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept `null` as an empty list and drop entries that don't parse, so an
/// odd auxiliary field never discards the whole key record.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("Ignoring unrecognized key entry: {e}");
                None
            }
        })
        .collect())
}

impl DigitalKey {
    /// Valid and not ended. Missing flags count as unusable.
    pub fn is_usable(&self) -> bool {
        self.is_valid.map(Flag::value) == Some(1) && self.is_ended.map(Flag::value) == Some(0)
    }

    /// Whether this key grants `target` (exact match on both ids)
    pub fn grants(&self, target: LockRef) -> bool {
        self.locks.iter().any(|granted| *granted == target)
    }
}

/// Response of `GET /key?digital_key=...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStatus {
    #[serde(default)]
    pub valid: Option<Flag>,
    /// Remaining vendor fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeyStatus {
    /// Whether the vendor reports the key as valid
    pub fn is_valid(&self) -> bool {
        self.valid.is_some_and(Flag::is_set)
    }
}

/// Body of `POST /key` and `PUT /key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySpec {
    pub name: String,
    pub times: Vec<ScheduleEntry>,
    pub locks: Vec<LockRef>,
    #[serde(serialize_with = "serialize_bool_as_int")]
    pub use_pin: bool,
    pub pins: Vec<PinAssignment>,
}

fn serialize_bool_as_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Pull the `data` array out of a vendor envelope, if there is one
pub fn envelope_items(response: &Value) -> Option<&Vec<Value>> {
    response.get("data").and_then(Value::as_array)
}

/// Parse the records of a `data` envelope, skipping malformed ones
pub fn parse_items<T: serde::de::DeserializeOwned>(response: &Value, kind: &str) -> Vec<T> {
    envelope_items(response)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match serde_json::from_value(item.clone()) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        tracing::warn!("Skipping malformed {kind} record: {e}");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `status` field of an action response, e.g. `{"status": 200}`
pub fn response_status(response: &Value) -> Option<i64> {
    response.get("status").and_then(Value::as_i64)
}
