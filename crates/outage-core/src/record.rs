//! Loosely typed feed records and their coercion into an [`Observation`].
//!
//! The outage feed is not strictly typed: numeric fields arrive as JSON
//! numbers or as numeric strings, and optional fields may be missing or null.
//! Coercion happens once per record, before anything touches the store, so a
//! malformed record never leaves a half-written revision behind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Field names ─────────────────────────────────────────────────────────────

pub const OUTAGE_NUMBER: &str = "outageNumber";
pub const OUTAGE_START_TIME: &str = "outageStartTime";
pub const OUTAGE_DEVICES: &str = "outageDevices";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const REGION_NAME: &str = "regionName";
pub const CAUSE: &str = "cause";
pub const CREW_CURRENT_STATUS: &str = "crewCurrentStatus";
pub const LAST_UPDATE_TIME: &str = "lastUpdateTime";
pub const CURRENT_ETOR: &str = "currentEtor";
pub const AUTO_ETOR: &str = "autoEtor";
pub const EST_CUST_AFFECTED: &str = "estCustAffected";
pub const HAZARD_FLAG: &str = "hazardFlag";

// ─── Raw record ──────────────────────────────────────────────────────────────

/// One decoded outage record: field name to string or number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutageRecord(pub Map<String, Value>);

impl OutageRecord {
  pub fn get(&self, field: &str) -> Option<&Value> { self.0.get(field) }

  /// A required integer field.
  pub fn int(&self, field: &'static str) -> Result<i64> {
    match self.get(field) {
      None => Err(Error::malformed(field, "is missing")),
      Some(v) => coerce_int(field, v),
    }
  }

  /// An optional integer field; absent and null both read as `None`.
  pub fn opt_int(&self, field: &'static str) -> Result<Option<i64>> {
    match self.get(field) {
      None | Some(Value::Null) => Ok(None),
      Some(v) => coerce_int(field, v).map(Some),
    }
  }

  /// An optional integer field where any falsy value (missing, null, zero,
  /// empty string) reads as `None`.
  pub fn truthy_int(&self, field: &'static str) -> Result<Option<i64>> {
    match self.get(field) {
      Some(v) if is_truthy(v) => match coerce_int(field, v)? {
        0 => Ok(None),
        n => Ok(Some(n)),
      },
      _ => Ok(None),
    }
  }

  /// A required text field. Numbers are rendered in their JSON form.
  pub fn text(&self, field: &'static str) -> Result<String> {
    match self.get(field) {
      None => Err(Error::malformed(field, "is missing")),
      Some(Value::Null) => Err(Error::malformed(field, "is null")),
      Some(Value::String(s)) => Ok(s.clone()),
      Some(Value::Number(n)) => Ok(n.to_string()),
      Some(other) => Err(Error::malformed(
        field,
        format!("must be a string or number, got {other}"),
      )),
    }
  }
}

impl From<Map<String, Value>> for OutageRecord {
  fn from(map: Map<String, Value>) -> Self { Self(map) }
}

fn coerce_int(field: &'static str, value: &Value) -> Result<i64> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
      .ok_or_else(|| Error::malformed(field, format!("is not an integer: {n}"))),
    Value::String(s) => s
      .trim()
      .parse()
      .map_err(|_| Error::malformed(field, format!("is not numeric: {s:?}"))),
    Value::Bool(b) => Ok(i64::from(*b)),
    Value::Null => Err(Error::malformed(field, "is null")),
    other => Err(Error::malformed(field, format!("is not numeric: {other}"))),
  }
}

fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// A feed record coerced into the fields the store persists.
///
/// `start_time` stays optional here because it is only consulted when the
/// outage is seen for the first time; the store rejects a new outage without
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
  pub outage_id:                    i64,
  pub start_time:                   Option<i64>,
  pub latitude:                     String,
  pub longitude:                    String,
  pub region:                       String,
  pub cause:                        String,
  pub crew_status:                  String,
  /// JSON-encoded device list, `[]` when absent or empty.
  pub devices:                      String,
  pub last_update_time:             Option<i64>,
  pub current_eta:                  Option<i64>,
  pub auto_eta:                     Option<i64>,
  pub estimated_customers_affected: Option<i64>,
  pub hazard_flag:                  i64,
}

impl Observation {
  /// The error reported when a first-seen outage carries no start time.
  pub fn missing_start_time() -> Error {
    Error::malformed(OUTAGE_START_TIME, "is missing or non-numeric on a new outage")
  }
}

impl TryFrom<&OutageRecord> for Observation {
  type Error = Error;

  fn try_from(record: &OutageRecord) -> Result<Self> {
    let outage_id = record.int(OUTAGE_NUMBER)?;

    let devices = match record.get(OUTAGE_DEVICES) {
      Some(v) if is_truthy(v) => serde_json::to_string(v)?,
      _ => "[]".to_owned(),
    };

    Ok(Self {
      outage_id,
      start_time: record.int(OUTAGE_START_TIME).ok(),
      latitude: record.text(LATITUDE)?,
      longitude: record.text(LONGITUDE)?,
      region: record.text(REGION_NAME)?,
      cause: record.text(CAUSE)?,
      crew_status: record.text(CREW_CURRENT_STATUS)?,
      devices,
      last_update_time: record.opt_int(LAST_UPDATE_TIME)?,
      current_eta: record.opt_int(CURRENT_ETOR)?,
      auto_eta: record.opt_int(AUTO_ETOR)?,
      estimated_customers_affected: record.truthy_int(EST_CUST_AFFECTED)?,
      hazard_flag: record.int(HAZARD_FLAG)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn record(value: Value) -> OutageRecord {
    match value {
      Value::Object(map) => OutageRecord(map),
      other => panic!("not an object: {other}"),
    }
  }

  fn full() -> Value {
    json!({
      "outageNumber": "1001",
      "outageStartTime": 1570000000,
      "latitude": "37.77",
      "longitude": -122.41,
      "regionName": "San Francisco",
      "cause": "Weather",
      "crewCurrentStatus": "En route",
      "lastUpdateTime": "1570000600",
      "currentEtor": 1570010000,
      "autoEtor": 1570020000.0,
      "estCustAffected": "42",
      "hazardFlag": "0",
      "outageDevices": [{"id": 7}]
    })
  }

  #[test]
  fn coerces_strings_and_numbers() {
    let obs = Observation::try_from(&record(full())).unwrap();

    assert_eq!(obs.outage_id, 1001);
    assert_eq!(obs.start_time, Some(1_570_000_000));
    assert_eq!(obs.latitude, "37.77");
    assert_eq!(obs.longitude, "-122.41");
    assert_eq!(obs.last_update_time, Some(1_570_000_600));
    assert_eq!(obs.auto_eta, Some(1_570_020_000));
    assert_eq!(obs.estimated_customers_affected, Some(42));
    assert_eq!(obs.hazard_flag, 0);
    assert_eq!(obs.devices, r#"[{"id":7}]"#);
  }

  #[test]
  fn optional_fields_absent_are_none() {
    let mut value = full();
    let map = value.as_object_mut().unwrap();
    for field in [LAST_UPDATE_TIME, CURRENT_ETOR, AUTO_ETOR, EST_CUST_AFFECTED, OUTAGE_DEVICES] {
      map.remove(field);
    }

    let obs = Observation::try_from(&record(value)).unwrap();
    assert_eq!(obs.last_update_time, None);
    assert_eq!(obs.current_eta, None);
    assert_eq!(obs.auto_eta, None);
    assert_eq!(obs.estimated_customers_affected, None);
    assert_eq!(obs.devices, "[]");
  }

  #[test]
  fn zero_customers_reads_as_none() {
    for zero in [json!(0), json!("0"), json!(""), Value::Null] {
      let mut value = full();
      value[EST_CUST_AFFECTED] = zero;
      let obs = Observation::try_from(&record(value)).unwrap();
      assert_eq!(obs.estimated_customers_affected, None);
    }
  }

  #[test]
  fn missing_hazard_flag_is_malformed() {
    let mut value = full();
    value.as_object_mut().unwrap().remove(HAZARD_FLAG);

    let err = Observation::try_from(&record(value)).unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { field: HAZARD_FLAG, .. }));
  }

  #[test]
  fn non_numeric_outage_number_is_malformed() {
    let mut value = full();
    value[OUTAGE_NUMBER] = json!("abc");

    let err = Observation::try_from(&record(value)).unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { field: OUTAGE_NUMBER, .. }));
  }

  #[test]
  fn null_dictionary_name_is_malformed() {
    let mut value = full();
    value[CAUSE] = Value::Null;

    let err = Observation::try_from(&record(value)).unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { field: CAUSE, .. }));
  }

  #[test]
  fn start_time_is_deferred() {
    let mut value = full();
    value.as_object_mut().unwrap().remove(OUTAGE_START_TIME);

    let obs = Observation::try_from(&record(value)).unwrap();
    assert_eq!(obs.start_time, None);
  }
}
