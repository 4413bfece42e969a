//! Decoder for one revision of the outage feed.

use outage_core::record::OutageRecord;

use crate::Result;

/// Parse a feed document (a JSON array of outage objects), preserving record
/// order. Field types are not validated here; coercion happens later.
pub fn decode(bytes: &[u8]) -> Result<Vec<OutageRecord>> {
  Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn decodes_records_in_order() {
    let doc = br#"[
      {"outageNumber": "2", "hazardFlag": 0},
      {"outageNumber": 1, "latitude": "37.1"}
    ]"#;

    let records = decode(doc).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("outageNumber"), Some(&json!("2")));
    assert_eq!(records[1].get("outageNumber"), Some(&json!(1)));
  }

  #[test]
  fn empty_array_is_no_records() {
    assert!(decode(b"[]").unwrap().is_empty());
  }

  #[test]
  fn rejects_non_array_documents() {
    assert!(matches!(decode(br#"{"outageNumber": 1}"#), Err(crate::Error::Json(_))));
    assert!(matches!(decode(b"[1, 2]"), Err(crate::Error::Json(_))));
    assert!(matches!(decode(b""), Err(crate::Error::Json(_))));
  }
}
