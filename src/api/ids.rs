//! Lenient parsing of entity ids coming from clients.
//!
//! Browser clients send ids as numbers, numeric strings, `""` or `null`
//! (after logout). The last two mean "no id".

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

/// Parse a textual id. Blank and non-numeric text yields `None`.
pub fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

/// `deserialize_with` helper for optional id fields
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawId>::deserialize(deserializer)? {
        None => None,
        Some(RawId::Int(n)) => i32::try_from(n).ok(),
        Some(RawId::Text(s)) => parse_id(&s),
    })
}
