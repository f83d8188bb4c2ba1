use serde_json::Value;

/// A data item destined for a staged line-delimited JSON file. Plain JSON passes straight
/// through; non-JSON scalars (raw bytes, high-precision timestamps) are carried through the
/// `puae-jsonl` line format by encoding them as strings tagged with a Unicode private-use-area
/// marker, so the normalize stage can tell a tagged scalar apart from an ordinary JSON string
/// without a side-channel schema lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum DataItem {
    Json(Value),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

/// Marks an encoded scalar; chosen from the Unicode private-use area so it can never collide
/// with a legitimate string the caller meant literally.
const PUA_MARKER: char = '\u{f026}';

pub fn encode(item: &DataItem) -> Value {
    match item {
        DataItem::Json(v) => v.clone(),
        DataItem::Bytes(bytes) => Value::String(format!("{PUA_MARKER}b{}", hex_encode(bytes))),
        DataItem::Timestamp(millis) => Value::String(format!("{PUA_MARKER}t{millis}")),
    }
}

pub fn decode(value: &Value) -> DataItem {
    if let Value::String(s) = value {
        if let Some(rest) = s.strip_prefix(PUA_MARKER) {
            if let Some(hex) = rest.strip_prefix('b') {
                if let Some(bytes) = hex_decode(hex) {
                    return DataItem::Bytes(bytes);
                }
            }
            if let Some(millis) = rest.strip_prefix('t') {
                if let Ok(millis) = millis.parse::<i64>() {
                    return DataItem::Timestamp(millis);
                }
            }
        }
    }
    DataItem::Json(value.clone())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalars_pass_through_unchanged() {
        let item = DataItem::Json(serde_json::json!({"a": 1}));
        let encoded = encode(&item);
        assert_eq!(decode(&encoded), item);
    }

    #[test]
    fn bytes_round_trip_through_the_pua_marker() {
        let item = DataItem::Bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        let encoded = encode(&item);
        assert!(matches!(encoded, Value::String(ref s) if s.starts_with(PUA_MARKER)));
        assert_eq!(decode(&encoded), item);
    }

    #[test]
    fn timestamps_round_trip_through_the_pua_marker() {
        let item = DataItem::Timestamp(1_700_000_000_000);
        let encoded = encode(&item);
        assert_eq!(decode(&encoded), item);
    }

    #[test]
    fn a_plain_string_that_merely_starts_with_b_is_not_mistaken_for_encoded_bytes() {
        let item = DataItem::Json(Value::String("b-side".to_string()));
        let encoded = encode(&item);
        assert_eq!(decode(&encoded), item);
    }
}
