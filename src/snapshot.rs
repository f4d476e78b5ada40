use sha2::{Digest, Sha256};

/// Integrity envelope for serialized state kept outside the process
/// (the history snapshot file and the lookup cache).
///
/// The payload is stored together with its SHA-256 checksum. On read the
/// checksum is recomputed and a mismatch is treated as if nothing had been
/// stored, so callers fall back to an empty store or a fresh fetch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatedSnapshot {
    /// Payload (JSON string).
    pub data: String,
    /// SHA-256 of `data`, hex encoded.
    pub checksum: String,
}

impl ValidatedSnapshot {
    pub fn new(data: String) -> Self {
        let checksum = Self::compute_checksum(&data);
        Self { data, checksum }
    }

    /// Serializes `value` to JSON and wraps it.
    pub fn from_value<T: serde::Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_string(value)?))
    }

    fn compute_checksum(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.data) == self.checksum
    }

    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses an envelope and returns its payload if the checksum matches.
    ///
    /// Returns `None` for invalid JSON or a checksum mismatch.
    pub fn deserialize_and_validate(serialized: &str) -> Option<String> {
        let entry: ValidatedSnapshot = serde_json::from_str(serialized).ok()?;

        if entry.is_valid() {
            Some(entry.data)
        } else {
            tracing::warn!(
                "Snapshot validation failed: checksum mismatch. Expected: {}, Data length: {}",
                entry.checksum,
                entry.data.len()
            );
            None
        }
    }

    /// Like [`deserialize_and_validate`](Self::deserialize_and_validate), then
    /// decodes the payload as `T`.
    pub fn decode<T: serde::de::DeserializeOwned>(serialized: &str) -> Option<T> {
        let data = Self::deserialize_and_validate(serialized)?;
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Snapshot payload did not decode: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_validation() {
        let entry = ValidatedSnapshot::new(r#"[{"id":"search_1"}]"#.to_string());
        assert!(entry.is_valid());
    }

    #[test]
    fn test_decode_round_trip() {
        let ids = vec!["search_1".to_string(), "search_2".to_string()];
        let serialized = ValidatedSnapshot::from_value(&ids).unwrap().serialize();

        let decoded: Option<Vec<String>> = ValidatedSnapshot::decode(&serialized);
        assert_eq!(decoded, Some(ids));
    }

    #[test]
    fn test_tampered_snapshot_returns_none() {
        let serialized = ValidatedSnapshot::new(r#"{"query":"bakery"}"#.to_string()).serialize();
        let tampered = serialized.replace("bakery", "dentist");

        assert_eq!(ValidatedSnapshot::deserialize_and_validate(&tampered), None);
    }

    #[test]
    fn test_garbage_returns_none() {
        assert_eq!(ValidatedSnapshot::deserialize_and_validate("not json"), None);
        let decoded: Option<Vec<String>> = ValidatedSnapshot::decode("{}");
        assert!(decoded.is_none());
    }
}
