//! Serde helpers shared by the configuration domains

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Durations written as whole seconds, e.g. `ttl: 3600`
pub mod serde_duration {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

pub fn default_true() -> bool {
    true
}

pub fn default_false() -> bool {
    false
}
