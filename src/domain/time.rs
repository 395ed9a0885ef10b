use chrono::{DateTime, Utc};

pub const ISO_MILLIS: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Parses an ISO-8601 instant from a query parameter or wire field.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for instants carried as ISO-8601 UTC strings with
/// millisecond precision, the format the remote processors expect.
pub mod iso_millis {
    use super::{parse_instant, ISO_MILLIS};
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(ISO_MILLIS))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_instant(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid instant: {raw}")))
    }
}
