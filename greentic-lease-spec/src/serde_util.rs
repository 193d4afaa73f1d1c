//! Wire helpers for signed durations.
//!
//! Durations travel as signed 64-bit integer nanoseconds. Negative values are
//! accepted on decode so validation, not the decoder, reports them.

use time::Duration;

pub(crate) fn to_nanos(value: &Duration) -> Option<i64> {
    i64::try_from(value.whole_nanoseconds()).ok()
}

pub mod duration_nanos {
    use super::to_nanos;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = to_nanos(value)
            .ok_or_else(|| S::Error::custom(format!("duration {value} overflows i64 nanoseconds")))?;
        serializer.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = i64::deserialize(deserializer)?;
        Ok(Duration::nanoseconds(nanos))
    }
}

pub mod option_duration_nanos {
    use super::duration_nanos;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => duration_nanos::serialize(duration, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Duration::nanoseconds))
    }
}
