use crate::error::{Error, Result};
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Backend-private payload stored alongside a lease.
///
/// The lease manager persists this mapping and hands it back unchanged at
/// renewal and revocation time. It never inspects or mutates the contents.
/// Backends should store identifiers rather than single-use tokens so the
/// payload stays valid when a revocation is replayed.
#[derive(Clone, Default, PartialEq)]
pub struct InternalData(BTreeMap<String, Value>);

impl InternalData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a typed payload. The value must serialize to an object.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self(map.into_iter().collect())),
            Ok(other) => Err(Error::InvalidInternalData(format!(
                "expected an object, got {}",
                kind(&other)
            ))),
            Err(err) => Err(Error::InvalidInternalData(err.to_string())),
        }
    }

    /// Decode the whole payload into a typed value.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        let object: serde_json::Map<String, Value> = self.0.clone().into_iter().collect();
        serde_json::from_value(Value::Object(object))
            .map_err(|err| Error::InvalidInternalData(err.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode a single entry.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.0
            .get(key)
            .map(|value| {
                T::deserialize(value)
                    .map_err(|err| Error::InvalidInternalData(format!("{key}: {err}")))
            })
            .transpose()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// Values may hold credentials; only key names are printed.
impl fmt::Debug for InternalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalData")
            .field("keys", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<BTreeMap<String, Value>> for InternalData {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self(value)
    }
}

impl FromIterator<(String, Value)> for InternalData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for InternalData {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// An explicit null is read as empty. A missing field stays an error.
impl<'de> Deserialize<'de> for InternalData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        deserializer.deserialize_any(InternalDataVisitor)
    }
}

struct InternalDataVisitor;

impl<'de> Visitor<'de> for InternalDataVisitor {
    type Value = InternalData;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object or null")
    }

    fn visit_unit<E: de::Error>(self) -> core::result::Result<Self::Value, E> {
        Ok(InternalData::default())
    }

    fn visit_none<E: de::Error>(self) -> core::result::Result<Self::Value, E> {
        Ok(InternalData::default())
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut access: A,
    ) -> core::result::Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(InternalData(map))
    }
}
