//! Flat key/value mapping helpers shared by every service record.
//!
//! Records are built from, and serialized back to, a [`FieldMap`]: the shape
//! infrastructure choices arrive in from prompts, flags and stored plans.
//! Reading coerces strings into typed values; writing is the exact inverse so
//! `from_mapping(&r.to_mapping()) == r` holds for every record.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Flat mapping of field name to string value.
pub type FieldMap = BTreeMap<String, String>;

/// Typed, coercing view over a [`FieldMap`].
pub(crate) struct FieldReader<'a> {
    map: &'a FieldMap,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(map: &'a FieldMap) -> Self {
        Self { map }
    }

    /// Fail with `MissingField` naming the first absent key, in order.
    pub(crate) fn require_all(&self, keys: &[&'static str]) -> Result<(), DomainError> {
        match keys.iter().copied().find(|k| !self.map.contains_key(*k)) {
            Some(field) => Err(DomainError::MissingField { field }),
            None => Ok(()),
        }
    }

    pub(crate) fn parse<T>(&self, key: &'static str) -> Result<T, DomainError>
    where
        T: FromStr<Err = DomainError>,
    {
        self.map
            .get(key)
            .ok_or(DomainError::MissingField { field: key })?
            .parse()
    }

    pub(crate) fn string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    /// Port numbers; an empty value counts as unset.
    pub(crate) fn port(&self, key: &'static str) -> Result<Option<u16>, DomainError> {
        match self.map.get(key).map(|v| v.trim()) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<u16>()
                .map(Some)
                .map_err(|_| DomainError::invalid(key, raw, "not a valid port number")),
        }
    }

    /// Truthy/falsy coercion; an absent key is `false`.
    pub(crate) fn flag(&self, key: &'static str) -> Result<bool, DomainError> {
        match self.map.get(key) {
            None => Ok(false),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(DomainError::invalid(key, raw.as_str(), "expected a boolean")),
            },
        }
    }

    pub(crate) fn optional<T>(&self, key: &'static str) -> Result<Option<T>, DomainError>
    where
        T: FromStr<Err = DomainError>,
    {
        self.map.get(key).map(|v| v.parse()).transpose()
    }
}

/// Builder for the serialized form.
#[derive(Default)]
pub(crate) struct FieldWriter {
    map: FieldMap,
}

impl FieldWriter {
    pub(crate) fn put(mut self, key: &str, value: impl ToString) -> Self {
        self.map.insert(key.to_string(), value.to_string());
        self
    }

    pub(crate) fn put_opt<T: ToString>(self, key: &str, value: Option<&T>) -> Self {
        match value {
            Some(v) => self.put(key, v.to_string()),
            None => self,
        }
    }

    pub(crate) fn finish(self) -> FieldMap {
        self.map
    }
}

/// Build a [`FieldMap`] from string pairs. Mostly useful in tests and CLIs.
pub fn field_map<I, K, V>(pairs: I) -> FieldMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
