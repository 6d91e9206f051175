//! Free-form attribute bags.

use serde::{Deserialize, Serialize};

/// A single `{key, value}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An ordered key-value sequence.
///
/// Order is insertion order and survives serialization unchanged, so two
/// snapshots built from the same patches always serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Create an empty attribute bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Insert or replace a value. New keys are appended.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|a| a.key == key) {
            Some(existing) => existing.value = value,
            None => self.0.push(Attribute { key, value }),
        }
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|a| a.key == key)?;
        Some(self.0.remove(index).value)
    }

    /// Upsert every attribute of `other` into this bag.
    ///
    /// Matching keys take the new value in place, unmentioned keys are kept,
    /// and unknown keys are appended in `other`'s order.
    pub fn merge(&mut self, other: &Attributes) {
        for attribute in &other.0 {
            self.set(attribute.key.clone(), attribute.value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.set(key, value);
        }
        attributes
    }
}
