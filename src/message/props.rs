//! Session properties dictionary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A small string dictionary carried alongside the SDP payload.
///
/// Properties ride inside SETUP and UPDATE messages and are the whole body
/// of PROPSYNC. The engine never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props {
    dict: BTreeMap<String, String>,
}

impl Props {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.dict.insert(key.into(), value.into());
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.dict.get(key).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    /// `true` if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dict.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Props {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            dict: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.dict.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
