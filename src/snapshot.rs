use crate::lsw3::decoder::Reading;

use serde::Serialize;
use std::collections::BTreeMap;

/// Every reading decoded in one poll cycle, keyed by field name.
///
/// A snapshot is only handed out once all of its blocks decoded; hosts
/// replace their previous snapshot with it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    readings: BTreeMap<String, Reading>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, reading: Reading) {
        self.readings.insert(name.into(), reading);
    }

    /// Fold another snapshot into this one. Later names overwrite earlier ones.
    pub fn merge(&mut self, other: Snapshot) {
        self.readings.extend(other.readings);
    }

    pub fn get(&self, name: &str) -> Option<&Reading> {
        self.readings.get(name)
    }

    /// Scaled value of `name` as a float, if present.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|r| r.value.as_f64())
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
