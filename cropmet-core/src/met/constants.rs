//! Named constants from the metadata block of a met file.

use crate::errors::{MetError, MetResult};
use serde::{Deserialize, Serialize};

/// A single `name = value (units) ! comment` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Constant {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            units: None,
            comment: None,
        }
    }

    /// Numeric value of the constant.
    pub fn as_f64(&self) -> MetResult<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .map_err(|_| MetError::InvalidConstant {
                name: self.name.clone(),
                value: self.value.clone(),
            })
    }
}

/// Case-insensitive table of constants, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstantsTable {
    entries: Vec<Constant>,
}

impl ConstantsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Constant> {
        self.entries
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Numeric value of a constant, `None` if it is not present.
    pub fn value(&self, name: &str) -> MetResult<Option<f64>> {
        self.get(name).map(Constant::as_f64).transpose()
    }

    /// Add a constant unless one of the same name already exists.
    ///
    /// Returns whether the constant was added.
    pub fn add(&mut self, constant: Constant) -> bool {
        if self.contains(&constant.name) {
            return false;
        }
        self.entries.push(constant);
        true
    }

    /// Set the value of a constant, adding it if needed.
    pub fn set(&mut self, name: &str, value: f64) {
        let value = value.to_string();
        match self
            .entries
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value,
            None => self.entries.push(Constant::new(name, &value)),
        }
    }

    /// Merge constants from a secondary table.
    ///
    /// Constants already present are kept, so the primary table always wins.
    pub fn merge(&mut self, other: &ConstantsTable) {
        for constant in other.iter() {
            self.add(constant.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
