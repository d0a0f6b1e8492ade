use crate::types::Value;
use serde::{Deserialize, Serialize};

/// A stored document: one value per schema field, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: usize) -> Option<&Value> {
        self.values.get(column)
    }

    /// Replaces the value of a column. Returns `false` if the column is out of
    /// range.
    pub fn set(&mut self, column: usize, value: Value) -> bool {
        match self.values.get_mut(column) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
