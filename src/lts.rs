//! Layout of the state vectors and state labels.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Slot names and types of a state vector, plus the state label names.
///
/// Slots with equal type names share a type number, and so share an intern table in the
/// explorer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LtsType {
    state_names: Vec<String>,
    state_types: Vec<String>,
    type_names: Vec<String>,
    type_index: HashMap<String, usize>,
    state_type_no: Vec<usize>,
    state_labels: Vec<(String, String)>,
}

impl LtsType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot `name` of type `type_name`.
    pub fn add_state(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        let type_name = type_name.into();
        let type_no = match self.type_index.get(&type_name) {
            Some(&i) => i,
            None => {
                self.type_names.push(type_name.clone());
                let i = self.type_names.len() - 1;
                self.type_index.insert(type_name.clone(), i);
                i
            }
        };
        self.state_names.push(name.into());
        self.state_types.push(type_name);
        self.state_type_no.push(type_no);
    }

    pub fn add_state_label(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        self.state_labels.push((name.into(), type_name.into()));
    }

    /// Width of a state vector.
    pub fn state_length(&self) -> usize {
        self.state_names.len()
    }

    pub fn state_names(&self) -> &[String] {
        &self.state_names
    }

    pub fn state_types(&self) -> &[String] {
        &self.state_types
    }

    /// Type number of slot `part`.
    pub fn state_type_no(&self, part: usize) -> usize {
        self.state_type_no[part]
    }

    pub fn state_type_name(&self, type_no: usize) -> &str {
        &self.type_names[type_no]
    }

    pub fn number_of_state_types(&self) -> usize {
        self.type_names.len()
    }

    pub fn state_labels(&self) -> &[(String, String)] {
        &self.state_labels
    }

    pub fn number_of_state_labels(&self) -> usize {
        self.state_labels.len()
    }
}

impl Display for LtsType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, (name, ty)) in self.state_names.iter().zip(&self.state_types).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, ty)?;
        }
        write!(f, ">")?;
        for (name, ty) in &self.state_labels {
            write!(f, " {}: {}", name, ty)?;
        }
        Ok(())
    }
}
