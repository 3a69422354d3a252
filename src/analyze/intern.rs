//! Interned category labels
//!
//! The analysis stage groups millions of records by a handful of repeating
//! string dimensions (extensions, directory prefixes, org segments). Interning
//! each distinct label once lets the grouping maps key on a `Copy` integer
//! instead of cloning strings per record.

use std::collections::HashMap;

/// Handle to an interned label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sym(u32);

/// Append-only pool of distinct category labels
#[derive(Debug, Default)]
pub struct CategoryPool {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl CategoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a label, returning its handle
    pub fn intern(&mut self, name: &str) -> Sym {
        if let Some(&id) = self.index.get(name) {
            return Sym(id);
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        Sym(id)
    }

    /// Resolve a handle back to its label
    pub fn resolve(&self, sym: Sym) -> &str {
        &self.names[sym.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
