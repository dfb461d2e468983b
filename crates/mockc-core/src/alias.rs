//! Import alias allocation for one output unit.
//!
//! Every module referenced from generated code needs an import and a
//! qualifier. The first module seen under a given short name keeps that name;
//! later, distinct modules with the same short name get `name1`, `name2`, ...
//! in first-encounter order. Repeated requests for a path return the alias it
//! already has.
//!
//! A table lives exactly as long as one output unit. It is created by
//! [`crate::unit::synthesize_unit`], threaded by `&mut` through merging and
//! synthesis, handed to the renderer, and dropped. Nothing here is shared
//! between units.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// One allocated import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportAlias {
    /// Module import path.
    pub path: String,
    /// Qualifier used in generated code.
    pub alias: String,
}

/// Mapping from module path to alias, injective within one output unit.
#[derive(Debug, Clone, Default)]
pub struct ImportAliasTable {
    /// Allocated imports in first-encounter order.
    imports: Vec<ImportAlias>,
    /// path -> index into `imports`.
    by_path: HashMap<String, usize>,
    /// Aliases already handed out.
    taken: HashSet<String>,
    /// Next suffix to try per short name.
    conflicts: HashMap<String, u32>,
}

impl ImportAliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the alias for `path`, allocating one from `short_name` on first use.
    pub fn alias_for(&mut self, path: &str, short_name: &str) -> String {
        if let Some(&idx) = self.by_path.get(path) {
            return self.imports[idx].alias.clone();
        }

        let counter = self.conflicts.entry(short_name.to_string()).or_insert(0);
        let mut alias = suffixed(short_name, *counter);
        while self.taken.contains(&alias) {
            *counter += 1;
            alias = suffixed(short_name, *counter);
        }
        *counter += 1;

        tracing::debug!(path, alias = %alias, "allocated import alias");

        self.taken.insert(alias.clone());
        self.by_path.insert(path.to_string(), self.imports.len());
        self.imports.push(ImportAlias {
            path: path.to_string(),
            alias: alias.clone(),
        });
        alias
    }

    /// Look up an already-allocated alias without allocating.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.by_path
            .get(path)
            .map(|&idx| self.imports[idx].alias.as_str())
    }

    /// All imports in allocation order.
    pub fn imports(&self) -> &[ImportAlias] {
        &self.imports
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

fn suffixed(short_name: &str, n: u32) -> String {
    if n == 0 {
        short_name.to_string()
    } else {
        format!("{}{}", short_name, n)
    }
}
