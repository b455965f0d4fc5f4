// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The fixed universe of process identifiers.

use fxhash::FxHashMap as HashMap;

/// Dense index of a process in a [`ProcessSet`].
pub type ProcessId = usize;

/// The set of process identifiers of the monitored system, fixed at
/// initialization. Insertion order is preserved and used purely for
/// deterministic printing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessSet {
    names: Vec<String>,
    index: HashMap<String, ProcessId>,
}

impl ProcessSet {
    /// Build a process set from identifiers in insertion order. Duplicates
    /// are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Add an identifier, returning its index (existing or fresh).
    pub fn insert(&mut self, name: &str) -> ProcessId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Look up an identifier's index.
    pub fn get(&self, name: &str) -> Option<ProcessId> {
        self.index.get(name).copied()
    }

    /// The identifier at a given index. Panics if out of range.
    pub fn name(&self, id: ProcessId) -> &str {
        &self.names[id]
    }

    /// Number of processes in the universe.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if no processes have been declared.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over `(id, name)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}
