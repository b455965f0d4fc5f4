// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Vector clocks over the fixed process universe.

use std::fmt;

use crate::process::{ProcessId, ProcessSet};

/// A vector clock: one logical timestamp per process of the system,
/// indexed densely by [`ProcessId`]. The all-zeros clock is the initial
/// `iota` clock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorClock(Vec<u64>);

impl VectorClock {
    /// The zero clock over a universe of `n` processes.
    pub fn zero(n: usize) -> Self {
        VectorClock(vec![0; n])
    }

    /// Build a clock from per-process components.
    pub fn new(components: Vec<u64>) -> Self {
        VectorClock(components)
    }

    /// The timestamp of process `p`.
    pub fn get(&self, p: ProcessId) -> u64 {
        self.0[p]
    }

    /// Number of components (the size of the process universe).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&t| t == 0)
    }

    /// Component-wise `<=`: true iff this clock happened before or equals
    /// the other.
    pub fn leq(&self, other: &VectorClock) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }

    /// Strict happened-before: `<=` and different.
    pub fn lt(&self, other: &VectorClock) -> bool {
        self.leq(other) && self.0 != other.0
    }

    /// True if neither clock happened before the other.
    pub fn concurrent(&self, other: &VectorClock) -> bool {
        !self.leq(other) && !other.leq(self)
    }

    /// Component-wise maximum of two clocks.
    pub fn join(&self, other: &VectorClock) -> VectorClock {
        VectorClock(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| *a.max(b))
                .collect(),
        )
    }

    /// Merge another clock into this one in place.
    pub fn join_assign(&mut self, other: &VectorClock) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a = (*a).max(*b);
        }
    }

    /// Set the timestamp of process `p`.
    pub fn set(&mut self, p: ProcessId, t: u64) {
        self.0[p] = t;
    }

    /// Render as `[P:1, Q:0]` using the universe's printing order.
    pub fn display<'a>(&'a self, procs: &'a ProcessSet) -> impl fmt::Display + 'a {
        struct D<'a>(&'a VectorClock, &'a ProcessSet);
        impl fmt::Display for D<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "[")?;
                for (i, (id, name)) in self.1.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", name, self.0.get(id))?;
                }
                write!(f, "]")
            }
        }
        D(self, procs)
    }
}
