// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The PBTL runtime verification engine. Use [`Monitor::new`] with a
//! [`pbtl::dlnf::Dlnf`] formula and a process universe, then feed it
//! events in delivery order.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::large_enum_variant)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

mod eval;
pub mod monitor;
pub mod store;

pub use eval::{CaseKind, DisjunctReport};
pub use monitor::{Monitor, MonitorError};

use serde::Serialize;
use std::fmt;

/// Three-valued status of a monitored property. The variant order is the
/// verdict lattice `False < Inconclusive < True`, so the disjunctive
/// combination of verdicts is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Verdict {
    /// The property is definitively violated; stable under extension
    False,
    /// Monitoring has not reached a conclusion
    Inconclusive,
    /// The property is definitively satisfied; stable under extension
    True,
}

impl Verdict {
    /// True for the stable verdicts (TRUE and FALSE).
    pub fn is_conclusive(self) -> bool {
        self != Verdict::Inconclusive
    }

    /// Disjunctive combination: TRUE dominates, FALSE only if both are.
    pub fn or(self, other: Verdict) -> Verdict {
        self.max(other)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
            Verdict::Inconclusive => "INCONCLUSIVE",
        };
        write!(f, "{s}")
    }
}
