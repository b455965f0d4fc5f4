// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Consistent cuts of a partial-order execution.

use std::fmt;

use crate::clock::VectorClock;
use crate::event::{EventArena, EventId};
use crate::process::{ProcessId, ProcessSet};

/// A consistent cut (global state): for each process, the latest event
/// observed on it within this cut. The cut clock — the component-wise
/// maximum of the member events' clocks — is cached, since it is consulted
/// on every ordering check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frontier {
    /// Per-process latest event, indexed by `ProcessId`
    latest: Vec<EventId>,
    /// Cached component-wise maximum of the member clocks
    clock: VectorClock,
}

impl Frontier {
    /// The initial frontier: every process at the arena's `iota` sentinel.
    pub fn initial(procs: &ProcessSet, arena: &EventArena) -> Self {
        Frontier {
            latest: vec![arena.iota(); procs.len()],
            clock: VectorClock::zero(procs.len()),
        }
    }

    /// The latest event on process `p` under this cut.
    pub fn latest(&self, p: ProcessId) -> EventId {
        self.latest[p]
    }

    /// Iterate over the per-process latest events.
    pub fn entries(&self) -> impl Iterator<Item = (ProcessId, EventId)> + '_ {
        self.latest.iter().copied().enumerate()
    }

    /// The cut clock.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// New frontier with `event` as the latest entry of each of its
    /// participants, the cut clock joined with the event's clock.
    pub fn extend(&self, event_id: EventId, arena: &EventArena) -> Self {
        let event = &arena[event_id];
        let mut latest = self.latest.clone();
        for &p in &event.participants {
            latest[p] = event_id;
        }
        Frontier {
            latest,
            clock: self.clock.join(&event.vc),
        }
    }

    /// Mutual causal consistency: for any two entries `(p, e_p)` and
    /// `(q, e_q)`, `e_p.vc[q] <= e_q.vc[q]` — no member knows more about a
    /// process than that process's own latest entry.
    pub fn is_consistent(&self, arena: &EventArena) -> bool {
        self.latest.iter().enumerate().all(|(q, &eq)| {
            let own = arena[eq].vc.get(q);
            self.latest.iter().all(|&ep| arena[ep].vc.get(q) <= own)
        })
    }

    /// True if this cut happened before or equals the other.
    pub fn leq(&self, other: &Frontier) -> bool {
        self.clock.leq(&other.clock)
    }

    /// Strict domination in the cut order.
    pub fn lt(&self, other: &Frontier) -> bool {
        self.clock.lt(&other.clock)
    }

    /// True if neither cut happened before the other.
    pub fn concurrent(&self, other: &Frontier) -> bool {
        self.clock.concurrent(&other.clock)
    }

    /// True if the proposition holds in the cut's current state, i.e. is
    /// carried by at least one per-process latest event.
    pub fn holds_at(&self, prop: &str, arena: &EventArena) -> bool {
        self.latest.iter().any(|&e| arena[e].has_prop(prop))
    }

    /// Render as `⟨P:e1, Q:iota⟩` using the universe's printing order.
    pub fn display<'a>(
        &'a self,
        procs: &'a ProcessSet,
        arena: &'a EventArena,
    ) -> impl fmt::Display + 'a {
        struct D<'a>(&'a Frontier, &'a ProcessSet, &'a EventArena);
        impl fmt::Display for D<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "\u{27e8}")?;
                for (i, (p, e)) in self.0.entries().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", self.1.name(p), self.2[e].eid)?;
                }
                write!(f, "\u{27e9}")
            }
        }
        D(self, procs, arena)
    }
}
