// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The frontier store: the set of causally consistent global states
//! reachable in the observed prefix, each with the cached union of
//! propositions over its causal past.

use fxhash::FxHashSet as HashSet;

use causal::{EventArena, EventId, Frontier, ProcessSet, IOTA};

/// Default cap on the number of retained frontiers.
pub const DEFAULT_MAX_FRONTIERS: usize = 64;

/// A frontier together with the union of propositions carried by every
/// event in its causal past (the sentinel's `iota` included). The union is
/// maintained incrementally: extending a cut with an event adds exactly
/// that event's propositions.
#[derive(Debug, Clone)]
pub struct TrackedFrontier {
    /// The consistent cut
    pub frontier: Frontier,
    /// Propositions appearing anywhere in the cut's causal past
    pub past: HashSet<String>,
}

impl TrackedFrontier {
    /// True if the proposition appears somewhere in the cut's causal past.
    pub fn holds_in_past(&self, prop: &str) -> bool {
        self.past.contains(prop)
    }
}

/// Insertion-ordered set of reachable frontiers, monotonically derived
/// from the initial frontier by absorbing one event at a time. Duplicates
/// are suppressed and strictly dominated cuts are retired.
#[derive(Debug, Clone)]
pub struct FrontierStore {
    frontiers: Vec<TrackedFrontier>,
    max_size: usize,
}

impl FrontierStore {
    /// A store holding only the initial frontier.
    pub fn new(procs: &ProcessSet, arena: &EventArena) -> Self {
        Self::with_max_size(procs, arena, DEFAULT_MAX_FRONTIERS)
    }

    /// [`FrontierStore::new`] with an explicit retention cap.
    pub fn with_max_size(procs: &ProcessSet, arena: &EventArena, max_size: usize) -> Self {
        let mut past = HashSet::default();
        past.insert(IOTA.to_string());
        FrontierStore {
            frontiers: vec![TrackedFrontier {
                frontier: Frontier::initial(procs, arena),
                past,
            }],
            max_size,
        }
    }

    /// The retained frontiers, in insertion order. Witnesses are
    /// enumerated in this order.
    pub fn frontiers(&self) -> &[TrackedFrontier] {
        &self.frontiers
    }

    /// Number of retained frontiers.
    pub fn len(&self) -> usize {
        self.frontiers.len()
    }

    /// True if no frontiers are retained (never, in practice).
    pub fn is_empty(&self) -> bool {
        self.frontiers.is_empty()
    }

    /// Absorb one event: extend every cut that was ready for it, keep the
    /// cuts that were not, then retire duplicates and dominated cuts.
    ///
    /// A cut `f` is ready for event `e` iff every participant's entry is a
    /// causal predecessor (`f.clock[p] < e.vc[p]`) and `e` requires no
    /// knowledge of unobserved activity on non-participants
    /// (`e.vc[q] <= f.clock[q]`). Those two conditions are exactly what
    /// makes the extended cut mutually consistent.
    pub fn absorb(&mut self, event_id: EventId, arena: &EventArena) {
        let event = &arena[event_id];
        let mut accepted: Vec<TrackedFrontier> = vec![];
        for tf in &self.frontiers {
            let clock = tf.frontier.clock();
            let ready = event
                .participants
                .iter()
                .all(|&p| clock.get(p) < event.vc.get(p));
            let grounded = (0..clock.len())
                .filter(|&q| !event.involves(q))
                .all(|q| event.vc.get(q) <= clock.get(q));
            if !(ready && grounded) {
                continue;
            }
            let extended = tf.frontier.extend(event_id, arena);
            debug_assert!(extended.is_consistent(arena), "derived cut is inconsistent");
            let mut past = tf.past.clone();
            past.extend(event.props.iter().cloned());
            accepted.push(TrackedFrontier {
                frontier: extended,
                past,
            });
        }

        for candidate in accepted {
            if self
                .frontiers
                .iter()
                .any(|tf| tf.frontier == candidate.frontier)
            {
                continue;
            }
            self.frontiers.push(candidate);
        }
        self.prune();
    }

    /// Retire every cut strictly dominated by a retained one, then cap the
    /// store size by dropping the oldest cuts.
    fn prune(&mut self) {
        let keep: Vec<bool> = self
            .frontiers
            .iter()
            .map(|tf| {
                !self
                    .frontiers
                    .iter()
                    .any(|other| tf.frontier.lt(&other.frontier))
            })
            .collect();
        let mut it = keep.iter();
        self.frontiers.retain(|_| *it.next().unwrap());

        if self.frontiers.len() > self.max_size {
            let excess = self.frontiers.len() - self.max_size;
            log::warn!(
                "frontier store cap reached: dropping {excess} of {} cuts",
                self.frontiers.len()
            );
            self.frontiers.drain(..excess);
        }
    }

    /// Render the store as `[⟨…⟩, ⟨…⟩]` for per-event reporting.
    pub fn summary(&self, procs: &ProcessSet, arena: &EventArena) -> String {
        let cuts: Vec<String> = self
            .frontiers
            .iter()
            .map(|tf| tf.frontier.display(procs, arena).to_string())
            .collect();
        format!("[{}]", cuts.join(", "))
    }
}
