// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The top-level monitor loop: causal validation, frontier absorption,
//! disjunct re-evaluation, and verdict combination.

use thiserror::Error;

use causal::{Event, EventArena, ProcessSet, VectorClock};
use pbtl::dlnf::Dlnf;

use crate::eval::{DisjunctReport, DisjunctState};
use crate::store::FrontierStore;
use crate::Verdict;

/// The result of an unsuccessful monitoring step.
///
/// Both variants are causality violations: the incoming event's vector
/// clock is inconsistent with the events already delivered. The monitor
/// does not buffer out-of-order events and never silently skips one.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MonitorError {
    /// A participant's logical clock failed to advance
    #[error(
        "causality violation at event `{eid}`: participant {process} \
         has clock {got}, expected greater than {seen}"
    )]
    ClockNotAdvanced {
        /// the offending event
        eid: String,
        /// the participant whose clock regressed
        process: String,
        /// that process's delivered clock
        seen: u64,
        /// the clock carried by the event
        got: u64,
    },
    /// A non-participant's component grew, i.e. the event claims knowledge
    /// of activity that was never delivered
    #[error(
        "causality violation at event `{eid}`: non-participant {process} \
         advanced from {seen} to {got}"
    )]
    NonParticipantAdvanced {
        /// the offending event
        eid: String,
        /// the non-participating process
        process: String,
        /// that process's delivered clock
        seen: u64,
        /// the clock carried by the event
        got: u64,
    },
}

/// Runtime monitor for one PBTL property over one event stream.
///
/// Owns the event arena, the frontier store, and the per-disjunct states;
/// consumes events one at a time in delivery order and exposes the
/// three-valued verdict after each.
pub struct Monitor {
    procs: ProcessSet,
    arena: EventArena,
    store: FrontierStore,
    disjuncts: Vec<DisjunctState>,
    seen: VectorClock,
    verdict: Verdict,
    history: Vec<(String, Verdict)>,
    stop_on_verdict: bool,
}

impl Monitor {
    /// Create a monitor for a normalized property over a fixed process
    /// universe. Trivially true disjuncts (and the constant-false empty
    /// formula) are decided immediately.
    pub fn new(formula: Dlnf, procs: ProcessSet) -> Self {
        let arena = EventArena::new(&procs);
        let store = FrontierStore::new(&procs, &arena);
        let disjuncts: Vec<DisjunctState> = formula
            .disjuncts
            .into_iter()
            .map(|d| DisjunctState::new(d, procs.len()))
            .collect();
        let seen = VectorClock::zero(procs.len());
        let mut monitor = Monitor {
            procs,
            arena,
            store,
            disjuncts,
            seen,
            verdict: Verdict::Inconclusive,
            history: vec![],
            stop_on_verdict: false,
        };
        monitor.combine();
        monitor
    }

    /// Stop consuming the stream once the verdict is conclusive.
    pub fn set_stop_on_verdict(&mut self, stop: bool) {
        self.stop_on_verdict = stop;
    }

    /// The current overall verdict.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// True once the verdict is TRUE or FALSE.
    pub fn is_conclusive(&self) -> bool {
        self.verdict.is_conclusive()
    }

    /// The process universe.
    pub fn processes(&self) -> &ProcessSet {
        &self.procs
    }

    /// The per-event verdicts recorded so far, as `(eid, verdict)` pairs.
    pub fn history(&self) -> &[(String, Verdict)] {
        &self.history
    }

    /// Number of retained frontiers.
    pub fn frontier_count(&self) -> usize {
        self.store.len()
    }

    /// The frontier set rendered for per-event reporting.
    pub fn frontier_summary(&self) -> String {
        self.store.summary(&self.procs, &self.arena)
    }

    /// Per-disjunct breakdown for final reporting.
    pub fn reports(&self) -> Vec<DisjunctReport> {
        self.disjuncts.iter().map(|d| d.report()).collect()
    }

    /// Absorb one event and return the updated overall verdict.
    pub fn absorb(&mut self, event: Event) -> Result<Verdict, MonitorError> {
        self.validate(&event)?;
        for &p in &event.participants {
            self.seen.set(p, event.vc.get(p));
        }
        let eid = event.eid.clone();
        log::debug!("absorbing {}", event.display(&self.procs));

        let event_id = self.arena.push(event);
        self.store.absorb(event_id, &self.arena);

        let event = &self.arena[event_id];
        for disjunct in &mut self.disjuncts {
            disjunct.observe(event);
            disjunct.evaluate(&self.store, &self.arena, &self.procs);
        }
        self.combine();
        self.history.push((eid, self.verdict));
        Ok(self.verdict)
    }

    /// Consume an event iterator, honoring `stop_on_verdict`, and return
    /// the final verdict.
    pub fn run<I>(&mut self, events: I) -> Result<Verdict, MonitorError>
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.absorb(event)?;
            if self.stop_on_verdict && self.is_conclusive() {
                log::debug!("stopping early: verdict is {}", self.verdict);
                break;
            }
        }
        Ok(self.verdict)
    }

    /// Check the event against the delivered clock: every participant's
    /// component must strictly advance, and no non-participant's component
    /// may exceed what has been delivered.
    fn validate(&self, event: &Event) -> Result<(), MonitorError> {
        for &p in &event.participants {
            if event.vc.get(p) <= self.seen.get(p) {
                return Err(MonitorError::ClockNotAdvanced {
                    eid: event.eid.clone(),
                    process: self.procs.name(p).to_string(),
                    seen: self.seen.get(p),
                    got: event.vc.get(p),
                });
            }
        }
        for (q, _) in self.procs.iter() {
            if !event.involves(q) && event.vc.get(q) > self.seen.get(q) {
                return Err(MonitorError::NonParticipantAdvanced {
                    eid: event.eid.clone(),
                    process: self.procs.name(q).to_string(),
                    seen: self.seen.get(q),
                    got: event.vc.get(q),
                });
            }
        }
        Ok(())
    }

    /// TRUE if any disjunct is TRUE; FALSE only if all are.
    fn combine(&mut self) {
        if self.verdict.is_conclusive() {
            return;
        }
        let verdicts = self.disjuncts.iter().map(|d| d.verdict());
        self.verdict = if verdicts.clone().any(|v| v == Verdict::True) {
            Verdict::True
        } else if verdicts.clone().all(|v| v == Verdict::False) {
            Verdict::False
        } else {
            Verdict::Inconclusive
        };
    }
}
