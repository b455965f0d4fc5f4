// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Per-disjunct evaluation.
//!
//! A DLNF disjunct's literals partition into four kinds: M (`p`, must hold
//! at the witnessing frontier), ¬M (`!p`), P (`EP(p)`, must appear in the
//! frontier's causal past), and N (`!EP(p)`, must never appear in that
//! past). The combination present determines which conclusive rules apply.

use std::fmt;

use causal::{Event, EventArena, ProcessSet, VectorClock, IOTA};
use pbtl::dlnf::{Disjunct, Literal};
use serde::Serialize;

use crate::store::FrontierStore;
use crate::Verdict;

/// Which literal kinds a disjunct carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaseKind {
    /// Only past literals
    P,
    /// Only direct (possibly negated) propositions
    M,
    /// Only negated past literals
    N,
    /// Past and direct literals
    PM,
    /// Past and negated past literals
    PN,
    /// Direct and negated past literals
    MN,
    /// All three kinds
    PMN,
    /// No literals at all (constant true)
    Trivial,
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseKind::P => "P",
            CaseKind::M => "M",
            CaseKind::N => "N",
            CaseKind::PM => "P+M",
            CaseKind::PN => "P+N",
            CaseKind::MN => "M+N",
            CaseKind::PMN => "P+M+N",
            CaseKind::Trivial => "trivial",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of one disjunct's state, for final reporting.
#[derive(Debug, Clone, Serialize)]
pub struct DisjunctReport {
    /// The disjunct rendered in concrete syntax
    pub formula: String,
    /// Its literal-kind combination
    pub case: CaseKind,
    /// Its current verdict
    pub verdict: Verdict,
    /// Where it was decided, if it was
    pub witness: Option<String>,
}

/// Runtime state of one disjunct: the literal partition, the sticky
/// verdict, and the first-observation clock of each P and N proposition.
///
/// A proposition's first-observation clock is the vector clock of the
/// first absorbed event carrying it — equivalently, that event's minimal
/// history cut. The join of the P clocks is then the minimal consistent
/// cut covering the whole P side, and an N proposition lies in a cut's
/// past exactly when its clock is below the cut's.
#[derive(Debug, Clone)]
pub(crate) struct DisjunctState {
    disjunct: Disjunct,
    m: Vec<String>,
    not_m: Vec<String>,
    p: Vec<String>,
    n: Vec<String>,
    p_seen: Vec<Option<VectorClock>>,
    n_seen: Vec<Option<VectorClock>>,
    verdict: Verdict,
    witness: Option<String>,
}

impl DisjunctState {
    pub fn new(disjunct: Disjunct, universe: usize) -> Self {
        let mut m = vec![];
        let mut not_m = vec![];
        let mut p = vec![];
        let mut n = vec![];
        for literal in &disjunct.literals {
            match literal {
                Literal::Prop(name) => m.push(name.clone()),
                Literal::NegProp(name) => not_m.push(name.clone()),
                Literal::Past(name) => p.push(name.clone()),
                Literal::NegPast(name) => n.push(name.clone()),
            }
        }
        // the sentinel makes iota part of every past from time zero
        let seed = |props: &[String]| {
            props
                .iter()
                .map(|name| (name == IOTA).then(|| VectorClock::zero(universe)))
                .collect::<Vec<_>>()
        };
        let p_seen = seed(&p);
        let n_seen = seed(&n);
        let verdict = if disjunct.is_trivially_true() {
            Verdict::True
        } else {
            Verdict::Inconclusive
        };
        DisjunctState {
            disjunct,
            m,
            not_m,
            p,
            n,
            p_seen,
            n_seen,
            verdict,
            witness: None,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn case(&self) -> CaseKind {
        let has_p = !self.p.is_empty();
        let has_m = !self.m.is_empty() || !self.not_m.is_empty();
        let has_n = !self.n.is_empty();
        match (has_p, has_m, has_n) {
            (true, true, true) => CaseKind::PMN,
            (true, true, false) => CaseKind::PM,
            (true, false, true) => CaseKind::PN,
            (true, false, false) => CaseKind::P,
            (false, true, true) => CaseKind::MN,
            (false, true, false) => CaseKind::M,
            (false, false, true) => CaseKind::N,
            (false, false, false) => CaseKind::Trivial,
        }
    }

    pub fn report(&self) -> DisjunctReport {
        DisjunctReport {
            formula: self.disjunct.to_string(),
            case: self.case(),
            verdict: self.verdict,
            witness: self.witness.clone(),
        }
    }

    /// Record first observations of this disjunct's P and N propositions.
    pub fn observe(&mut self, event: &Event) {
        if self.verdict.is_conclusive() {
            return;
        }
        for (name, seen) in self.p.iter().zip(self.p_seen.iter_mut()) {
            if seen.is_none() && event.has_prop(name) {
                *seen = Some(event.vc.clone());
            }
        }
        for (name, seen) in self.n.iter().zip(self.n_seen.iter_mut()) {
            if seen.is_none() && event.has_prop(name) {
                *seen = Some(event.vc.clone());
            }
        }
    }

    /// Re-evaluate against the updated frontier set.
    pub fn evaluate(&mut self, store: &FrontierStore, arena: &EventArena, procs: &ProcessSet) {
        if self.verdict.is_conclusive() {
            return;
        }

        // A frontier satisfying all four clauses settles the disjunct.
        for tf in store.frontiers() {
            if self.satisfied_at(tf, arena) {
                let witness = tf.frontier.display(procs, arena).to_string();
                log::debug!("disjunct {} TRUE at {witness}", self.disjunct);
                self.verdict = Verdict::True;
                self.witness = Some(witness);
                return;
            }
        }

        let has_m_side = !self.m.is_empty() || !self.not_m.is_empty();

        // Without an M side, the join of the P first-observation clocks is
        // itself a reachable cut: the minimal one covering the P side. It
        // decides the disjunct the moment the last P proposition appears,
        // even when every retained frontier has outrun it.
        if !has_m_side && !self.p.is_empty() {
            if let Some(join) = self.p_join(procs.len()) {
                let contaminated = self
                    .n_seen
                    .iter()
                    .flatten()
                    .any(|n_clock| n_clock.leq(&join));
                if contaminated {
                    self.verdict = Verdict::False;
                    log::debug!(
                        "disjunct {} FALSE: forbidden proposition inside the minimal P cut {}",
                        self.disjunct,
                        join.display(procs)
                    );
                } else {
                    self.verdict = Verdict::True;
                    self.witness = Some(join.display(procs).to_string());
                    log::debug!("disjunct {} TRUE at virtual cut {}", self.disjunct, join.display(procs));
                }
                return;
            }
        }

        // Frontier-dependent disjuncts are unsatisfiable once every
        // retained cut carries a forbidden proposition: all future cuts
        // extend a retained one, and a past never shrinks.
        if !self.n.is_empty() && (has_m_side || self.p.is_empty()) {
            let all_contaminated = store
                .frontiers()
                .iter()
                .all(|tf| self.n.iter().any(|name| tf.holds_in_past(name)));
            if all_contaminated {
                self.verdict = Verdict::False;
                log::debug!(
                    "disjunct {} FALSE: every retained cut has a forbidden proposition in its past",
                    self.disjunct
                );
            }
        }
    }

    /// The four satisfaction clauses at one frontier.
    fn satisfied_at(&self, tf: &crate::store::TrackedFrontier, arena: &EventArena) -> bool {
        self.m.iter().all(|name| tf.frontier.holds_at(name, arena))
            && self.not_m.iter().all(|name| !tf.frontier.holds_at(name, arena))
            && self.p.iter().all(|name| tf.holds_in_past(name))
            && self.n.iter().all(|name| !tf.holds_in_past(name))
    }

    /// Join of the P first-observation clocks, if the whole P side has
    /// been observed.
    fn p_join(&self, universe: usize) -> Option<VectorClock> {
        let mut join = VectorClock::zero(universe);
        for seen in &self.p_seen {
            join.join_assign(seen.as_ref()?);
        }
        Some(join)
    }
}
