// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Events of a partial-order execution, owned by an arena.

use std::fmt;

use crate::clock::VectorClock;
use crate::process::{ProcessId, ProcessSet};

/// The reserved proposition carried by the initial sentinel event.
pub const IOTA: &str = "iota";

/// Index of an event in its [`EventArena`].
pub type EventId = usize;

/// An immutable record of one occurrence in the execution. An event may
/// involve several processes at once (a rendezvous); its vector clock is
/// the clock *after* the event, and `props` are the propositions that hold
/// immediately after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unique identifier within the trace
    pub eid: String,
    /// Participating processes, sorted, non-empty
    pub participants: Vec<ProcessId>,
    /// Vector clock after the event, over the full process universe
    pub vc: VectorClock,
    /// Propositions holding immediately after the event, sorted and deduped
    pub props: Vec<String>,
}

impl Event {
    /// Construct an event, normalizing participant and proposition order.
    pub fn new(
        eid: impl Into<String>,
        mut participants: Vec<ProcessId>,
        vc: VectorClock,
        mut props: Vec<String>,
    ) -> Self {
        participants.sort_unstable();
        participants.dedup();
        props.sort_unstable();
        props.dedup();
        Event {
            eid: eid.into(),
            participants,
            vc,
            props,
        }
    }

    /// True if this event carries the proposition.
    pub fn has_prop(&self, name: &str) -> bool {
        self.props.iter().any(|p| p == name)
    }

    /// True if the process participates in this event.
    pub fn involves(&self, p: ProcessId) -> bool {
        self.participants.binary_search(&p).is_ok()
    }

    /// Render as `eid@P,Q:[P:1, Q:1]` using the universe's printing order.
    pub fn display<'a>(&'a self, procs: &'a ProcessSet) -> impl fmt::Display + 'a {
        struct D<'a>(&'a Event, &'a ProcessSet);
        impl fmt::Display for D<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let names: Vec<&str> =
                    self.0.participants.iter().map(|&p| self.1.name(p)).collect();
                write!(
                    f,
                    "{}@{}:{}",
                    self.0.eid,
                    names.join(","),
                    self.0.vc.display(self.1)
                )
            }
        }
        D(self, procs)
    }
}

/// Owns every event of a run. Frontiers reference events by [`EventId`]
/// rather than sharing the records themselves, which keeps frontier
/// cloning cheap and avoids reference cycles.
#[derive(Debug, Clone)]
pub struct EventArena {
    events: Vec<Event>,
}

impl EventArena {
    /// Create an arena seeded with the `iota` sentinel (event 0): all
    /// processes, zero clock, props `{iota}`.
    pub fn new(procs: &ProcessSet) -> Self {
        let iota = Event::new(
            IOTA,
            (0..procs.len()).collect(),
            VectorClock::zero(procs.len()),
            vec![IOTA.to_string()],
        );
        EventArena { events: vec![iota] }
    }

    /// The sentinel's id.
    pub fn iota(&self) -> EventId {
        0
    }

    /// Add an event, returning its id.
    pub fn push(&mut self, event: Event) -> EventId {
        self.events.push(event);
        self.events.len() - 1
    }

    /// Number of events, sentinel included.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True only before the sentinel is inserted, i.e. never.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl std::ops::Index<EventId> for EventArena {
    type Output = Event;

    fn index(&self, id: EventId) -> &Event {
        &self.events[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_sentinel() {
        let procs = ProcessSet::new(["P", "Q"]);
        let arena = EventArena::new(&procs);
        let iota = &arena[arena.iota()];
        assert_eq!(iota.eid, IOTA);
        assert_eq!(iota.participants, vec![0, 1]);
        assert!(iota.vc.is_zero());
        assert!(iota.has_prop(IOTA));
    }

    #[test]
    fn test_event_normalization() {
        let e = Event::new(
            "e1",
            vec![1, 0, 1],
            VectorClock::new(vec![1, 1, 0]),
            vec!["q".to_string(), "p".to_string(), "q".to_string()],
        );
        assert_eq!(e.participants, vec![0, 1]);
        assert_eq!(e.props, vec!["p", "q"]);
        assert!(e.involves(0));
        assert!(!e.involves(2));
        assert!(e.has_prop("q"));
        assert!(!e.has_prop("r"));
    }

    #[test]
    fn test_event_display() {
        let procs = ProcessSet::new(["Client", "Server"]);
        let e = Event::new(
            "req",
            vec![0, 1],
            VectorClock::new(vec![1, 1]),
            vec!["request".to_string()],
        );
        assert_eq!(
            e.display(&procs).to_string(),
            "req@Client,Server:[Client:1, Server:1]"
        );
    }
}
