// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! CSV trace reader.
//!
//! A trace file is UTF-8 CSV with an optional `# system_processes:`
//! directive fixing the process universe, a header row
//! `eid,processes,vc,props`, and one event per subsequent row. Fields use
//! `|` (processes, props) and `;` (vector clock entries) as inner
//! separators, so no CSV quoting is involved. Lines starting with `#`
//! other than the directive are comments.

use fxhash::FxHashSet as HashSet;
use thiserror::Error;

use crate::clock::VectorClock;
use crate::event::{Event, IOTA};
use crate::process::ProcessSet;

const DIRECTIVE: &str = "# system_processes:";
const HEADER: &str = "eid,processes,vc,props";

/// The result of an unsuccessful attempt to read a trace. Every variant
/// carries the 1-based line number of the offending input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceError {
    /// The `eid,processes,vc,props` header row is absent
    #[error("trace has no header row `{HEADER}`")]
    MissingHeader,
    /// The header row is misspelled or reordered
    #[error("line {line}: header must be exactly `{HEADER}`, got `{found}`")]
    BadHeader {
        /// offending line
        line: usize,
        /// what was found instead
        found: String,
    },
    /// More than one `# system_processes:` directive
    #[error("line {line}: duplicate system_processes directive")]
    DuplicateDirective {
        /// offending line
        line: usize,
    },
    /// The directive declared no processes
    #[error("line {line}: system_processes directive declares no processes")]
    EmptyDirective {
        /// offending line
        line: usize,
    },
    /// A row did not have exactly four comma-separated fields
    #[error("line {line}: expected 4 fields, got {found}")]
    WrongFieldCount {
        /// offending line
        line: usize,
        /// number of fields found
        found: usize,
    },
    /// A row with an empty event identifier
    #[error("line {line}: empty eid")]
    EmptyEid {
        /// offending line
        line: usize,
    },
    /// An event identifier used twice
    #[error("line {line}: duplicate eid `{eid}`")]
    DuplicateEid {
        /// offending line
        line: usize,
        /// the repeated identifier
        eid: String,
    },
    /// A row with no participating processes
    #[error("line {line}: empty processes field")]
    EmptyProcesses {
        /// offending line
        line: usize,
    },
    /// A process identifier outside the declared universe
    #[error("line {line}: unknown process `{name}`")]
    UnknownProcess {
        /// offending line
        line: usize,
        /// the undeclared identifier
        name: String,
    },
    /// A malformed `P:N` vector clock entry
    #[error("line {line}: invalid vector clock entry `{entry}`")]
    BadClockEntry {
        /// offending line
        line: usize,
        /// the malformed entry text
        entry: String,
    },
    /// The same process appeared twice in one vector clock
    #[error("line {line}: duplicate vector clock entry for `{name}`")]
    DuplicateClockEntry {
        /// offending line
        line: usize,
        /// the repeated process
        name: String,
    },
    /// A declared process missing from a vector clock
    #[error("line {line}: vector clock missing entry for `{name}`")]
    MissingClockEntry {
        /// offending line
        line: usize,
        /// the absent process
        name: String,
    },
    /// The reserved `iota` proposition in an event row
    #[error("line {line}: proposition `{IOTA}` is reserved for the initial sentinel")]
    ReservedProp {
        /// offending line
        line: usize,
    },
}

/// A fully parsed and validated trace: the process universe and the events
/// in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// The process universe, in directive (or first-appearance) order
    pub processes: ProcessSet,
    /// True if the universe came from a `# system_processes:` directive;
    /// without it the universe is inferred and causal consistency checks
    /// are best-effort.
    pub declared: bool,
    /// Events in delivery order
    pub events: Vec<Event>,
}

struct Row<'a> {
    line: usize,
    eid: &'a str,
    processes: &'a str,
    vc: &'a str,
    props: &'a str,
}

/// Parse a trace file's contents.
pub fn parse_trace(text: &str) -> Result<Trace, TraceError> {
    let mut directive: Option<(usize, Vec<&str>)> = None;
    let mut header_seen = false;
    let mut rows: Vec<Row> = vec![];

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix(DIRECTIVE) {
            if directive.is_some() {
                return Err(TraceError::DuplicateDirective { line });
            }
            let names: Vec<&str> = rest.split('|').map(str::trim).filter(|s| !s.is_empty()).collect();
            if names.is_empty() {
                return Err(TraceError::EmptyDirective { line });
            }
            directive = Some((line, names));
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        if !header_seen {
            if trimmed != HEADER {
                return Err(TraceError::BadHeader {
                    line,
                    found: trimmed.to_string(),
                });
            }
            header_seen = true;
            continue;
        }
        let fields: Vec<&str> = raw.split(',').collect();
        if fields.len() != 4 {
            return Err(TraceError::WrongFieldCount {
                line,
                found: fields.len(),
            });
        }
        rows.push(Row {
            line,
            eid: fields[0].trim(),
            processes: fields[1],
            vc: fields[2],
            props: fields[3],
        });
    }

    if !header_seen {
        return Err(TraceError::MissingHeader);
    }

    let declared = directive.is_some();
    let processes = match directive {
        Some((_, names)) => ProcessSet::new(names),
        // secondary path: infer the universe from the union of identifiers
        // observed across rows, in order of first appearance
        None => {
            let mut procs = ProcessSet::default();
            for row in &rows {
                for name in split_list(row.processes) {
                    procs.insert(name);
                }
                for entry in split_entries(row.vc) {
                    if let Some((name, _)) = entry.split_once(':') {
                        procs.insert(name.trim());
                    }
                }
            }
            procs
        }
    };

    let mut events = Vec::with_capacity(rows.len());
    let mut seen_eids: HashSet<&str> = HashSet::default();
    for row in &rows {
        events.push(parse_row(row, &processes, declared, &mut seen_eids)?);
    }

    Ok(Trace {
        processes,
        declared,
        events,
    })
}

fn split_list(field: &str) -> impl Iterator<Item = &str> {
    field.split('|').map(str::trim).filter(|s| !s.is_empty())
}

fn split_entries(field: &str) -> impl Iterator<Item = &str> {
    field.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_row<'a>(
    row: &Row<'a>,
    procs: &ProcessSet,
    declared: bool,
    seen_eids: &mut HashSet<&'a str>,
) -> Result<Event, TraceError> {
    let line = row.line;
    if row.eid.is_empty() {
        return Err(TraceError::EmptyEid { line });
    }
    if !seen_eids.insert(row.eid) {
        return Err(TraceError::DuplicateEid {
            line,
            eid: row.eid.to_string(),
        });
    }

    let mut participants = vec![];
    for name in split_list(row.processes) {
        match procs.get(name) {
            Some(id) => participants.push(id),
            None => {
                return Err(TraceError::UnknownProcess {
                    line,
                    name: name.to_string(),
                })
            }
        }
    }
    if participants.is_empty() {
        return Err(TraceError::EmptyProcesses { line });
    }

    let mut clock = VectorClock::zero(procs.len());
    let mut present = vec![false; procs.len()];
    for entry in split_entries(row.vc) {
        let (name, ts) = entry.split_once(':').ok_or_else(|| TraceError::BadClockEntry {
            line,
            entry: entry.to_string(),
        })?;
        let name = name.trim();
        let id = procs.get(name).ok_or_else(|| TraceError::UnknownProcess {
            line,
            name: name.to_string(),
        })?;
        let ts: u64 = ts.trim().parse().map_err(|_| TraceError::BadClockEntry {
            line,
            entry: entry.to_string(),
        })?;
        if present[id] {
            return Err(TraceError::DuplicateClockEntry {
                line,
                name: name.to_string(),
            });
        }
        present[id] = true;
        clock.set(id, ts);
    }
    if declared {
        if let Some(missing) = present.iter().position(|&p| !p) {
            return Err(TraceError::MissingClockEntry {
                line,
                name: procs.name(missing).to_string(),
            });
        }
    }

    let props: Vec<String> = split_list(row.props).map(str::to_string).collect();
    if props.iter().any(|p| p == IOTA) {
        return Err(TraceError::ReservedProp { line });
    }

    Ok(Event::new(row.eid, participants, clock, props))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "\
# system_processes: Client|Server
eid,processes,vc,props
req,Client|Server,Client:1;Server:1,request
resp,Server|Client,Client:2;Server:2,response
";

    #[test]
    fn test_parse_good_trace() {
        let trace = parse_trace(GOOD).expect("trace should parse");
        assert!(trace.declared);
        assert_eq!(trace.processes.len(), 2);
        assert_eq!(trace.processes.name(0), "Client");
        assert_eq!(trace.events.len(), 2);

        let req = &trace.events[0];
        assert_eq!(req.eid, "req");
        assert_eq!(req.participants, vec![0, 1]);
        assert_eq!(req.vc, VectorClock::new(vec![1, 1]));
        assert_eq!(req.props, vec!["request"]);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = "\
# a comment
# system_processes: P
# another comment
eid,processes,vc,props

# mid-data comment
e1,P,P:1,
";
        let trace = parse_trace(text).expect("trace should parse");
        assert_eq!(trace.events.len(), 1);
        assert!(trace.events[0].props.is_empty());
    }

    #[test]
    fn test_inferred_universe() {
        let text = "\
eid,processes,vc,props
e1,P,P:1;Q:0,p
e2,Q,Q:1,q
";
        let trace = parse_trace(text).expect("trace should parse");
        assert!(!trace.declared);
        assert_eq!(trace.processes.get("P"), Some(0));
        assert_eq!(trace.processes.get("Q"), Some(1));
        // missing entries default to zero in inference mode
        assert_eq!(trace.events[1].vc, VectorClock::new(vec![0, 1]));
    }

    #[test]
    fn test_header_errors() {
        assert_eq!(parse_trace("# nothing\n"), Err(TraceError::MissingHeader));
        assert_eq!(
            parse_trace("eid,vc,processes,props\n"),
            Err(TraceError::BadHeader {
                line: 1,
                found: "eid,vc,processes,props".to_string()
            })
        );
    }

    #[test]
    fn test_row_errors() {
        let with_rows = |rows: &str| {
            format!("# system_processes: P|Q\neid,processes,vc,props\n{rows}")
        };

        assert_eq!(
            parse_trace(&with_rows("e1,P,P:1;Q:0\n")),
            Err(TraceError::WrongFieldCount { line: 3, found: 3 })
        );
        assert_eq!(
            parse_trace(&with_rows("e1,R,P:1;Q:0,\n")),
            Err(TraceError::UnknownProcess {
                line: 3,
                name: "R".to_string()
            })
        );
        assert_eq!(
            parse_trace(&with_rows("e1,P,P:x;Q:0,\n")),
            Err(TraceError::BadClockEntry {
                line: 3,
                entry: "P:x".to_string()
            })
        );
        assert_eq!(
            parse_trace(&with_rows("e1,P,P:-1;Q:0,\n")),
            Err(TraceError::BadClockEntry {
                line: 3,
                entry: "P:-1".to_string()
            })
        );
        assert_eq!(
            parse_trace(&with_rows("e1,P,P:1,\n")),
            Err(TraceError::MissingClockEntry {
                line: 3,
                name: "Q".to_string()
            })
        );
        assert_eq!(
            parse_trace(&with_rows("e1,P,P:1;Q:0,p\ne1,Q,P:1;Q:1,q\n")),
            Err(TraceError::DuplicateEid {
                line: 4,
                eid: "e1".to_string()
            })
        );
        assert_eq!(
            parse_trace(&with_rows("e1,P,P:1;Q:0,iota\n")),
            Err(TraceError::ReservedProp { line: 3 })
        );
        assert_eq!(
            parse_trace(&with_rows("e1,,P:1;Q:0,p\n")),
            Err(TraceError::EmptyProcesses { line: 3 })
        );
    }

    #[test]
    fn test_duplicate_directive() {
        let text = "\
# system_processes: P
# system_processes: Q
eid,processes,vc,props
";
        assert_eq!(
            parse_trace(text),
            Err(TraceError::DuplicateDirective { line: 2 })
        );
    }
}
