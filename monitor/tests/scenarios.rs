// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! End-to-end monitoring scenarios over hand-built traces.

use causal::{Event, ProcessSet, VectorClock};
use monitor::{Monitor, MonitorError, Verdict};
use pbtl::dlnf::Dlnf;
use pbtl::parser;

fn monitor(property: &str, procs: &[&str]) -> Monitor {
    let dlnf = Dlnf::new(&parser::formula(property)).expect("property should normalize");
    Monitor::new(dlnf, ProcessSet::new(procs.iter().copied()))
}

/// Event factory: participants and clock entries by process name; clock
/// components not mentioned default to zero.
fn event(m: &Monitor, eid: &str, parts: &[&str], vc: &[(&str, u64)], props: &[&str]) -> Event {
    let procs = m.processes();
    let mut clock = VectorClock::zero(procs.len());
    for (name, ts) in vc {
        clock.set(procs.get(name).expect("declared process"), *ts);
    }
    Event::new(
        eid,
        parts
            .iter()
            .map(|n| procs.get(n).expect("declared process"))
            .collect(),
        clock,
        props.iter().map(|s| s.to_string()).collect(),
    )
}

#[test]
fn request_response_true() {
    // one rendezvous carries the request, the next the response; a single
    // frontier ends up covering both in its past
    let mut m = monitor("EP(EP(request) & EP(response))", &["Client", "Server"]);

    let req = event(
        &m,
        "req",
        &["Client", "Server"],
        &[("Client", 1), ("Server", 1)],
        &["request"],
    );
    assert_eq!(m.absorb(req), Ok(Verdict::Inconclusive));

    let resp = event(
        &m,
        "resp",
        &["Server", "Client"],
        &[("Client", 2), ("Server", 2)],
        &["response"],
    );
    assert_eq!(m.absorb(resp), Ok(Verdict::True));
}

#[test]
fn causality_violation_aborts() {
    // Worker's clock jumps to 2, then the next event claims clock 1
    let mut m = monitor(
        "EP(EP(process_started) & !EP(fatal_error))",
        &["Worker"],
    );

    let start = event(&m, "start", &["Worker"], &[("Worker", 2)], &["process_started"]);
    m.absorb(start).expect("a clock gap alone is not a violation");

    let error = event(&m, "error", &["Worker"], &[("Worker", 1)], &["fatal_error"]);
    assert_eq!(
        m.absorb(error),
        Err(MonitorError::ClockNotAdvanced {
            eid: "error".to_string(),
            process: "Worker".to_string(),
            seen: 2,
            got: 1,
        })
    );
}

#[test]
fn consensus_true() {
    let mut m = monitor(
        "EP(EP(prepare) & EP(commit) & !EP(abort))",
        &["Node1", "Node2", "Node3"],
    );

    let events = [
        ("prep1", vec!["Node1"], vec![("Node1", 1)], vec!["prepare"]),
        ("prep2", vec!["Node2"], vec![("Node2", 1)], vec!["prepare"]),
        ("prep3", vec!["Node3"], vec![("Node3", 1)], vec!["prepare"]),
    ];
    for (eid, parts, vc, props) in &events {
        let e = event(&m, eid, parts, vc, props);
        assert_eq!(m.absorb(e), Ok(Verdict::Inconclusive), "{eid}");
    }

    let commit = event(
        &m,
        "commit",
        &["Node1", "Node2", "Node3"],
        &[("Node1", 2), ("Node2", 2), ("Node3", 2)],
        &["commit"],
    );
    assert_eq!(m.absorb(commit), Ok(Verdict::True));
}

#[test]
fn dormant_then_orchestrated_true_at_decide() {
    // four workers tick with dormant props; a late orchestrated cycle
    // carries a and b towards PV, and the closing rendezvous delivers c —
    // only there does one cut cover the whole P side, with d never seen
    let mut m = monitor(
        "EP(EP(a) & EP(b) & EP(c) & !EP(d))",
        &["PA", "PB", "PC", "PD", "PV"],
    );

    let dormant = [
        ("t1", "PA", 1u64, "pa_idle"),
        ("t2", "PB", 1, "pb_idle"),
        ("t3", "PC", 1, "pc_idle"),
        ("t4", "PD", 1, "pd_idle"),
        ("t5", "PV", 1, "pv_idle"),
    ];
    for &(eid, p, ts, prop) in &dormant {
        let e = event(&m, eid, &[p], &[(p, ts)], &[prop]);
        assert_eq!(m.absorb(e), Ok(Verdict::Inconclusive), "{eid}");
    }

    let cycle: [(&str, Vec<&str>, Vec<(&str, u64)>, Vec<&str>); 5] = [
        ("ea", vec!["PA"], vec![("PA", 2)], vec!["a"]),
        (
            "sync_ab",
            vec!["PA", "PB"],
            vec![("PA", 3), ("PB", 2)],
            vec![],
        ),
        (
            "eb",
            vec!["PB"],
            vec![("PA", 3), ("PB", 3)],
            vec!["b"],
        ),
        (
            "sync_bc",
            vec!["PB", "PC"],
            vec![("PA", 3), ("PB", 4), ("PC", 2)],
            vec![],
        ),
        (
            "PV_decide",
            vec!["PC", "PV"],
            vec![("PA", 3), ("PB", 4), ("PC", 3), ("PV", 2)],
            vec!["c", "pv_decide"],
        ),
    ];
    for (i, (eid, parts, vc, props)) in cycle.iter().enumerate() {
        let e = event(&m, eid, parts, vc, props);
        let expected = if i + 1 == cycle.len() {
            Verdict::True
        } else {
            Verdict::Inconclusive
        };
        assert_eq!(m.absorb(e), Ok(expected), "{eid}");
    }
}

#[test]
fn forbidden_proposition_permanent_false() {
    let mut m = monitor("!EP(bad)", &["P"]);

    let e = event(&m, "e1", &["P"], &[("P", 1)], &["bad"]);
    assert_eq!(m.absorb(e), Ok(Verdict::False));

    // stable for any extension
    let e = event(&m, "e2", &["P"], &[("P", 2)], &[]);
    assert_eq!(m.absorb(e), Ok(Verdict::False));
}

#[test]
fn m_only_true_at_decide() {
    let mut m = monitor(
        "EP(status_ok & load_lt_100 & !critical_alarm)",
        &["Sensor"],
    );

    let boot = event(&m, "boot", &["Sensor"], &[("Sensor", 1)], &["status_ok", "critical_alarm"]);
    assert_eq!(m.absorb(boot), Ok(Verdict::Inconclusive));

    let decide = event(
        &m,
        "M_decide",
        &["Sensor"],
        &[("Sensor", 2)],
        &["status_ok", "load_lt_100"],
    );
    assert_eq!(m.absorb(decide), Ok(Verdict::True));
}

#[test]
fn m_only_concurrent_literals() {
    // p and q live on concurrent events, but one consistent cut has both
    // as its per-process latest state
    let mut m = monitor("EP(p & q)", &["P", "Q"]);
    let e1 = event(&m, "p1", &["P"], &[("P", 1)], &["p"]);
    assert_eq!(m.absorb(e1), Ok(Verdict::Inconclusive));
    let e2 = event(&m, "q1", &["Q"], &[("Q", 1)], &["q"]);
    assert_eq!(m.absorb(e2), Ok(Verdict::True));
}

#[test]
fn m_only_never_satisfied_stays_inconclusive() {
    let mut m = monitor("EP(x)", &["P"]);
    let e = event(&m, "e1", &["P"], &[("P", 1)], &["y"]);
    assert_eq!(m.absorb(e), Ok(Verdict::Inconclusive));
}

#[test]
fn p_before_n_true_and_terminal() {
    // EP(p) satisfied while no q has been seen; the later q cannot revoke
    let mut m = monitor("EP(EP(p) & !EP(q))", &["P"]);
    let e1 = event(&m, "p_event", &["P"], &[("P", 1)], &["p"]);
    assert_eq!(m.absorb(e1), Ok(Verdict::True));
    let e2 = event(&m, "q_event", &["P"], &[("P", 2)], &["q"]);
    assert_eq!(m.absorb(e2), Ok(Verdict::True));
}

#[test]
fn n_before_p_false() {
    let mut m = monitor("EP(EP(p) & !EP(q))", &["P"]);
    let e1 = event(&m, "q_event", &["P"], &[("P", 1)], &["q"]);
    assert_eq!(m.absorb(e1), Ok(Verdict::Inconclusive));
    // once p appears, every cut covering it also covers q
    let e2 = event(&m, "p_event", &["P"], &[("P", 2)], &["p"]);
    assert_eq!(m.absorb(e2), Ok(Verdict::False));
}

#[test]
fn concurrent_n_constraint_does_not_block() {
    // the forbidden r is concurrent with both p and q: the minimal cut
    // covering p and q does not contain r, so the disjunct succeeds even
    // though every retained frontier has absorbed r by then
    let mut m = monitor("EP(EP(p) & EP(q) & !EP(r))", &["PA", "PB", "PC"]);

    let steps: [(&str, Vec<&str>, Vec<(&str, u64)>, Vec<&str>, Verdict); 5] = [
        (
            "ev1",
            vec!["PB"],
            vec![("PB", 1)],
            vec!["q"],
            Verdict::Inconclusive,
        ),
        (
            "ev2",
            vec!["PA"],
            vec![("PA", 1)],
            vec!["pa_setup"],
            Verdict::Inconclusive,
        ),
        (
            "ev3",
            vec!["PC"],
            vec![("PC", 1)],
            vec!["pc_setup"],
            Verdict::Inconclusive,
        ),
        (
            "ev4",
            vec!["PC"],
            vec![("PC", 2)],
            vec!["r"],
            Verdict::Inconclusive,
        ),
        ("ev5", vec!["PA"], vec![("PA", 2)], vec!["p"], Verdict::True),
    ];
    for (eid, parts, vc, props, expected) in &steps {
        let e = event(&m, eid, parts, vc, props);
        assert_eq!(m.absorb(e), Ok(*expected), "{eid}");
    }
}

#[test]
fn disjunction_one_branch_suffices() {
    let mut m = monitor("EP(x) | EP(y)", &["P"]);
    let e = event(&m, "e1", &["P"], &[("P", 1)], &["y"]);
    assert_eq!(m.absorb(e), Ok(Verdict::True));
}

#[test]
fn all_disjuncts_false_is_false() {
    let mut m = monitor("!EP(a) | !EP(b)", &["P"]);
    let e = event(&m, "e1", &["P"], &[("P", 1)], &["a", "b"]);
    assert_eq!(m.absorb(e), Ok(Verdict::False));
}

#[test]
fn n_only_clean_first_event_is_terminal_true() {
    let mut m = monitor("!EP(r)", &["P"]);
    let e1 = event(&m, "tick", &["P"], &[("P", 1)], &[]);
    assert_eq!(m.absorb(e1), Ok(Verdict::True));
    // a later r does not revoke the witnessed r-free state
    let e2 = event(&m, "r_event", &["P"], &[("P", 2)], &["r"]);
    assert_eq!(m.absorb(e2), Ok(Verdict::True));
}

#[test]
fn n_only_iota_is_always_false() {
    // iota is in every cut's past from time zero
    let mut m = monitor("!EP(iota)", &["P"]);
    let e = event(&m, "e1", &["P"], &[("P", 1)], &[]);
    assert_eq!(m.absorb(e), Ok(Verdict::False));
}

#[test]
fn p_iota_true_immediately() {
    let mut m = monitor("EP(EP(iota))", &["P"]);
    let e = event(&m, "e1", &["P"], &[("P", 1)], &[]);
    assert_eq!(m.absorb(e), Ok(Verdict::True));
}

#[test]
fn verdict_monotone_under_extension() {
    // drive one monitor to TRUE and another to FALSE, then extend both
    let mut t = monitor("EP(p)", &["P", "Q"]);
    let e = event(&t, "e1", &["P"], &[("P", 1)], &["p"]);
    t.absorb(e).unwrap();
    assert_eq!(t.verdict(), Verdict::True);

    let mut f = monitor("!EP(p)", &["P", "Q"]);
    let e = event(&f, "e1", &["P"], &[("P", 1)], &["p"]);
    f.absorb(e).unwrap();
    assert_eq!(f.verdict(), Verdict::False);

    for (i, m) in [&mut t, &mut f].into_iter().enumerate() {
        let before = m.verdict();
        let e = event(m, "ext", &["Q"], &[("Q", 1)], &["p", "q"]);
        m.absorb(e).unwrap();
        assert_eq!(m.verdict(), before, "verdict changed on extension ({i})");
    }
}

#[test]
fn multi_owner_rendezvous_satisfies_m_conjunction() {
    // a joint event is the latest state of both owners at once
    let mut m = monitor("EP(handshake)", &["P", "Q"]);
    let e1 = event(&m, "e1", &["P"], &[("P", 1)], &[]);
    m.absorb(e1).unwrap();
    let sync = event(
        &m,
        "sync",
        &["P", "Q"],
        &[("P", 2), ("Q", 1)],
        &["handshake"],
    );
    assert_eq!(m.absorb(sync), Ok(Verdict::True));
}
