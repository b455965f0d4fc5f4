// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The vigil binary's command-line interface.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use codespan_reporting::{
    files::SimpleFile,
    term::{
        self as terminal,
        termcolor::{ColorChoice, StandardStream},
    },
};

use causal::reader::{self, Trace};
use monitor::Monitor;
use pbtl::dlnf::Dlnf;
use pbtl::parser::parse_error_diagnostic;

// Exit codes: 0 is a completed run regardless of verdict.
const EXIT_TRACE: i32 = 1;
const EXIT_FORMULA: i32 = 2;
const EXIT_IO: i32 = 3;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Entrypoint for the vigil binary.
pub struct App {
    /// Path to the PBTL property file
    #[arg(short = 'p', long = "property")]
    property: PathBuf,

    /// Path to the CSV trace file
    #[arg(short = 't', long = "trace")]
    trace: PathBuf,

    /// Print a log line for every absorbed event
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Enable debug output (implies --verbose)
    #[arg(long)]
    debug: bool,

    /// Only validate the property and trace files, then exit
    #[arg(long)]
    validate_only: bool,

    /// Stop consuming the trace once the verdict is conclusive
    #[arg(long)]
    stop_on_verdict: bool,

    /// Print the per-disjunct breakdown after the final verdict
    #[arg(long)]
    debug_final: bool,
}

impl App {
    /// Run the application, returning the process exit code.
    pub fn exec(self) -> i32 {
        let level = if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        };
        let _ = pretty_env_logger::formatted_builder()
            .filter_level(level)
            .try_init();

        // property
        let property_text = match fs::read_to_string(&self.property) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("could not read property file {}: {err}", self.property.display());
                return EXIT_IO;
            }
        };
        if property_text.trim().is_empty() {
            eprintln!("property file {} is empty", self.property.display());
            return EXIT_FORMULA;
        }

        let formula = match pbtl::parser::parse(&property_text) {
            Ok(f) => f,
            Err(err) => {
                let files = SimpleFile::new(self.property.display().to_string(), &property_text);
                let writer = StandardStream::stderr(ColorChoice::Auto);
                let config = codespan_reporting::term::Config::default();
                let diagnostic = parse_error_diagnostic((), &err);
                terminal::emit(&mut writer.lock(), &config, &files, &diagnostic)
                    .expect("could not emit diagnostic");
                return EXIT_FORMULA;
            }
        };
        let dlnf = match Dlnf::new(&formula) {
            Ok(d) => d,
            Err(err) => {
                eprintln!("property error: {err}");
                return EXIT_FORMULA;
            }
        };

        // trace
        let trace_text = match fs::read_to_string(&self.trace) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("could not read trace file {}: {err}", self.trace.display());
                return EXIT_IO;
            }
        };
        let trace = match reader::parse_trace(&trace_text) {
            Ok(t) => t,
            Err(err) => {
                eprintln!("trace error in {}: {err}", self.trace.display());
                return EXIT_TRACE;
            }
        };
        if !trace.declared {
            eprintln!(
                "note: no system_processes directive; universe inferred from {} observed processes",
                trace.processes.len()
            );
        }

        if self.validate_only {
            println!(
                "trace OK: {} events over {} processes",
                trace.events.len(),
                trace.processes.len()
            );
            return 0;
        }

        println!("Property: {}", pbtl::printer::formula(&formula));
        self.monitor_trace(dlnf, trace)
    }

    fn monitor_trace(&self, dlnf: Dlnf, trace: Trace) -> i32 {
        let Trace {
            processes, events, ..
        } = trace;

        let mut mon = Monitor::new(dlnf, processes);
        mon.set_stop_on_verdict(self.stop_on_verdict);

        for event in events {
            let header = event.display(mon.processes()).to_string();
            match mon.absorb(event) {
                Ok(verdict) => {
                    if self.verbose || self.debug {
                        println!(
                            "{header} -> frontiers={}, verdict={verdict}",
                            mon.frontier_summary()
                        );
                    }
                    if self.stop_on_verdict && verdict.is_conclusive() {
                        break;
                    }
                }
                Err(err) => {
                    eprintln!("{err}");
                    return EXIT_TRACE;
                }
            }
        }

        println!("FINAL VERDICT: {}", mon.verdict());

        if self.debug_final {
            println!("Disjunct breakdown:");
            for (i, report) in mon.reports().iter().enumerate() {
                let witness = match &report.witness {
                    Some(w) => format!(" at {w}"),
                    None => String::new(),
                };
                println!(
                    "  {i} [{}] {}: {}{witness}",
                    report.case, report.formula, report.verdict
                );
            }
        }

        0
    }
}
