// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The causality model for partial-order executions: a fixed process
//! universe, vector clocks, events, consistent cuts, and the trace reader.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::large_enum_variant)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod clock;
pub mod event;
pub mod frontier;
pub mod process;
pub mod reader;

pub use clock::VectorClock;
pub use event::{Event, EventArena, EventId, IOTA};
pub use frontier::Frontier;
pub use process::{ProcessId, ProcessSet};
