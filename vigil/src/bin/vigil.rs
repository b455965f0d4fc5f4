// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

use clap::Parser;
use std::process;
use vigil::App;

fn main() {
    let app = App::parse();
    process::exit(app.exec());
}
