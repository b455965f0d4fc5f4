// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Pretty-printer for PBTL formulas, with as few parentheses as possible.

use std::fmt;

use crate::syntax::*;

fn precedence(f: &Formula) -> usize {
    use Formula::*;
    use NOp::*;
    use UOp::*;

    match f {
        NAryOp(Or, _) => 40,
        NAryOp(And, _) => 50,
        UnaryOp(Not, _) => 70,
        // EP always prints its own parentheses
        UnaryOp(Past, _) | Literal(_) | Prop(_) => 1000,
    }
}

fn parens(add_parens: bool, s: String) -> String {
    if add_parens {
        format!("({s})")
    } else {
        s
    }
}

/// Render a formula in concrete PBTL syntax.
pub fn formula(f: &Formula) -> String {
    match f {
        Formula::Literal(false) => "false".to_string(),
        Formula::Literal(true) => "true".to_string(),
        Formula::Prop(name) => name.to_string(),
        Formula::UnaryOp(UOp::Not, arg) => {
            let arg = parens(precedence(f) > precedence(arg), formula(arg));
            format!("!{arg}")
        }
        Formula::UnaryOp(UOp::Past, arg) => format!("EP({})", formula(arg)),
        Formula::NAryOp(op, args) => {
            let args = args
                .iter()
                .map(|arg| parens(precedence(f) > precedence(arg), formula(arg)))
                .collect::<Vec<_>>();
            let op = match op {
                NOp::And => "&",
                NOp::Or => "|",
            };
            args.join(&format!(" {op} "))
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", formula(self))
    }
}
