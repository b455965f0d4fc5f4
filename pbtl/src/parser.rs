// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Parser for the PBTL property language.

use crate::syntax::*;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use peg::{error::ParseError, str::LineCol};

peg::parser! {

grammar parser() for str {
    rule ident_start() = ['a'..='z' | 'A'..='Z' | '_']
    rule ident_char() = ident_start() / ['0'..='9']
    pub(super) rule ident() -> String
    = s:$(quiet!{ident_start() ident_char()*} / expected!("identifier"))
    { s.to_string() }

    rule whitespace() = quiet! { [' ' | '\t' | '\n' | '\r'] }
    rule _ = whitespace()*

    // `EP`, `TRUE`, and `FALSE` are reserved regardless of case; all other
    // identifiers are case-sensitive propositions.
    rule ep_kw() = quiet!{ ['E' | 'e'] ['P' | 'p'] !ident_char() } / expected!("`EP`")

    // Workaround for a peg `precedence!` limitation: fallible (`{? ... }`)
    // actions are not recognized when written inline inside a precedence
    // level, so the action lives in its own rule referenced from there.
    rule atom_ident() -> Formula = s:ident() {? match s {
        _ if s.eq_ignore_ascii_case("true") => Ok(Formula::Literal(true)),
        _ if s.eq_ignore_ascii_case("false") => Ok(Formula::Literal(false)),
        _ if s.eq_ignore_ascii_case("ep") => Err("`EP(..)`"),
        _ => Ok(Formula::Prop(s)),
    } }

    pub(super) rule formula() -> Formula = precedence!{
        x:(@) _ "|" _ y:@ { Formula::or([x, y]) }
        --
        x:(@) _ "&" _ y:@ { Formula::and([x, y]) }
        --
        "!" _ x:@ { Formula::negate(x) }
        --
        ep_kw() _ "(" _ f:formula() _ ")" { Formula::past(f) }
        x:atom_ident() { x }
        "(" _ f:formula() _ ")" { f }
    }

    pub(super) rule property() -> Formula
    = _ f:formula() _ { f }
}
}

/// Parse a single formula, panicking on failure (for tests).
pub fn formula(s: &str) -> Formula {
    parser::formula(s).expect("test formula should parse")
}

/// Parse a PBTL property, reporting a position-carrying error on failure.
pub fn parse(s: &str) -> Result<Formula, ParseError<LineCol>> {
    parser::property(s)
}

/// Convert an opaque FileId and error to a readable `Diagnostic`
pub fn parse_error_diagnostic<FileId>(
    file_id: FileId,
    e: &ParseError<LineCol>,
) -> Diagnostic<FileId> {
    Diagnostic::error()
        .with_message("could not parse property")
        .with_labels(vec![Label::primary(
            file_id,
            e.location.offset..e.location.offset + 1,
        )
        .with_message(format!("expected {}", e.expected))])
}
