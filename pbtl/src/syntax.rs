// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The PBTL AST for property formulas.

use serde::Serialize;

/// Unary operators
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum UOp {
    /// Boolean negation
    Not,
    /// "Exists in the past" temporal modality, written `EP(..)`
    Past,
}

/// N-ary logical operators
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum NOp {
    And,
    Or,
}

/// A PBTL formula over atomic propositions. A formula is interpreted at a
/// consistent cut of a partial-order execution: propositions refer to the
/// cut's current state, and `EP` reaches into its causal past.
#[derive(PartialEq, Eq, Clone, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum Formula {
    /// A constant true or false
    Literal(bool),
    /// An atomic proposition
    Prop(String),
    /// An applied unary operation
    UnaryOp(UOp, Box<Formula>),
    /// An applied n-ary operation
    NAryOp(NOp, Vec<Formula>),
}

impl Formula {
    /// Flatten an n-ary operation one level deep.
    fn flatten_nary(self) -> Self {
        match self {
            Self::NAryOp(op, ts) => {
                let new_ts = ts
                    .into_iter()
                    .flat_map(|t| match t {
                        Self::NAryOp(op2, ts2) if op == op2 => ts2,
                        _ => vec![t],
                    })
                    .collect();
                Self::NAryOp(op, new_ts)
            }
            _ => self,
        }
    }

    /// Smart constructor for a proposition
    pub fn prop<S: AsRef<str>>(name: S) -> Self {
        Self::Prop(name.as_ref().to_string())
    }

    /// Smart constructor equivalent to the And of an iterator of formulas
    pub fn and<I>(ts: I) -> Self
    where
        I: IntoIterator<Item = Formula>,
    {
        let mut ts: Vec<Formula> = ts.into_iter().collect();
        if ts.is_empty() {
            return Formula::Literal(true);
        } else if ts.len() == 1 {
            return ts.pop().unwrap();
        }
        Self::NAryOp(NOp::And, ts).flatten_nary()
    }

    /// Smart constructor equivalent to the Or of an iterator of formulas
    pub fn or<I>(ts: I) -> Self
    where
        I: IntoIterator<Item = Formula>,
    {
        let mut ts: Vec<Formula> = ts.into_iter().collect();
        if ts.is_empty() {
            return Formula::Literal(false);
        } else if ts.len() == 1 {
            return ts.pop().unwrap();
        }
        Self::NAryOp(NOp::Or, ts).flatten_nary()
    }

    /// Convenience function to create `!f`
    pub fn negate(f: Formula) -> Self {
        Self::UnaryOp(UOp::Not, Box::new(f))
    }

    /// Convenience function to create `EP(f)`
    pub fn past(f: Formula) -> Self {
        Self::UnaryOp(UOp::Past, Box::new(f))
    }

    /// Construct a simplified formula logically equivalent to `!f`.
    ///
    /// Pushes the negation through constants, double negation, and the
    /// n-ary connectives by De Morgan. Negation stops at `EP`: `!EP(f)` is
    /// kept as-is, since the duality is handled by the DLNF transformer.
    pub fn negate_and_simplify(f: Formula) -> Self {
        match f {
            Formula::Literal(b) => Formula::Literal(!b),
            Formula::UnaryOp(UOp::Not, f) => *f,
            Formula::UnaryOp(UOp::Past, _) => Formula::negate(f),
            Formula::NAryOp(NOp::Or, fs) => Formula::NAryOp(
                NOp::And,
                fs.into_iter().map(Formula::negate_and_simplify).collect(),
            ),
            Formula::NAryOp(NOp::And, fs) => Formula::NAryOp(
                NOp::Or,
                fs.into_iter().map(Formula::negate_and_simplify).collect(),
            ),
            Formula::Prop(_) => Formula::negate(f),
        }
    }

    /// True if this formula is a proposition, a constant, an `EP` node, or
    /// a negation of one of those. These are the atoms DNF clauses range
    /// over.
    pub fn is_atomic(&self) -> bool {
        match self {
            Formula::Literal(_) | Formula::Prop(_) => true,
            Formula::UnaryOp(UOp::Past, _) => true,
            Formula::UnaryOp(UOp::Not, f) => {
                matches!(
                    f.as_ref(),
                    Formula::Literal(_) | Formula::Prop(_) | Formula::UnaryOp(UOp::Past, _)
                )
            }
            Formula::NAryOp(..) => false,
        }
    }
}
