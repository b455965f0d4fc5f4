// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Convert formulas to Disjunctive Literal Normal Form (DLNF).
//!
//! A DLNF formula is a disjunction of conjunctions whose atoms are
//! propositions, negated propositions, `EP`-wrapped propositions, or
//! negated `EP`-wrapped propositions, and no disjunction remains inside
//! any `EP`. See the documentation for [`Dlnf`] for details.

use std::fmt;

use crate::printer;
use crate::syntax::{Formula, NOp, UOp};
use itertools::Itertools;
use thiserror::Error;

/// Default bound on the number of DNF clauses produced while normalizing.
///
/// Distribution of `&` over `|` is exponential in the worst case; rather
/// than bound it algorithmically, normalization fails once a product step
/// would exceed this many clauses.
pub const DEFAULT_CLAUSE_LIMIT: usize = 4096;

/// The result of an unsuccessful attempt to normalize a formula.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    /// The formula exceeds the DLNF-reducible subset
    #[error("formula is outside the DLNF-reducible subset: {}", printer::formula(.0))]
    Unsupported(Formula),
    /// Distribution to DNF exceeded the clause limit
    #[error("normal form exceeds the limit of {0} clauses")]
    TooLarge(usize),
}

/// A conjunction of atomic factors, as produced by DNF conversion.
type Clause = Vec<Formula>;

fn cartesian_product(v: &[Vec<Clause>], limit: usize) -> Result<Vec<Clause>, NormalizeError> {
    let mut result: Vec<Clause> = vec![vec![]];
    for part in v {
        if result.len().saturating_mul(part.len()) > limit {
            return Err(NormalizeError::TooLarge(limit));
        }
        result = result
            .into_iter()
            .cartesian_product(part.iter())
            .map(|(mut left, right)| {
                left.extend(right.iter().cloned());
                left
            })
            .collect();
    }
    Ok(result)
}

/// Convert a boolean formula into DNF clauses over atomic factors.
///
/// Assumes `EP` bodies have already been distributed, so `EP` nodes (and
/// their negations) are treated as atoms.
fn to_dnf(f: &Formula, limit: usize) -> Result<Vec<Clause>, NormalizeError> {
    if f.is_atomic() {
        return Ok(vec![vec![f.clone()]]);
    }
    match f {
        Formula::NAryOp(NOp::Or, fs) => {
            let mut clauses = vec![];
            for sub in fs {
                clauses.extend(to_dnf(sub, limit)?);
                if clauses.len() > limit {
                    return Err(NormalizeError::TooLarge(limit));
                }
            }
            Ok(clauses)
        }
        Formula::NAryOp(NOp::And, fs) => {
            let parts = fs
                .iter()
                .map(|sub| to_dnf(sub, limit))
                .collect::<Result<Vec<_>, _>>()?;
            cartesian_product(&parts, limit)
        }
        Formula::UnaryOp(UOp::Not, inner) => {
            // De Morgan and double negation; `is_atomic` already covered
            // negations that stop at a proposition, constant, or EP node
            to_dnf(&Formula::negate_and_simplify((**inner).clone()), limit)
        }
        _ => unreachable!("non-atomic formula not covered by DNF conversion"),
    }
}

/// Rewrite all `EP` bodies bottom-up, distributing `EP` over `|`:
/// `EP(a | b)` becomes `EP(a) | EP(b)`, with each surviving `EP` wrapping a
/// single conjunction of atoms.
fn distribute(f: &Formula, limit: usize) -> Result<Formula, NormalizeError> {
    match f {
        Formula::Literal(_) | Formula::Prop(_) => Ok(f.clone()),
        Formula::UnaryOp(UOp::Not, x) => {
            let t = distribute(x, limit)?;
            match t {
                Formula::UnaryOp(UOp::Not, inner) => Ok(*inner),
                _ => Ok(Formula::negate(t)),
            }
        }
        Formula::UnaryOp(UOp::Past, body) => {
            let body = distribute(body, limit)?;
            let clauses = to_dnf(&body, limit)?;
            Ok(Formula::or(
                clauses
                    .into_iter()
                    .map(|c| Formula::past(Formula::and(c))),
            ))
        }
        Formula::NAryOp(NOp::And, fs) => Ok(Formula::and(
            fs.iter()
                .map(|sub| distribute(sub, limit))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Formula::NAryOp(NOp::Or, fs) => Ok(Formula::or(
            fs.iter()
                .map(|sub| distribute(sub, limit))
                .collect::<Result<Vec<_>, _>>()?,
        )),
    }
}

/// Rewrite a formula into DLNF shape: a disjunction of conjunctions of
/// atoms with no `|` under any `EP`. The rewrite is idempotent.
pub fn normalize(f: &Formula) -> Result<Formula, NormalizeError> {
    normalize_with_limit(f, DEFAULT_CLAUSE_LIMIT)
}

/// [`normalize`] with an explicit clause limit.
pub fn normalize_with_limit(f: &Formula, limit: usize) -> Result<Formula, NormalizeError> {
    let t = distribute(f, limit)?;
    let clauses = to_dnf(&t, limit)?;
    Ok(Formula::or(clauses.into_iter().map(Formula::and)))
}

/// An atom of a DLNF disjunct.
#[derive(PartialEq, Eq, Clone, Debug, Hash, PartialOrd, Ord)]
pub enum Literal {
    /// `p` — the proposition must hold at the witnessing frontier
    Prop(String),
    /// `!p` — the proposition must not hold at the witnessing frontier
    NegProp(String),
    /// `EP(p)` — the proposition must appear in the frontier's causal past
    Past(String),
    /// `!EP(p)` — the proposition must never appear in that causal past
    NegPast(String),
}

impl Literal {
    /// The proposition this literal constrains.
    pub fn prop(&self) -> &str {
        match self {
            Literal::Prop(p) | Literal::NegProp(p) | Literal::Past(p) | Literal::NegPast(p) => p,
        }
    }

    /// Reconstruct the literal as a formula.
    pub fn to_formula(&self) -> Formula {
        match self {
            Literal::Prop(p) => Formula::prop(p),
            Literal::NegProp(p) => Formula::negate(Formula::prop(p)),
            Literal::Past(p) => Formula::past(Formula::prop(p)),
            Literal::NegPast(p) => Formula::negate(Formula::past(Formula::prop(p))),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::formula(&self.to_formula()))
    }
}

/// One conjunction of a DLNF formula.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct Disjunct {
    /// The disjunct's literals; an empty list is trivially true.
    pub literals: Vec<Literal>,
}

impl Disjunct {
    /// True if the disjunct has no literals left after constant folding.
    pub fn is_trivially_true(&self) -> bool {
        self.literals.is_empty()
    }

    /// Reconstruct the disjunct as a conjunction.
    pub fn to_formula(&self) -> Formula {
        Formula::and(self.literals.iter().map(|l| l.to_formula()))
    }
}

impl fmt::Display for Disjunct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::formula(&self.to_formula()))
    }
}

/// A formula in Disjunctive Literal Normal Form: the list of disjuncts the
/// monitor evaluates independently and combines with boolean OR.
///
/// A top-level clause consisting of exactly one `EP(..)` node is absorbed:
/// the `EP` body's factors become the disjunct's literals, because the
/// monitor's exists-a-frontier search realizes the outer `EP`.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Dlnf {
    /// The disjuncts; an empty list is the constant false.
    pub disjuncts: Vec<Disjunct>,
}

impl Dlnf {
    /// Build a DLNF out of any formula in the reducible subset.
    pub fn new(f: &Formula) -> Result<Self, NormalizeError> {
        Self::with_clause_limit(f, DEFAULT_CLAUSE_LIMIT)
    }

    /// [`Dlnf::new`] with an explicit clause limit.
    pub fn with_clause_limit(f: &Formula, limit: usize) -> Result<Self, NormalizeError> {
        let norm = normalize_with_limit(f, limit)?;
        let clauses = match norm {
            Formula::NAryOp(NOp::Or, fs) => fs,
            other => vec![other],
        };
        let mut disjuncts = vec![];
        for clause in clauses {
            if let Some(d) = extract_disjunct(clause)? {
                disjuncts.push(d);
            }
        }
        Ok(Dlnf { disjuncts })
    }

    /// Reconstruct the DLNF as a formula (absorbed outer `EP`s are not
    /// reintroduced; the result is equivalent under monitoring).
    pub fn to_formula(&self) -> Formula {
        Formula::or(self.disjuncts.iter().map(|d| d.to_formula()))
    }
}

impl fmt::Display for Dlnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::formula(&self.to_formula()))
    }
}

fn conjuncts(f: Formula) -> Vec<Formula> {
    match f {
        Formula::NAryOp(NOp::And, fs) => fs.into_iter().flat_map(conjuncts).collect(),
        _ => vec![f],
    }
}

/// Classify one normalized clause into literals. Returns `None` if the
/// clause folds to false.
fn extract_disjunct(clause: Formula) -> Result<Option<Disjunct>, NormalizeError> {
    let mut factors = conjuncts(clause);

    // A clause that is exactly one EP node is an absorbed outer EP: its
    // body's conjuncts are the disjunct's literals.
    if factors.len() == 1 {
        if let Formula::UnaryOp(UOp::Past, body) = &factors[0] {
            factors = conjuncts((**body).clone());
        }
    }

    let mut literals = vec![];
    for factor in factors {
        match factor {
            Formula::Literal(true) => {}
            Formula::Literal(false) => return Ok(None),
            Formula::Prop(p) => literals.push(Literal::Prop(p)),
            Formula::UnaryOp(UOp::Past, body) => match *body {
                Formula::Prop(p) => literals.push(Literal::Past(p)),
                // EP(true) holds at every cut; EP(false) at none
                Formula::Literal(true) => {}
                Formula::Literal(false) => return Ok(None),
                other => {
                    return Err(NormalizeError::Unsupported(Formula::past(other)));
                }
            },
            Formula::UnaryOp(UOp::Not, inner) => match *inner {
                Formula::Prop(p) => literals.push(Literal::NegProp(p)),
                Formula::Literal(b) => {
                    if b {
                        return Ok(None);
                    }
                }
                Formula::UnaryOp(UOp::Past, body) => match *body {
                    Formula::Prop(p) => literals.push(Literal::NegPast(p)),
                    Formula::Literal(false) => {}
                    Formula::Literal(true) => return Ok(None),
                    other => {
                        return Err(NormalizeError::Unsupported(Formula::negate(
                            Formula::past(other),
                        )));
                    }
                },
                other => return Err(NormalizeError::Unsupported(Formula::negate(other))),
            },
            other => return Err(NormalizeError::Unsupported(other)),
        }
    }
    Ok(Some(Disjunct { literals }))
}
