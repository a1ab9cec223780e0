//! Facts about a [`Symbol`](crate::Symbol) which constrain how it may be
//! simplified.

use crate::symbol::SymbolError;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// Something which may be known to be true (or false) about a symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Assumption {
    Real,
    Positive,
    Negative,
    Nonnegative,
    Nonpositive,
    Nonzero,
    Integer,
}

impl Assumption {
    pub const ALL: [Assumption; 7] = [
        Assumption::Real,
        Assumption::Positive,
        Assumption::Negative,
        Assumption::Nonnegative,
        Assumption::Nonpositive,
        Assumption::Nonzero,
        Assumption::Integer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Assumption::Real => "real",
            Assumption::Positive => "positive",
            Assumption::Negative => "negative",
            Assumption::Nonnegative => "nonnegative",
            Assumption::Nonpositive => "nonpositive",
            Assumption::Nonzero => "nonzero",
            Assumption::Integer => "integer",
        }
    }

    fn index(self) -> usize { self as usize }
}

impl Display for Assumption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Assumption {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Assumption::ALL
            .iter()
            .copied()
            .find(|assumption| assumption.name() == s)
            .ok_or_else(|| SymbolError::UnknownAssumption { name: s.into() })
    }
}

/// Each entry reads "if `premise` holds then so does `conclusion`". The
/// contrapositive of every entry is applied as well.
const IMPLICATIONS: &[((Assumption, bool), (Assumption, bool))] = &[
    ((Assumption::Positive, true), (Assumption::Real, true)),
    ((Assumption::Positive, true), (Assumption::Nonnegative, true)),
    ((Assumption::Positive, true), (Assumption::Nonzero, true)),
    ((Assumption::Positive, true), (Assumption::Negative, false)),
    ((Assumption::Positive, true), (Assumption::Nonpositive, false)),
    ((Assumption::Negative, true), (Assumption::Real, true)),
    ((Assumption::Negative, true), (Assumption::Nonpositive, true)),
    ((Assumption::Negative, true), (Assumption::Nonzero, true)),
    ((Assumption::Negative, true), (Assumption::Nonnegative, false)),
    ((Assumption::Nonnegative, true), (Assumption::Real, true)),
    ((Assumption::Nonpositive, true), (Assumption::Real, true)),
    ((Assumption::Integer, true), (Assumption::Real, true)),
];

/// The set of everything known about a symbol.
///
/// Every fact is tri-state: known true, known false, or unknown. Adding a
/// fact also records everything it implies (e.g. `positive` implies `real`
/// and `nonzero`), and a fact which contradicts what is already known is
/// rejected.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Assumptions {
    facts: [Option<bool>; 7],
}

impl Assumptions {
    /// An empty set of assumptions, where nothing is known.
    pub fn new() -> Self { Assumptions::default() }

    pub fn real() -> Self { Assumptions::single(Assumption::Real) }

    pub fn positive() -> Self { Assumptions::single(Assumption::Positive) }

    pub fn negative() -> Self { Assumptions::single(Assumption::Negative) }

    pub fn nonnegative() -> Self {
        Assumptions::single(Assumption::Nonnegative)
    }

    pub fn nonpositive() -> Self {
        Assumptions::single(Assumption::Nonpositive)
    }

    pub fn nonzero() -> Self { Assumptions::single(Assumption::Nonzero) }

    pub fn integer() -> Self { Assumptions::single(Assumption::Integer) }

    fn single(assumption: Assumption) -> Self {
        Assumptions::new()
            .with(assumption, true)
            .expect("A single assumption is always consistent")
    }

    /// Add a fact, returning the extended set of assumptions.
    pub fn with(
        mut self,
        assumption: Assumption,
        value: bool,
    ) -> Result<Self, SymbolError> {
        self.insert(assumption, value)?;
        Ok(self)
    }

    /// Add a fact and everything it implies.
    ///
    /// The assumptions are left untouched if the fact contradicts something
    /// that is already known.
    pub fn insert(
        &mut self,
        assumption: Assumption,
        value: bool,
    ) -> Result<(), SymbolError> {
        let mut facts = self.facts;
        let mut pending = vec![(assumption, value)];

        while let Some((assumption, value)) = pending.pop() {
            match facts[assumption.index()] {
                Some(existing) if existing == value => continue,
                Some(_) => {
                    return Err(SymbolError::InconsistentAssumptions {
                        assumption,
                    })
                },
                None => facts[assumption.index()] = Some(value),
            }

            for &((premise, holds), (conclusion, follows)) in IMPLICATIONS {
                if premise == assumption && holds == value {
                    pending.push((conclusion, follows));
                }
                if conclusion == assumption && follows != value {
                    pending.push((premise, !holds));
                }
            }
        }

        self.facts = facts;
        Ok(())
    }

    /// What is known about a particular [`Assumption`], if anything.
    pub fn is(&self, assumption: Assumption) -> Option<bool> {
        self.facts[assumption.index()]
    }

    pub fn is_real(&self) -> Option<bool> { self.is(Assumption::Real) }

    pub fn is_positive(&self) -> Option<bool> { self.is(Assumption::Positive) }

    pub fn is_nonnegative(&self) -> Option<bool> {
        self.is(Assumption::Nonnegative)
    }

    pub fn is_nonpositive(&self) -> Option<bool> {
        self.is(Assumption::Nonpositive)
    }

    pub fn is_empty(&self) -> bool { self.facts.iter().all(Option::is_none) }

    /// Iterate over every known fact.
    pub fn iter(&self) -> impl Iterator<Item = (Assumption, bool)> + '_ {
        Assumption::ALL.iter().filter_map(move |&assumption| {
            self.is(assumption).map(|value| (assumption, value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_implies_its_consequences() {
        let got = Assumptions::positive();

        assert_eq!(got.is_real(), Some(true));
        assert_eq!(got.is_nonnegative(), Some(true));
        assert_eq!(got.is(Assumption::Nonzero), Some(true));
        assert_eq!(got.is(Assumption::Negative), Some(false));
        assert_eq!(got.is_nonpositive(), Some(false));
        assert_eq!(got.is(Assumption::Integer), None);
    }

    #[test]
    fn contrapositives_are_applied() {
        let got = Assumptions::new().with(Assumption::Real, false).unwrap();

        assert_eq!(got.is_positive(), Some(false));
        assert_eq!(got.is(Assumption::Negative), Some(false));
        assert_eq!(got.is(Assumption::Integer), Some(false));
        assert_eq!(got.is(Assumption::Nonzero), None);
    }

    #[test]
    fn contradictions_are_rejected() {
        let inputs = vec![
            (Assumptions::positive(), Assumption::Negative, true),
            (Assumptions::positive(), Assumption::Real, false),
            (Assumptions::negative(), Assumption::Nonnegative, true),
            (Assumptions::integer(), Assumption::Real, false),
        ];

        for (assumptions, assumption, value) in inputs {
            let got = assumptions.with(assumption, value);

            assert!(
                matches!(got, Err(SymbolError::InconsistentAssumptions { .. })),
                "{:?} + {}={} should be rejected",
                assumptions,
                assumption,
                value
            );
        }
    }

    #[test]
    fn failed_insert_leaves_assumptions_untouched() {
        let mut assumptions = Assumptions::positive();
        let before = assumptions;

        assert!(assumptions.insert(Assumption::Nonpositive, true).is_err());

        assert_eq!(assumptions, before);
    }

    #[test]
    fn redundant_facts_are_accepted() {
        let got = Assumptions::positive()
            .with(Assumption::Real, true)
            .unwrap()
            .with(Assumption::Negative, false)
            .unwrap();

        assert_eq!(got, Assumptions::positive());
    }

    #[test]
    fn parse_assumption_names() {
        for assumption in Assumption::ALL.iter().copied() {
            let got: Assumption = assumption.name().parse().unwrap();
            assert_eq!(got, assumption);
        }

        assert!("imaginary".parse::<Assumption>().is_err());
    }

    #[test]
    fn iterate_over_known_facts() {
        let got: Vec<_> = Assumptions::integer().iter().collect();

        assert_eq!(
            got,
            vec![(Assumption::Real, true), (Assumption::Integer, true)]
        );
    }
}
