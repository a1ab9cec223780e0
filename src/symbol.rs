use crate::assumptions::{Assumption, Assumptions};
use smol_str::SmolStr;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// An atomic placeholder in an [`Expression`](crate::Expression).
///
/// Two symbols are equal when they have the same name, decoration and
/// assumptions. That means a symbol named `x` which is known to be positive
/// is a different symbol to one named `x` about which nothing is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    name: SmolStr,
    decoration: Decoration,
    assumptions: Assumptions,
}

/// How a [`Symbol`]'s name is decorated when it gets rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Decoration {
    Plain,
    /// The change in a quantity, written `ΔX`.
    Delta,
}

impl Symbol {
    /// Create a symbol, checking that its name is a valid identifier.
    pub fn new<S>(name: S) -> Result<Self, SymbolError>
    where
        S: Into<SmolStr>,
    {
        Symbol::with_assumptions(name, Assumptions::new())
    }

    pub fn with_assumptions<S>(
        name: S,
        assumptions: Assumptions,
    ) -> Result<Self, SymbolError>
    where
        S: Into<SmolStr>,
    {
        let name = name.into();

        if !is_valid_name(&name) {
            return Err(SymbolError::InvalidName { name });
        }

        Ok(Symbol {
            name,
            decoration: Decoration::Plain,
            assumptions,
        })
    }

    /// Create a plain symbol with no assumptions, for names which are already
    /// known to be valid (e.g. because they came from the parser).
    pub fn named<S>(name: S) -> Self
    where
        S: Into<SmolStr>,
    {
        let name = name.into();
        debug_assert!(is_valid_name(&name), "\"{}\" is not a valid name", name);

        Symbol {
            name,
            decoration: Decoration::Plain,
            assumptions: Assumptions::new(),
        }
    }

    pub(crate) fn decorated(self, decoration: Decoration) -> Self {
        Symbol { decoration, ..self }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn decoration(&self) -> Decoration { self.decoration }

    pub fn is_delta(&self) -> bool { self.decoration == Decoration::Delta }

    pub fn assumptions(&self) -> &Assumptions { &self.assumptions }

    pub fn is(&self, assumption: Assumption) -> Option<bool> {
        self.assumptions.is(assumption)
    }
}

impl AsRef<Symbol> for Symbol {
    fn as_ref(&self) -> &Symbol { self }
}

/// Is this an identifier-like string which can be used as a [`Symbol`]'s
/// name?
///
/// `Δ` is reserved for [`Decoration::Delta`] and may not appear in a name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    let valid = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        },
        _ => false,
    };

    valid && !name.contains(DELTA)
}

pub(crate) const DELTA: char = 'Δ';

/// Possible errors when creating a [`Symbol`].
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolError {
    InvalidName { name: SmolStr },
    InconsistentAssumptions { assumption: Assumption },
    UnknownAssumption { name: SmolStr },
}

impl Display for SymbolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::InvalidName { name } => {
                write!(f, "\"{}\" is not a valid symbol name", name)
            },
            SymbolError::InconsistentAssumptions { assumption } => write!(
                f,
                "The \"{}\" assumption contradicts what is already known",
                assumption
            ),
            SymbolError::UnknownAssumption { name } => {
                write!(f, "Unknown assumption, \"{}\"", name)
            },
        }
    }
}

impl Error for SymbolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        let inputs = vec!["x", "T", "G_f", "_private", "var5", "θ"];

        for name in inputs {
            let got = Symbol::new(name).unwrap();
            assert_eq!(got.name(), name);
            assert_eq!(got.decoration(), Decoration::Plain);
        }
    }

    #[test]
    fn invalid_names_are_rejected() {
        let inputs = vec!["", "5x", "x y", "a+b", "Δ", "ΔT"];

        for name in inputs {
            let got = Symbol::new(name);

            assert_eq!(
                got,
                Err(SymbolError::InvalidName { name: name.into() }),
                "{:?}",
                name
            );
        }
    }

    #[test]
    fn assumptions_are_part_of_a_symbols_identity() {
        let plain = Symbol::named("x");
        let positive =
            Symbol::with_assumptions("x", Assumptions::positive()).unwrap();

        assert_ne!(plain, positive);
        assert_eq!(positive, positive.clone());
        assert_eq!(positive.is(Assumption::Real), Some(true));
    }

    #[test]
    fn symbols_are_ordered_by_name() {
        let mut symbols = vec![
            Symbol::named("c"),
            Symbol::named("a"),
            Symbol::named("b"),
        ];

        symbols.sort();

        let names: Vec<_> = symbols.iter().map(Symbol::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
