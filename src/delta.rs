//! Symbols representing the change in a quantity.
//!
//! In the physical sciences `ΔX` means "the final value of `X` minus its
//! initial value". A [`DeltaSymbol`] behaves exactly like any other
//! [`Symbol`] during algebra, the only difference is that every renderer
//! writes it with a `Δ` prefix.

use crate::{
    assumptions::Assumptions,
    expr::Expression,
    symbol::{Decoration, Symbol, SymbolError},
};
use smol_str::SmolStr;
use std::ops::Deref;

/// Create a [`DeltaSymbol`] with no assumptions.
///
/// ```rust
/// let dg = delta_symbol::delta("G").unwrap();
///
/// assert_eq!(dg.to_string(), "ΔG");
/// ```
pub fn delta<S>(name: S) -> Result<DeltaSymbol, SymbolError>
where
    S: Into<SmolStr>,
{
    DeltaSymbol::new(name)
}

/// A [`Symbol`] for the change in some quantity, rendered as `ΔX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeltaSymbol(Symbol);

impl DeltaSymbol {
    pub fn new<S>(name: S) -> Result<Self, SymbolError>
    where
        S: Into<SmolStr>,
    {
        DeltaSymbol::with_assumptions(name, Assumptions::new())
    }

    /// Create a [`DeltaSymbol`] whose value is constrained by some
    /// [`Assumptions`] (e.g. a temperature change which is known to be
    /// positive).
    ///
    /// Any errors from validating the name are exactly those of
    /// [`Symbol::with_assumptions()`].
    pub fn with_assumptions<S>(
        name: S,
        assumptions: Assumptions,
    ) -> Result<Self, SymbolError>
    where
        S: Into<SmolStr>,
    {
        let symbol = Symbol::with_assumptions(name, assumptions)?;
        Ok(DeltaSymbol(symbol.decorated(Decoration::Delta)))
    }

    /// Recover a [`DeltaSymbol`] from a symbol found inside an
    /// [`Expression`].
    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        if symbol.is_delta() {
            Some(DeltaSymbol(symbol))
        } else {
            None
        }
    }

    /// The name of the quantity that is changing (`X` for `ΔX`).
    pub fn base_name(&self) -> &str { self.0.name() }

    pub fn symbol(&self) -> &Symbol { &self.0 }

    pub fn into_symbol(self) -> Symbol { self.0 }

    /// Write out the change explicitly, as `X_f - X_i`.
    ///
    /// ```rust
    /// let dg = delta_symbol::delta("G").unwrap();
    /// let explicit = dg.explicit();
    ///
    /// assert_eq!(explicit.expression().to_string(), "G_f - G_i");
    /// ```
    pub fn explicit(&self) -> Explicit {
        // An assumption about the change says nothing about either state
        Explicit {
            final_state: Symbol::named(format!("{}_f", self.base_name())),
            initial_state: Symbol::named(format!("{}_i", self.base_name())),
        }
    }
}

impl Deref for DeltaSymbol {
    type Target = Symbol;

    fn deref(&self) -> &Symbol { &self.0 }
}

impl AsRef<Symbol> for DeltaSymbol {
    fn as_ref(&self) -> &Symbol { &self.0 }
}

impl From<DeltaSymbol> for Symbol {
    fn from(delta: DeltaSymbol) -> Symbol { delta.0 }
}

/// The final and initial states of a quantity, as returned by
/// [`DeltaSymbol::explicit()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Explicit {
    pub final_state: Symbol,
    pub initial_state: Symbol,
}

impl Explicit {
    /// `X_f - X_i`.
    pub fn expression(&self) -> Expression {
        self.final_state.clone() - self.initial_state.clone()
    }
}
