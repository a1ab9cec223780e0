//! Symbols for the change in a quantity.
//!
//! A [`DeltaSymbol`] is written `ΔX` and stands for "final `X` minus initial
//! `X`". Algebraically it is an ordinary [`Symbol`], so it can be combined
//! into [`Expression`]s, differentiated, simplified and solved for like any
//! other unknown. Only the renderers (see [`Style`]) treat it differently.
//!
//! ```rust
//! use delta_symbol::{delta, ops::Builtins, Render, Style, SystemOfEquations};
//!
//! let dt = delta("T").unwrap();
//! let heat = dt.clone() * 4.2;
//! assert_eq!(heat.to_string(), "ΔT*4.2");
//! assert_eq!(heat.display(Style::Latex).to_string(), r"\Delta{T} \cdot 4.2");
//!
//! let solution = SystemOfEquations::from_equations(&["ΔT*2 = 10"])
//!     .unwrap()
//!     .solve(&Builtins::default())
//!     .unwrap();
//! assert_eq!(solution.get(&dt), Some(5.0));
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod assumptions;
mod delta;
mod equations;
mod expr;
pub mod ops;
mod parse;
mod print;
mod solve;
mod symbol;

pub use assumptions::{Assumption, Assumptions};
pub use delta::{delta, DeltaSymbol, Explicit};
pub use equations::{Equation, SystemOfEquations};
pub use expr::{BinaryOperation, Expression};
pub use parse::{parse, ParseError, TokenKind};
pub use print::{Render, Rendered, Style};
pub use solve::{Solution, SolveError, SolverConfig};
pub use symbol::{is_valid_name, Decoration, Symbol, SymbolError};
