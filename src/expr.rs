use crate::{
    delta::DeltaSymbol,
    parse::{self, ParseError},
    print::{Render, Style},
    symbol::Symbol,
};
use smol_str::SmolStr;
use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
    str::FromStr,
};

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Symbol(Symbol),
    Constant(f64),
    /// An expression involving two operands.
    Binary {
        left: Box<Expression>,
        right: Box<Expression>,
        op: BinaryOperation,
    },
    /// Negate the expression.
    Negate(Box<Expression>),
    /// Invoke a function with a single argument.
    FunctionCall {
        function: SmolStr,
        argument: Box<Expression>,
    },
}

impl Expression {
    pub fn binary(
        left: Expression,
        op: BinaryOperation,
        right: Expression,
    ) -> Expression {
        Expression::Binary {
            left: Box::new(left),
            right: Box::new(right),
            op,
        }
    }

    pub fn call<S>(function: S, argument: Expression) -> Expression
    where
        S: Into<SmolStr>,
    {
        Expression::FunctionCall {
            function: function.into(),
            argument: Box::new(argument),
        }
    }

    /// Raise this expression to some power.
    pub fn pow<E>(self, exponent: E) -> Expression
    where
        E: Into<Expression>,
    {
        Expression::binary(self, BinaryOperation::Power, exponent.into())
    }

    pub fn sqrt(self) -> Expression { Expression::call("sqrt", self) }

    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Constant(_) => true,
            _ => false,
        }
    }

    /// Iterate over every [`Symbol`] this expression refers to, in the order
    /// they appear (duplicates included).
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        let mut pending = vec![self];

        std::iter::from_fn(move || {
            while let Some(expr) = pending.pop() {
                match expr {
                    Expression::Symbol(symbol) => return Some(symbol),
                    Expression::Constant(_) => {},
                    Expression::Binary { left, right, .. } => {
                        pending.push(right);
                        pending.push(left);
                    },
                    Expression::Negate(inner)
                    | Expression::FunctionCall {
                        argument: inner, ..
                    } => pending.push(inner),
                }
            }

            None
        })
    }

    /// Does this expression refer to a particular [`Symbol`]?
    pub fn depends_on(&self, symbol: &Symbol) -> bool {
        self.symbols().any(|s| s == symbol)
    }

    /// How tightly this expression binds when it appears as the operand of
    /// another expression.
    pub(crate) fn precedence(&self) -> Precedence {
        match self {
            Expression::Binary { op, .. } => op.precedence(),
            Expression::Negate(_) => Precedence::Negate,
            Expression::Constant(value) if value.is_sign_negative() => {
                Precedence::Negate
            },
            Expression::Symbol(_)
            | Expression::Constant(_)
            | Expression::FunctionCall { .. } => Precedence::Atom,
        }
    }
}

/// An operation that can be applied to two arguments.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BinaryOperation {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
}

impl BinaryOperation {
    pub(crate) fn precedence(self) -> Precedence {
        match self {
            BinaryOperation::Plus | BinaryOperation::Minus => Precedence::Sum,
            BinaryOperation::Times | BinaryOperation::Divide => {
                Precedence::Product
            },
            BinaryOperation::Power => Precedence::Power,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    Sum,
    Product,
    Negate,
    Power,
    Atom,
}

impl From<f64> for Expression {
    fn from(value: f64) -> Expression { Expression::Constant(value) }
}

impl From<Symbol> for Expression {
    fn from(symbol: Symbol) -> Expression { Expression::Symbol(symbol) }
}

impl<'a> From<&'a Symbol> for Expression {
    fn from(symbol: &'a Symbol) -> Expression {
        Expression::Symbol(symbol.clone())
    }
}

impl From<DeltaSymbol> for Expression {
    fn from(delta: DeltaSymbol) -> Expression {
        Expression::Symbol(delta.into_symbol())
    }
}

impl<'a> From<&'a DeltaSymbol> for Expression {
    fn from(delta: &'a DeltaSymbol) -> Expression {
        Expression::Symbol(delta.symbol().clone())
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse::parse(s) }
}

// define some operator overloads to make constructing an expression easier.

macro_rules! binary_operators {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<R: Into<Expression>> Add<R> for $ty {
                type Output = Expression;

                fn add(self, rhs: R) -> Expression {
                    Expression::binary(self.into(), BinaryOperation::Plus, rhs.into())
                }
            }

            impl<R: Into<Expression>> Sub<R> for $ty {
                type Output = Expression;

                fn sub(self, rhs: R) -> Expression {
                    Expression::binary(self.into(), BinaryOperation::Minus, rhs.into())
                }
            }

            impl<R: Into<Expression>> Mul<R> for $ty {
                type Output = Expression;

                fn mul(self, rhs: R) -> Expression {
                    Expression::binary(self.into(), BinaryOperation::Times, rhs.into())
                }
            }

            impl<R: Into<Expression>> Div<R> for $ty {
                type Output = Expression;

                fn div(self, rhs: R) -> Expression {
                    Expression::binary(self.into(), BinaryOperation::Divide, rhs.into())
                }
            }

            impl Neg for $ty {
                type Output = Expression;

                fn neg(self) -> Expression {
                    Expression::Negate(Box::new(self.into()))
                }
            }
        )*
    };
}

binary_operators!(Expression, Symbol, DeltaSymbol);

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.render(Style::Plain, f)
    }
}
