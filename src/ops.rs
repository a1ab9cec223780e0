//! [`Expression`] operations.

use crate::{
    assumptions::Assumption,
    delta::DeltaSymbol,
    expr::{BinaryOperation, Expression},
    symbol::Symbol,
};
use euclid::approxeq::ApproxEq;
use smol_str::SmolStr;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Contextual information used when evaluating an [`Expression`].
pub trait Context {
    fn evaluate_function(
        &self,
        name: &str,
        argument: f64,
    ) -> Result<f64, EvaluationError>;

    /// For some [`Symbol`], `x`, and function, `f`, get `f'(x)`.
    fn differentiate_function(
        &self,
        name: &str,
        symbol: &Symbol,
    ) -> Result<Expression, EvaluationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    UnknownFunction { name: SmolStr },
    UnableToDifferentiate { name: SmolStr },
    UnknownSymbol { symbol: Symbol },
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationError::UnknownFunction { name } => {
                write!(f, "Unknown function, \"{}\"", name)
            },
            EvaluationError::UnableToDifferentiate { name } => {
                write!(f, "Unable to differentiate \"{}\"", name)
            },
            EvaluationError::UnknownSymbol { symbol } => {
                write!(f, "No value was provided for \"{}\"", symbol)
            },
        }
    }
}

impl Error for EvaluationError {}

/// The set of builtin functions. Angles are in radians.
#[derive(Debug, Default)]
pub struct Builtins;

impl Context for Builtins {
    fn evaluate_function(
        &self,
        name: &str,
        argument: f64,
    ) -> Result<f64, EvaluationError> {
        match name {
            "sin" => Ok(argument.sin()),
            "cos" => Ok(argument.cos()),
            "tan" => Ok(argument.tan()),
            "asin" => Ok(argument.asin()),
            "acos" => Ok(argument.acos()),
            "atan" => Ok(argument.atan()),
            "sqrt" => Ok(argument.sqrt()),
            "abs" => Ok(argument.abs()),
            "exp" => Ok(argument.exp()),
            "ln" => Ok(argument.ln()),
            _ => Err(EvaluationError::UnknownFunction { name: name.into() }),
        }
    }

    fn differentiate_function(
        &self,
        name: &str,
        symbol: &Symbol,
    ) -> Result<Expression, EvaluationError> {
        let x = || Expression::Symbol(symbol.clone());

        match name {
            "sin" => Ok(Expression::call("cos", x())),
            "cos" => Ok(-Expression::call("sin", x())),
            "tan" => Ok(Expression::Constant(1.0)
                / Expression::call("cos", x()).pow(2.0)),
            "asin" => Ok(Expression::Constant(1.0)
                / (Expression::Constant(1.0) - x().pow(2.0)).sqrt()),
            "acos" => Ok(-(Expression::Constant(1.0)
                / (Expression::Constant(1.0) - x().pow(2.0)).sqrt())),
            "atan" => Ok(Expression::Constant(1.0)
                / (Expression::Constant(1.0) + x().pow(2.0))),
            "sqrt" => Ok(Expression::Constant(0.5) / x().sqrt()),
            "abs" => Ok(x() / Expression::call("abs", x())),
            "exp" => Ok(Expression::call("exp", x())),
            "ln" => Ok(Expression::Constant(1.0) / x()),
            _ => Err(EvaluationError::UnableToDifferentiate {
                name: name.into(),
            }),
        }
    }
}

/// Simplify an expression by evaluating all constant operations.
pub fn fold_constants<C>(expr: &Expression, ctx: &C) -> Expression
where
    C: Context,
{
    match expr {
        Expression::Binary { left, right, op } => {
            fold_binary_op(left, right, *op, ctx)
        },
        Expression::Negate(expr) => match fold_constants(expr, ctx) {
            Expression::Constant(value) => Expression::Constant(-value),
            // double negative
            Expression::Negate(inner) => *inner,
            other => Expression::Negate(Box::new(other)),
        },
        Expression::FunctionCall { function, argument } => {
            let argument = fold_constants(argument, ctx);

            if let Expression::Constant(argument) = argument {
                if let Ok(result) = ctx.evaluate_function(function, argument) {
                    return Expression::Constant(result);
                }
            }

            Expression::FunctionCall {
                function: function.clone(),
                argument: Box::new(argument),
            }
        },
        _ => expr.clone(),
    }
}

fn fold_binary_op<C>(
    left: &Expression,
    right: &Expression,
    op: BinaryOperation,
    ctx: &C,
) -> Expression
where
    C: Context,
{
    let left = fold_constants(left, ctx);
    let right = fold_constants(right, ctx);

    // If our operands contain constants, we can use arithmetic's identity laws
    // to simplify things
    match (left, right, op) {
        // x + x = 2*x
        (left, right, BinaryOperation::Plus)
            if left == right && !left.is_constant() =>
        {
            fold_binary_op(
                &Expression::Constant(2.0),
                &right,
                BinaryOperation::Times,
                ctx,
            )
        },
        // x - x = 0
        (left, right, BinaryOperation::Minus)
            if left == right && !left.is_constant() =>
        {
            Expression::Constant(0.0)
        },
        // x / x = 1
        (left, right, BinaryOperation::Divide)
            if left == right && !left.is_constant() =>
        {
            Expression::Constant(1.0)
        },

        // x + 0 = x
        (Expression::Constant(l), right, BinaryOperation::Plus)
            if l.approx_eq(&0.0) =>
        {
            right
        },
        (left, Expression::Constant(r), BinaryOperation::Plus)
            if r.approx_eq(&0.0) =>
        {
            left
        },

        // 0 * x = 0
        (Expression::Constant(l), _, BinaryOperation::Times)
            if l.approx_eq(&0.0) =>
        {
            Expression::Constant(0.0)
        },
        (_, Expression::Constant(r), BinaryOperation::Times)
            if r.approx_eq(&0.0) =>
        {
            Expression::Constant(0.0)
        },

        // 1 * x = x
        (Expression::Constant(l), right, BinaryOperation::Times)
            if l.approx_eq(&1.0) =>
        {
            right
        },
        (left, Expression::Constant(r), BinaryOperation::Times)
            if r.approx_eq(&1.0) =>
        {
            left
        },

        // 0 / x = 0
        (Expression::Constant(l), right, BinaryOperation::Divide)
            if l.approx_eq(&0.0) && !right.is_constant() =>
        {
            Expression::Constant(0.0)
        },

        // x / 1 = x
        (left, Expression::Constant(r), BinaryOperation::Divide)
            if r.approx_eq(&1.0) =>
        {
            left
        },

        // 0 - x = -x
        (Expression::Constant(l), right, BinaryOperation::Minus)
            if l.approx_eq(&0.0) =>
        {
            -right
        },

        // x - 0 = x
        (left, Expression::Constant(r), BinaryOperation::Minus)
            if r.approx_eq(&0.0) =>
        {
            left
        },

        // x^0 = 1
        (_, Expression::Constant(r), BinaryOperation::Power)
            if r.approx_eq(&0.0) =>
        {
            Expression::Constant(1.0)
        },

        // x^1 = x
        (left, Expression::Constant(r), BinaryOperation::Power)
            if r.approx_eq(&1.0) =>
        {
            left
        },

        // 1^x = 1
        (Expression::Constant(l), _, BinaryOperation::Power)
            if l.approx_eq(&1.0) =>
        {
            Expression::Constant(1.0)
        },

        // (x * y) * z
        (
            Expression::Constant(constant_a),
            Expression::Binary {
                left,
                right,
                op: BinaryOperation::Times,
            },
            BinaryOperation::Times,
        ) if left.is_constant() || right.is_constant() => {
            let (constant_b, expr) = match (&*left, &*right) {
                (Expression::Constant(left), right) => (left, right),
                (left, Expression::Constant(right)) => (right, left),
                _ => unreachable!(),
            };
            Expression::Constant(constant_a * constant_b)
                * Expression::clone(expr)
        },
        (
            Expression::Binary {
                left,
                right,
                op: BinaryOperation::Times,
            },
            Expression::Constant(constant_a),
            BinaryOperation::Times,
        ) if left.is_constant() || right.is_constant() => {
            let (constant_b, expr) = match (&*left, &*right) {
                (Expression::Constant(left), right) => (left, right),
                (left, Expression::Constant(right)) => (right, left),
                _ => unreachable!(),
            };
            Expression::Constant(constant_a * constant_b)
                * Expression::clone(expr)
        },

        // Evaluate in-place
        (Expression::Constant(l), Expression::Constant(r), op) => {
            let value = match op {
                BinaryOperation::Plus => l + r,
                BinaryOperation::Minus => l - r,
                BinaryOperation::Times => l * r,
                BinaryOperation::Divide => l / r,
                BinaryOperation::Power => l.powf(r),
            };

            Expression::Constant(value)
        },

        // Oh well, we tried
        (left, right, op) => Expression::binary(left, op, right),
    }
}

/// Constant folding followed by rewrites which depend on what is known about
/// each [`Symbol`] (see [`Assumption`]).
///
/// - `sqrt(x^2)` is `x` when `x` is nonnegative, or `abs(x)` when `x` is real
/// - `abs(x)` is `x` when `x` is nonnegative, or `-x` when it is nonpositive
/// - `sqrt(x)^2` is `x`
pub fn simplify<C>(expr: &Expression, ctx: &C) -> Expression
where
    C: Context,
{
    let folded = fold_constants(expr, ctx);
    let rewritten = rewrite_with_assumptions(&folded);
    fold_constants(&rewritten, ctx)
}

fn rewrite_with_assumptions(expr: &Expression) -> Expression {
    match expr {
        Expression::Binary { left, right, op } => {
            let left = rewrite_with_assumptions(left);
            let right = rewrite_with_assumptions(right);

            match (left, right, *op) {
                (
                    Expression::FunctionCall { function, argument },
                    Expression::Constant(exponent),
                    BinaryOperation::Power,
                ) if function.as_str() == "sqrt"
                    && exponent.approx_eq(&2.0) =>
                {
                    *argument
                },
                (left, right, op) => Expression::binary(left, op, right),
            }
        },
        Expression::Negate(inner) => {
            Expression::Negate(Box::new(rewrite_with_assumptions(inner)))
        },
        Expression::FunctionCall { function, argument } => {
            let argument = rewrite_with_assumptions(argument);
            rewrite_call(function, argument)
        },
        Expression::Symbol(_) | Expression::Constant(_) => expr.clone(),
    }
}

fn rewrite_call(function: &str, argument: Expression) -> Expression {
    match function {
        "sqrt" => match argument {
            Expression::Binary {
                left,
                right,
                op: BinaryOperation::Power,
            } if is_two(&right) => {
                if is_nonnegative(&left) == Some(true) {
                    *left
                } else if is_real(&left) == Some(true) {
                    rewrite_call("abs", *left)
                } else {
                    Expression::call("sqrt", (*left).pow(*right))
                }
            },
            other => Expression::call("sqrt", other),
        },
        "abs" if is_nonnegative(&argument) == Some(true) => argument,
        "abs" if is_nonpositive(&argument) == Some(true) => -argument,
        _ => Expression::call(function, argument),
    }
}

fn is_two(expr: &Expression) -> bool {
    match expr {
        Expression::Constant(value) => value.approx_eq(&2.0),
        _ => false,
    }
}

/// What can be deduced about an expression's sign without evaluating it.
fn is_nonnegative(expr: &Expression) -> Option<bool> {
    match expr {
        Expression::Symbol(symbol) => symbol.is(Assumption::Nonnegative),
        Expression::Constant(value) => Some(*value >= 0.0),
        Expression::FunctionCall { function, .. } => {
            match function.as_str() {
                "sqrt" | "abs" | "exp" => Some(true),
                _ => None,
            }
        },
        Expression::Negate(inner) => is_nonpositive(inner),
        Expression::Binary { left, right, op } => match op {
            BinaryOperation::Plus | BinaryOperation::Times => {
                both(is_nonnegative(left), is_nonnegative(right))
            },
            BinaryOperation::Power if is_two(right) => is_real(left),
            _ => None,
        },
    }
}

fn is_nonpositive(expr: &Expression) -> Option<bool> {
    match expr {
        Expression::Symbol(symbol) => symbol.is(Assumption::Nonpositive),
        Expression::Constant(value) => Some(*value <= 0.0),
        Expression::Negate(inner) => is_nonnegative(inner),
        Expression::Binary {
            left,
            right,
            op: BinaryOperation::Plus,
        } => both(is_nonpositive(left), is_nonpositive(right)),
        _ => None,
    }
}

fn is_real(expr: &Expression) -> Option<bool> {
    match expr {
        Expression::Symbol(symbol) => symbol.is(Assumption::Real),
        Expression::Constant(value) => Some(value.is_finite()),
        Expression::Negate(inner) => is_real(inner),
        Expression::Binary {
            left,
            right,
            op:
                BinaryOperation::Plus
                | BinaryOperation::Minus
                | BinaryOperation::Times,
        } => both(is_real(left), is_real(right)),
        _ => None,
    }
}

/// Only `Some(true)` when both sides are known to be true.
fn both(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Replace all references to a [`Symbol`] with an [`Expression`].
pub fn substitute(
    expression: &Expression,
    symbol: &Symbol,
    value: &Expression,
) -> Expression {
    replace_symbols(expression, &|s| {
        if s == symbol {
            Some(value.clone())
        } else {
            None
        }
    })
}

/// Replace every [`DeltaSymbol`] in an expression with its explicit form,
/// `X_f - X_i`.
pub fn expand_deltas(expression: &Expression) -> Expression {
    replace_symbols(expression, &|symbol| {
        DeltaSymbol::from_symbol(symbol.clone()).map(|delta| {
            let explicit = delta.explicit().expression();
            log::trace!("Expanding {} into {}", delta, explicit);
            explicit
        })
    })
}

fn replace_symbols(
    expression: &Expression,
    replacement: &dyn Fn(&Symbol) -> Option<Expression>,
) -> Expression {
    match expression {
        Expression::Symbol(s) => replacement(s)
            .unwrap_or_else(|| Expression::Symbol(s.clone())),
        Expression::Constant(value) => Expression::Constant(*value),
        Expression::Binary { left, right, op } => {
            let left = replace_symbols(left, replacement);
            let right = replace_symbols(right, replacement);
            Expression::binary(left, *op, right)
        },
        Expression::Negate(inner) => -replace_symbols(inner, replacement),
        Expression::FunctionCall { function, argument } => Expression::call(
            function.clone(),
            replace_symbols(argument, replacement),
        ),
    }
}

/// Calculate an [`Expression`]'s partial derivative with respect to a
/// particular [`Symbol`].
pub fn partial_derivative<C>(
    expr: &Expression,
    symbol: &Symbol,
    ctx: &C,
) -> Result<Expression, EvaluationError>
where
    C: Context,
{
    let got = match expr {
        Expression::Symbol(s) => {
            if s == symbol {
                Expression::Constant(1.0)
            } else {
                Expression::Constant(0.0)
            }
        },
        Expression::Constant(_) => Expression::Constant(0.0),
        Expression::Binary {
            left,
            right,
            op: BinaryOperation::Plus,
        } => {
            partial_derivative(left, symbol, ctx)?
                + partial_derivative(right, symbol, ctx)?
        },
        Expression::Binary {
            left,
            right,
            op: BinaryOperation::Minus,
        } => {
            partial_derivative(left, symbol, ctx)?
                - partial_derivative(right, symbol, ctx)?
        },
        Expression::Binary {
            left,
            right,
            op: BinaryOperation::Times,
        } => {
            // The product rule
            let d_left = partial_derivative(left, symbol, ctx)?;
            let d_right = partial_derivative(right, symbol, ctx)?;
            let left = Expression::clone(left);
            let right = Expression::clone(right);

            d_left * right + d_right * left
        },
        Expression::Binary {
            left,
            right,
            op: BinaryOperation::Divide,
        } => {
            // The quotient rule
            let d_left = partial_derivative(left, symbol, ctx)?;
            let d_right = partial_derivative(right, symbol, ctx)?;
            let right = Expression::clone(right);
            let left = Expression::clone(left);

            (d_left * right.clone() - left * d_right) / (right.clone() * right)
        },
        Expression::Binary {
            left,
            right,
            op: BinaryOperation::Power,
        } => {
            let d_left = partial_derivative(left, symbol, ctx)?;
            let base = Expression::clone(left);

            match **right {
                // The power rule: (u^n)' = n * u^(n-1) * u'
                Expression::Constant(n) => {
                    Expression::Constant(n) * base.pow(n - 1.0) * d_left
                },
                // The general case: (u^v)' = u^v * (v' * ln(u) + v * u'/u)
                _ => {
                    let d_right = partial_derivative(right, symbol, ctx)?;
                    let exponent = Expression::clone(right);

                    base.clone().pow(exponent.clone())
                        * (d_right * Expression::call("ln", base.clone())
                            + exponent * d_left / base)
                }
            }
        },

        Expression::Negate(inner) => -partial_derivative(inner, symbol, ctx)?,
        Expression::FunctionCall { function, argument } => {
            // implement the chain rule: (f o g)' = (f' o g) * g'
            let g = Symbol::named("__temp__");
            let f_dash_of_g = ctx.differentiate_function(function, &g)?;
            let g_dash = partial_derivative(argument, symbol, ctx)?;

            substitute(&f_dash_of_g, &g, argument) * g_dash
        },
    };

    Ok(got)
}

/// Numerically evaluate an [`Expression`], using `lookup_value` to find the
/// value of each [`Symbol`].
pub fn evaluate<F, C>(
    expr: &Expression,
    lookup_value: F,
    ctx: &C,
) -> Result<f64, EvaluationError>
where
    F: Fn(&Symbol) -> Option<f64>,
    C: Context,
{
    evaluate_with(expr, &lookup_value, ctx)
}

fn evaluate_with<C>(
    expr: &Expression,
    lookup_value: &dyn Fn(&Symbol) -> Option<f64>,
    ctx: &C,
) -> Result<f64, EvaluationError>
where
    C: Context,
{
    match expr {
        Expression::Symbol(symbol) => lookup_value(symbol).ok_or_else(|| {
            EvaluationError::UnknownSymbol {
                symbol: symbol.clone(),
            }
        }),
        Expression::Constant(value) => Ok(*value),
        Expression::Binary { left, right, op } => {
            let left = evaluate_with(left, lookup_value, ctx)?;
            let right = evaluate_with(right, lookup_value, ctx)?;

            Ok(match op {
                BinaryOperation::Plus => left + right,
                BinaryOperation::Minus => left - right,
                BinaryOperation::Times => left * right,
                BinaryOperation::Divide => left / right,
                BinaryOperation::Power => left.powf(right),
            })
        },
        Expression::Negate(inner) => {
            evaluate_with(inner, lookup_value, ctx).map(|value| -value)
        },
        Expression::FunctionCall { function, argument } => {
            let argument = evaluate_with(argument, lookup_value, ctx)?;
            ctx.evaluate_function(function, argument)
        },
    }
}
