//! Turning symbols and [`Expression`]s back into text.

use crate::{
    delta::DeltaSymbol,
    expr::{BinaryOperation, Expression, Precedence},
    symbol::{Decoration, Symbol},
};
use std::fmt::{self, Display, Formatter};

/// The different ways something can be rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Style {
    /// Compact text, e.g. `ΔT + x^2/2`.
    Plain,
    /// Like [`Style::Plain`], but the markup (operators, the `Δ` prefix) is
    /// ASCII (e.g. `DeltaT`). Symbol names are written as given, so a
    /// non-ASCII name such as `θ` stays non-ASCII.
    Ascii,
    /// Unicode typesetting, e.g. `ΔT + x²/2`.
    Pretty,
    /// LaTeX markup, e.g. `\Delta{T} + \frac{x^{2}}{2}`.
    Latex,
}

/// Something which can be rendered in any [`Style`].
pub trait Render {
    fn render(&self, style: Style, f: &mut Formatter<'_>) -> fmt::Result;

    /// Get a [`Display`] adaptor which renders using a particular style.
    fn display(&self, style: Style) -> Rendered<'_, Self> {
        Rendered { value: self, style }
    }

    /// LaTeX wrapped in `$...$`, as used by notebooks for inline maths.
    fn inline_latex(&self) -> String {
        format!("${}$", self.display(Style::Latex))
    }
}

/// A wrapper which implements [`Display`] for anything that can be
/// [`Render`]ed.
#[derive(Debug)]
pub struct Rendered<'a, T: ?Sized> {
    value: &'a T,
    style: Style,
}

impl<T> Display for Rendered<'_, T>
where
    T: Render + ?Sized,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.value.render(self.style, f)
    }
}

impl Render for Symbol {
    fn render(&self, style: Style, f: &mut Formatter<'_>) -> fmt::Result {
        match (style, self.decoration()) {
            (Style::Latex, Decoration::Plain) => write_latex_name(self.name(), f),
            (Style::Latex, Decoration::Delta) => {
                f.write_str("\\Delta{")?;
                write_latex_name(self.name(), f)?;
                f.write_str("}")
            },
            (Style::Ascii, Decoration::Delta) => {
                write!(f, "Delta{}", self.name())
            },
            (_, Decoration::Delta) => write!(f, "Δ{}", self.name()),
            (_, Decoration::Plain) => f.write_str(self.name()),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.render(Style::Plain, f)
    }
}

impl Render for DeltaSymbol {
    fn render(&self, style: Style, f: &mut Formatter<'_>) -> fmt::Result {
        self.symbol().render(style, f)
    }
}

impl Display for DeltaSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.render(Style::Plain, f)
    }
}

impl Render for Expression {
    fn render(&self, style: Style, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Symbol(symbol) => symbol.render(style, f),
            Expression::Constant(value) => write_constant(*value, style, f),
            Expression::Binary {
                left,
                right,
                op: BinaryOperation::Divide,
            } if style == Style::Latex => {
                f.write_str("\\frac{")?;
                left.render(style, f)?;
                f.write_str("}{")?;
                right.render(style, f)?;
                f.write_str("}")
            },
            Expression::Binary {
                left,
                right,
                op: BinaryOperation::Power,
            } => write_power(left, right, style, f),
            Expression::Binary { left, right, op } => {
                let precedence = op.precedence();
                write_operand(left, precedence, false, style, f)?;
                f.write_str(operator(*op, style))?;
                write_operand(right, precedence, true, style, f)
            },
            Expression::Negate(inner) => {
                f.write_str("-")?;
                write_operand(inner, Precedence::Negate, false, style, f)
            },
            Expression::FunctionCall { function, argument } => {
                write_call(function, argument, style, f)
            },
        }
    }
}

fn operator(op: BinaryOperation, style: Style) -> &'static str {
    match (op, style) {
        (BinaryOperation::Plus, _) => " + ",
        (BinaryOperation::Minus, _) => " - ",
        (BinaryOperation::Times, Style::Pretty) => "·",
        (BinaryOperation::Times, Style::Latex) => " \\cdot ",
        (BinaryOperation::Times, _) => "*",
        (BinaryOperation::Divide, _) => "/",
        (BinaryOperation::Power, _) => "^",
    }
}

/// Write the operand of some operator, adding parentheses when it binds less
/// tightly than its parent. The right-hand operand also needs parentheses at
/// equal precedence, so `a - (b - c)` survives a round trip.
fn write_operand(
    operand: &Expression,
    parent: Precedence,
    is_right: bool,
    style: Style,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    let precedence = operand.precedence();

    if precedence < parent || (is_right && precedence == parent) {
        write_parenthesized(operand, style, f)
    } else {
        operand.render(style, f)
    }
}

fn write_parenthesized(
    expr: &Expression,
    style: Style,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    let (open, close) = match style {
        Style::Latex => ("\\left(", "\\right)"),
        _ => ("(", ")"),
    };

    f.write_str(open)?;
    expr.render(style, f)?;
    f.write_str(close)
}

fn write_constant(value: f64, style: Style, f: &mut Formatter<'_>) -> fmt::Result {
    match style {
        Style::Latex if value.is_infinite() => {
            if value.is_sign_negative() {
                f.write_str("-")?;
            }
            f.write_str("\\infty")
        },
        Style::Pretty if value.is_infinite() => {
            if value.is_sign_negative() {
                f.write_str("-")?;
            }
            f.write_str("∞")
        },
        _ => write!(f, "{}", value),
    }
}

fn write_power(
    base: &Expression,
    exponent: &Expression,
    style: Style,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    write_operand(base, Precedence::Power, true, style, f)?;

    match style {
        Style::Latex => {
            f.write_str("^{")?;
            exponent.render(style, f)?;
            f.write_str("}")
        },
        Style::Pretty => match superscript(exponent) {
            Some(digits) => f.write_str(&digits),
            None => {
                f.write_str("^")?;
                write_operand(exponent, Precedence::Power, true, style, f)
            },
        },
        Style::Plain | Style::Ascii => {
            f.write_str("^")?;
            write_operand(exponent, Precedence::Power, true, style, f)
        },
    }
}

/// Integer exponents written with Unicode superscripts (`x²`, `x⁻¹`).
fn superscript(exponent: &Expression) -> Option<String> {
    let value = match exponent {
        Expression::Constant(value) => *value,
        Expression::Negate(inner) => match **inner {
            Expression::Constant(value) => -value,
            _ => return None,
        },
        _ => return None,
    };

    if value.fract() != 0.0 || value.abs() >= 1e6 {
        return None;
    }

    let digits = format!("{}", value as i64)
        .chars()
        .map(|c| match c {
            '-' => '⁻',
            '0' => '⁰',
            '1' => '¹',
            '2' => '²',
            '3' => '³',
            '4' => '⁴',
            '5' => '⁵',
            '6' => '⁶',
            '7' => '⁷',
            '8' => '⁸',
            _ => '⁹',
        })
        .collect();

    Some(digits)
}

fn write_call(
    function: &str,
    argument: &Expression,
    style: Style,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    match (style, function) {
        (Style::Pretty, "sqrt") => {
            f.write_str("√")?;
            write_operand(argument, Precedence::Atom, false, style, f)
        },
        (Style::Pretty, "abs") => {
            f.write_str("|")?;
            argument.render(style, f)?;
            f.write_str("|")
        },
        (Style::Latex, "sqrt") => {
            f.write_str("\\sqrt{")?;
            argument.render(style, f)?;
            f.write_str("}")
        },
        (Style::Latex, "abs") => {
            f.write_str("\\left|")?;
            argument.render(style, f)?;
            f.write_str("\\right|")
        },
        (Style::Latex, "exp") => {
            f.write_str("e^{")?;
            argument.render(style, f)?;
            f.write_str("}")
        },
        (Style::Latex, _) => {
            match latex_function(function) {
                Some(command) => f.write_str(command)?,
                None => {
                    f.write_str("\\operatorname{")?;
                    write_escaped(function, f)?;
                    f.write_str("}")?;
                },
            }
            write_parenthesized(argument, style, f)
        },
        _ => {
            write!(f, "{}(", function)?;
            argument.render(style, f)?;
            f.write_str(")")
        },
    }
}

fn latex_function(name: &str) -> Option<&'static str> {
    match name {
        "sin" => Some("\\sin"),
        "cos" => Some("\\cos"),
        "tan" => Some("\\tan"),
        "asin" => Some("\\arcsin"),
        "acos" => Some("\\arccos"),
        "atan" => Some("\\arctan"),
        "ln" => Some("\\ln"),
        "log" => Some("\\log"),
        _ => None,
    }
}

/// Names like `T_f` become `T_{f}`.
fn write_latex_name(name: &str, f: &mut Formatter<'_>) -> fmt::Result {
    match name.find('_') {
        Some(index) if index > 0 && index + 1 < name.len() => {
            let (base, subscript) = (&name[..index], &name[index + 1..]);
            f.write_str(base)?;
            f.write_str("_{")?;
            write_escaped(subscript, f)?;
            f.write_str("}")
        },
        _ => write_escaped(name, f),
    }
}

fn write_escaped(text: &str, f: &mut Formatter<'_>) -> fmt::Result {
    for c in text.chars() {
        match c {
            '_' => f.write_str("\\_")?,
            other => write!(f, "{}", other)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::delta;

    fn render_all(src: &str) -> [String; 4] {
        let expr: Expression = src.parse().unwrap();

        [
            expr.display(Style::Plain).to_string(),
            expr.display(Style::Ascii).to_string(),
            expr.display(Style::Pretty).to_string(),
            expr.display(Style::Latex).to_string(),
        ]
    }

    macro_rules! render_test {
        ($name:ident, $src:expr, $plain:expr, $ascii:expr, $pretty:expr, $latex:expr) => {
            #[test]
            fn $name() {
                let got = render_all($src);

                assert_eq!(got[0], $plain, "plain");
                assert_eq!(got[1], $ascii, "ascii");
                assert_eq!(got[2], $pretty, "pretty");
                assert_eq!(got[3], $latex, "latex");
            }
        };
    }

    render_test!(lone_delta, "ΔT", "ΔT", "DeltaT", "ΔT", r"\Delta{T}");
    render_test!(
        non_ascii_names_are_kept,
        "Δθ*θ",
        "Δθ*θ",
        "Deltaθ*θ",
        "Δθ·θ",
        r"\Delta{θ} \cdot θ"
    );
    render_test!(
        delta_plus_symbol,
        "ΔT + k",
        "ΔT + k",
        "DeltaT + k",
        "ΔT + k",
        r"\Delta{T} + k"
    );
    render_test!(
        delta_squared,
        "ΔT^2",
        "ΔT^2",
        "DeltaT^2",
        "ΔT²",
        r"\Delta{T}^{2}"
    );
    render_test!(
        product_and_fraction,
        "2*ΔH/(R*T)",
        "2*ΔH/(R*T)",
        "2*DeltaH/(R*T)",
        "2·ΔH/(R·T)",
        r"\frac{2 \cdot \Delta{H}}{R \cdot T}"
    );
    render_test!(
        square_root,
        "sqrt(x + 1)",
        "sqrt(x + 1)",
        "sqrt(x + 1)",
        "√(x + 1)",
        r"\sqrt{x + 1}"
    );
    render_test!(
        square_root_of_symbol,
        "sqrt(ΔG)",
        "sqrt(ΔG)",
        "sqrt(DeltaG)",
        "√ΔG",
        r"\sqrt{\Delta{G}}"
    );
    render_test!(
        subscripted_names,
        "G_f - G_i",
        "G_f - G_i",
        "G_f - G_i",
        "G_f - G_i",
        r"G_{f} - G_{i}"
    );
    render_test!(
        functions,
        "sin(x)*exp(-ΔS)",
        "sin(x)*exp(-ΔS)",
        "sin(x)*exp(-DeltaS)",
        "sin(x)·exp(-ΔS)",
        r"\sin\left(x\right) \cdot e^{-\Delta{S}}"
    );
    render_test!(
        unknown_function,
        "gamma(x)",
        "gamma(x)",
        "gamma(x)",
        "gamma(x)",
        r"\operatorname{gamma}\left(x\right)"
    );
    render_test!(
        negative_exponent,
        "x^-1",
        "x^(-1)",
        "x^(-1)",
        "x⁻¹",
        r"x^{-1}"
    );
    render_test!(
        parenthesized_base,
        "(a + b)^2",
        "(a + b)^2",
        "(a + b)^2",
        "(a + b)²",
        r"\left(a + b\right)^{2}"
    );

    #[test]
    fn inline_latex_is_wrapped_in_dollars() {
        let dh = delta("H").unwrap();
        let expr = Expression::from(dh).pow(2.0);

        assert_eq!(expr.inline_latex(), r"$\Delta{H}^{2}$");
    }

    #[test]
    fn absolute_values() {
        let expr = Expression::call("abs", delta("x").unwrap().into());

        assert_eq!(expr.display(Style::Plain).to_string(), "abs(Δx)");
        assert_eq!(expr.display(Style::Pretty).to_string(), "|Δx|");
        assert_eq!(
            expr.display(Style::Latex).to_string(),
            r"\left|\Delta{x}\right|"
        );
    }
}
