use crate::{
    ops::{self, Context, EvaluationError},
    print::{Render, Style},
    solve::{Solution, SolveError, SolverConfig},
    Expression, ParseError, Symbol,
};
use nalgebra::DVector as Vector;
use std::{
    fmt::{self, Display, Formatter},
    iter::{Extend, FromIterator},
    str::FromStr,
};

/// An equation, `left = right`.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    left: Expression,
    right: Expression,
    /// `left - right`, which is zero when the equation holds.
    pub(crate) body: Expression,
}

impl Equation {
    pub fn new(left: Expression, right: Expression) -> Self {
        let body = left.clone() - right.clone();

        Equation { left, right, body }
    }

    pub fn left(&self) -> &Expression { &self.left }

    pub fn right(&self) -> &Expression { &self.right }

    /// Rewrite every delta symbol in the equation as `X_f - X_i`.
    pub fn expand_deltas(&self) -> Equation {
        Equation::new(
            ops::expand_deltas(&self.left),
            ops::expand_deltas(&self.right),
        )
    }
}

impl FromStr for Equation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.find("=") {
            Some(index) => {
                let (left, right) = s.split_at(index);
                let right = &right[1..];
                Ok(Equation::new(left.parse()?, right.parse()?))
            },
            None => Ok(Equation::new(s.parse()?, Expression::Constant(0.0))),
        }
    }
}

impl Render for Equation {
    fn render(&self, style: Style, f: &mut Formatter<'_>) -> fmt::Result {
        self.left.render(style, f)?;
        f.write_str(" = ")?;
        self.right.render(style, f)
    }
}

impl Display for Equation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.render(Style::Plain, f)
    }
}

/// A builder for constructing a system of equations and solving them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SystemOfEquations {
    pub(crate) equations: Vec<Equation>,
}

impl SystemOfEquations {
    pub fn new() -> Self { SystemOfEquations::default() }

    pub fn with(mut self, equation: Equation) -> Self {
        self.push(equation);
        self
    }

    pub fn push(&mut self, equation: Equation) {
        self.equations.push(equation);
    }

    pub fn solve<C>(self, ctx: &C) -> Result<Solution, SolveError>
    where
        C: Context,
    {
        self.solve_with(&SolverConfig::default(), ctx)
    }

    pub fn solve_with<C>(
        self,
        config: &SolverConfig,
        ctx: &C,
    ) -> Result<Solution, SolveError>
    where
        C: Context,
    {
        crate::solve::solve(&self, config, ctx)
    }

    pub fn unknowns(&self) -> Vec<Symbol> {
        let mut unknowns: Vec<_> = self
            .equations
            .iter()
            .flat_map(|eq| eq.body.symbols())
            .cloned()
            .collect();
        unknowns.sort();
        unknowns.dedup();

        unknowns
    }

    pub fn num_unknowns(&self) -> usize { self.unknowns().len() }

    pub fn equations(&self) -> &[Equation] { &self.equations }

    pub fn from_equations<E, S>(equations: E) -> Result<Self, ParseError>
    where
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut system = SystemOfEquations::new();

        for equation in equations {
            system.push(equation.as_ref().parse()?);
        }

        Ok(system)
    }

    pub(crate) fn evaluate<F, C>(
        &self,
        lookup_symbol_value: F,
        ctx: &C,
    ) -> Result<Vector<f64>, EvaluationError>
    where
        F: Fn(&Symbol) -> Option<f64>,
        C: Context,
    {
        let mut values = Vec::new();

        for equation in &self.equations {
            values.push(ops::evaluate(
                &equation.body,
                &lookup_symbol_value,
                ctx,
            )?);
        }

        Ok(Vector::from_vec(values))
    }
}

impl Extend<Equation> for SystemOfEquations {
    fn extend<T: IntoIterator<Item = Equation>>(&mut self, iter: T) {
        self.equations.extend(iter);
    }
}

impl FromIterator<Equation> for SystemOfEquations {
    fn from_iter<T: IntoIterator<Item = Equation>>(iter: T) -> Self {
        SystemOfEquations {
            equations: Vec::from_iter(iter),
        }
    }
}

impl<'a> IntoIterator for &'a SystemOfEquations {
    type IntoIter = <&'a [Equation] as IntoIterator>::IntoIter;
    type Item = &'a Equation;

    fn into_iter(self) -> Self::IntoIter { self.equations.iter() }
}

impl IntoIterator for SystemOfEquations {
    type IntoIter = <Vec<Equation> as IntoIterator>::IntoIter;
    type Item = Equation;

    fn into_iter(self) -> Self::IntoIter { self.equations.into_iter() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::delta;

    #[test]
    fn parse_an_equation() {
        let got: Equation = "ΔG = ΔH - T*ΔS".parse().unwrap();

        assert_eq!(got.to_string(), "ΔG = ΔH - T*ΔS");
        assert_eq!(
            got.display(Style::Latex).to_string(),
            r"\Delta{G} = \Delta{H} - T \cdot \Delta{S}"
        );
        assert_eq!(got.body.to_string(), "ΔG - (ΔH - T*ΔS)");
    }

    #[test]
    fn an_expression_on_its_own_equals_zero() {
        let got: Equation = "x - 1".parse().unwrap();

        assert_eq!(got.to_string(), "x - 1 = 0");
    }

    #[test]
    fn unknowns_are_sorted_and_unique() {
        let system =
            SystemOfEquations::from_equations(&["ΔT + x = 1", "x*ΔT = y"])
                .unwrap();

        let got = system.unknowns();

        assert_eq!(
            got,
            vec![
                delta("T").unwrap().into_symbol(),
                Symbol::named("x"),
                Symbol::named("y"),
            ]
        );
    }

    #[test]
    fn equations_may_be_entirely_constant() {
        let inputs = vec![("2 = 2", "2 = 2"), ("5", "5 = 0")];

        for (src, should_be) in inputs {
            let got: Equation = src.parse().unwrap();

            assert_eq!(got.to_string(), should_be);
            assert_eq!(got.body.symbols().count(), 0);
        }
    }

    #[test]
    fn expanding_deltas_in_an_equation() {
        let equation: Equation = "ΔT = 5".parse().unwrap();

        let got = equation.expand_deltas();

        assert_eq!(got.to_string(), "T_f - T_i = 5");
    }
}
