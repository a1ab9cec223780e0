use crate::{
    ops::{self, Context, EvaluationError},
    Equation, Expression, Symbol, SystemOfEquations,
};
use nalgebra::{DMatrix as Matrix, DVector as Vector};
use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
};

pub(crate) fn solve<C>(
    system: &SystemOfEquations,
    config: &SolverConfig,
    ctx: &C,
) -> Result<Solution, SolveError>
where
    C: Context,
{
    let unknowns = system.unknowns();

    if system.equations.len() != unknowns.len() {
        return Err(SolveError::WrongNumberOfEquations {
            equations: system.equations.len(),
            unknowns: unknowns.len(),
        });
    }

    if unknowns.is_empty() {
        return Ok(Solution {
            known_values: HashMap::new(),
        });
    }

    log::debug!(
        "Solving {} equations for {}",
        system.equations.len(),
        DisplayList(&unknowns)
    );

    let jacobian = Jacobian::for_equations(&system.equations, &unknowns, ctx)?;
    let got = solve_with_newtons_method(&jacobian, system, config, ctx)?;

    Ok(Solution {
        known_values: jacobian.collate_unknowns(got.as_slice()),
    })
}

/// Tuning knobs for the Newton's method solver.
///
/// ```rust
/// use delta_symbol::{ops::Builtins, Symbol, SolverConfig, SystemOfEquations};
///
/// let x = Symbol::named("x");
/// let config = SolverConfig::default().with_initial_guess(x.clone(), -1.0);
///
/// let solution = SystemOfEquations::from_equations(&["x*x = 4"])
///     .unwrap()
///     .solve_with(&config, &Builtins::default())
///     .unwrap();
///
/// assert!((solution.known_values[&x] + 2.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Give up after this many steps.
    pub max_iterations: usize,
    /// The starting value for any unknown without its own guess.
    pub initial_guess: f64,
    pub initial_guesses: HashMap<Symbol, f64>,
}

impl SolverConfig {
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        SolverConfig {
            max_iterations,
            ..self
        }
    }

    pub fn with_default_guess(self, initial_guess: f64) -> Self {
        SolverConfig {
            initial_guess,
            ..self
        }
    }

    pub fn with_initial_guess<S>(mut self, symbol: S, value: f64) -> Self
    where
        S: Into<Symbol>,
    {
        self.initial_guesses.insert(symbol.into(), value);
        self
    }

    fn initial_guess_for(&self, symbol: &Symbol) -> f64 {
        self.initial_guesses
            .get(symbol)
            .copied()
            .unwrap_or(self.initial_guess)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_iterations: 50,
            initial_guess: 0.0,
            initial_guesses: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub known_values: HashMap<Symbol, f64>,
}

impl Solution {
    pub fn get<S>(&self, symbol: S) -> Option<f64>
    where
        S: AsRef<Symbol>,
    {
        self.known_values.get(symbol.as_ref()).copied()
    }

    /// The solved values, sorted by symbol.
    pub fn sorted(&self) -> Vec<(&Symbol, f64)> {
        let mut values: Vec<_> = self
            .known_values
            .iter()
            .map(|(symbol, value)| (symbol, *value))
            .collect();
        values.sort_by(|left, right| left.0.cmp(right.0));

        values
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    Eval(EvaluationError),
    DidntConverge,
    NoSolution,
    WrongNumberOfEquations { equations: usize, unknowns: usize },
}

impl From<EvaluationError> for SolveError {
    fn from(e: EvaluationError) -> Self { SolveError::Eval(e) }
}

impl Display for SolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Eval(inner) => {
                write!(f, "Evaluation failed: {}", inner)
            },
            SolveError::DidntConverge => {
                write!(f, "The solution didn't converge")
            },
            SolveError::NoSolution => write!(f, "No solution found"),
            SolveError::WrongNumberOfEquations {
                equations,
                unknowns,
            } => write!(
                f,
                "Unable to solve {} equations for {} unknowns",
                equations, unknowns
            ),
        }
    }
}

impl Error for SolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SolveError::Eval(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Solve a set of non-linear equations iteratively using Newton's method.
///
/// The iterative equation for Newton's method when applied to a set of
/// equations, `F`, is:
///
/// ```text
///  x_next = x_current - jacobian(F).inverse() * F(x_current)
/// ```
///
/// Rather than inverting the jacobian we rearrange it into the form `A.δx = b`
///
/// ```text
/// jacobian(F) * (x_next - x_current) = -F(x_current)
/// ```
///
/// and solve for `δx` with LU decomposition.
///
/// See also:
///
/// - https://en.wikipedia.org/wiki/Newton%27s_method#Nonlinear_systems_of_equations
fn solve_with_newtons_method<C>(
    jacobian: &Jacobian,
    system: &SystemOfEquations,
    config: &SolverConfig,
    ctx: &C,
) -> Result<Vector<f64>, SolveError>
where
    C: Context,
{
    let mut solution = jacobian.initial_values(config);

    for iteration in 0..config.max_iterations {
        let x_next = {
            let evaluated_jacobian =
                jacobian.evaluate(solution.as_slice(), ctx)?;

            let lookup = jacobian.lookup_value_by_name(solution.as_slice());
            let f_of_x = system.evaluate(&lookup, ctx)?;
            step_newtons_method(evaluated_jacobian, &solution, f_of_x)?
        };

        log::trace!(
            "Iteration {}: {:?}",
            iteration,
            x_next.as_slice()
        );

        if approx::relative_eq!(x_next, solution) {
            log::debug!("Converged after {} iterations", iteration + 1);
            return Ok(x_next);
        }
        solution = x_next;
    }

    log::debug!(
        "Gave up after {} iterations at {:?}",
        config.max_iterations,
        solution.as_slice()
    );

    Err(SolveError::DidntConverge)
}

fn step_newtons_method(
    jacobian: Matrix<f64>,
    x: &Vector<f64>,
    f_of_x: Vector<f64>,
) -> Result<Vector<f64>, SolveError> {
    // jacobian(F) * (x_next - x_current) = -F(x_current)
    let negative_f_of_x = -f_of_x;
    let delta_x = jacobian
        .lu()
        .solve(&negative_f_of_x)
        .ok_or(SolveError::NoSolution)?;

    Ok(delta_x + x)
}

/// A matrix of [`Expression`]s representing the partial derivatives for each
/// unknown in each equation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Jacobian<'a> {
    cells: Box<[Expression]>,
    equations: &'a [Equation],
    unknowns: &'a [Symbol],
}

impl<'a> Jacobian<'a> {
    fn for_equations<C>(
        equations: &'a [Equation],
        unknowns: &'a [Symbol],
        ctx: &C,
    ) -> Result<Self, EvaluationError>
    where
        C: Context,
    {
        let mut cells = Vec::new();

        for equation in equations {
            for unknown in unknowns {
                let value = if equation.body.depends_on(unknown) {
                    let derivative =
                        ops::partial_derivative(&equation.body, unknown, ctx)?;
                    ops::fold_constants(&derivative, ctx)
                } else {
                    Expression::Constant(0.0)
                };
                log::trace!("d({})/d{} = {}", equation.body, unknown, value);
                cells.push(value);
            }
        }

        Ok(Jacobian {
            cells: cells.into_boxed_slice(),
            equations,
            unknowns,
        })
    }

    fn rows(&self) -> usize { self.equations.len() }

    fn columns(&self) -> usize { self.unknowns.len() }

    fn evaluate<C>(
        &self,
        values: &[f64],
        ctx: &C,
    ) -> Result<Matrix<f64>, EvaluationError>
    where
        C: Context,
    {
        debug_assert_eq!(values.len(), self.unknowns.len());

        let mut evaluated = Vec::with_capacity(self.cells.len());
        let lookup = self.lookup_value_by_name(values);

        for row in self.iter_rows() {
            for expression in row {
                evaluated.push(ops::evaluate(expression, &lookup, ctx)?);
            }
        }

        // cells are stored row by row
        Ok(Matrix::from_row_slice(
            self.rows(),
            self.columns(),
            &evaluated,
        ))
    }

    fn lookup_value_by_name<'p>(
        &'p self,
        values: &'p [f64],
    ) -> impl Fn(&Symbol) -> Option<f64> + 'p {
        move |symbol| {
            self.unknowns
                .iter()
                .position(|s| s == symbol)
                .map(|ix| values[ix])
        }
    }

    pub(crate) fn collate_unknowns(
        &self,
        values: &[f64],
    ) -> HashMap<Symbol, f64> {
        self.unknowns
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect()
    }

    fn initial_values(&self, config: &SolverConfig) -> Vector<f64> {
        Vector::from_iterator(
            self.unknowns.len(),
            self.unknowns
                .iter()
                .map(|unknown| config.initial_guess_for(unknown)),
        )
    }

    fn iter_rows(&self) -> impl Iterator<Item = &[Expression]> + '_ {
        self.cells.chunks_exact(self.columns())
    }
}

struct DisplayList<'a>(&'a [Symbol]);

impl<'a> Display for DisplayList<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            Display::fmt(symbol, f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{delta::delta, ops::Builtins};

    #[test]
    fn single_equality() {
        let equation: Equation = "x = 5".parse().unwrap();
        let x = Symbol::named("x");
        let builtins = Builtins::default();

        let got = SystemOfEquations::new()
            .with(equation)
            .solve(&builtins)
            .unwrap();

        assert_eq!(got.known_values.len(), 1);
        assert_eq!(got.known_values[&x], 5.0);
    }

    #[test]
    fn solve_for_a_delta_symbol() {
        let dt = delta("T").unwrap();
        let system = SystemOfEquations::from_equations(&["ΔT*2 = 10"]).unwrap();

        let got = system.solve(&Builtins::default()).unwrap();

        assert_eq!(got.get(&dt), Some(5.0));
        assert_eq!(got.get(Symbol::named("T")), None);
    }

    #[test]
    fn delta_and_plain_symbols_are_separate_unknowns() {
        let system =
            SystemOfEquations::from_equations(&["ΔT + T = 3", "ΔT - T = 1"])
                .unwrap();

        let got = system.solve(&Builtins::default()).unwrap();

        assert_eq!(got.get(delta("T").unwrap()), Some(2.0));
        assert_eq!(got.get(Symbol::named("T")), Some(1.0));
    }

    #[test]
    fn calculate_jacobian_of_known_system_of_equations() {
        // See https://en.wikipedia.org/wiki/Jacobian_matrix_and_determinant#Example_5
        let system = SystemOfEquations::from_equations(&[
            "5 * b",
            "4*a*a - 2*sin(b*c)",
            "b*c",
        ])
        .unwrap();
        let ctx = Builtins::default();

        let unknowns = system.unknowns();
        let got = Jacobian::for_equations(&system.equations, &unknowns, &ctx)
            .unwrap();

        assert_eq!(
            got.columns(),
            system.num_unknowns(),
            "There are 3 unknowns"
        );
        assert_eq!(got.rows(), system.equations.len(), "There are 3 equations");

        // a = 1, b = 0, c = 2
        let evaluated = got.evaluate(&[1.0, 0.0, 2.0], &ctx).unwrap();
        let should_be = Matrix::from_row_slice(
            3,
            3,
            &[0.0, 5.0, 0.0, 8.0, -4.0, 0.0, 0.0, 2.0, 0.0],
        );
        assert!(approx::relative_eq!(evaluated, should_be));
    }

    #[test]
    fn jacobian_entries_are_independent_of_unrelated_unknowns() {
        let system =
            SystemOfEquations::from_equations(&["x-1", "y-2"]).unwrap();
        let ctx = Builtins::default();
        let unknowns = system.unknowns();

        let got = Jacobian::for_equations(&system.equations, &unknowns, &ctx)
            .unwrap();

        assert_eq!(got.cells[1], Expression::Constant(0.0));
        assert_eq!(got.cells[2], Expression::Constant(0.0));
    }

    #[test]
    fn solve_simple_equations() {
        let system =
            SystemOfEquations::from_equations(&["x-1", "y-2", "z-3"]).unwrap();
        let ctx = Builtins::default();
        let unknowns = system.unknowns();
        let jacobian =
            Jacobian::for_equations(&system.equations, &unknowns, &ctx)
                .unwrap();

        let got = solve_with_newtons_method(
            &jacobian,
            &system,
            &SolverConfig::default(),
            &ctx,
        )
        .unwrap();

        let named_values = jacobian.collate_unknowns(got.as_slice());
        let x = Symbol::named("x");
        let y = Symbol::named("y");
        let z = Symbol::named("z");
        assert_eq!(named_values[&x], 1.0);
        assert_eq!(named_values[&y], 2.0);
        assert_eq!(named_values[&z], 3.0);
    }

    #[test]
    fn work_through_youtube_example() {
        // From https://www.youtube.com/watch?v=zPDp_ewoyhM
        let system = SystemOfEquations::from_equations(&[
            "a + 2*b - 2",
            "a*a + 4*b*b - 4",
        ])
        .unwrap();
        let ctx = Builtins::default();

        let unknowns = system.unknowns();
        let jacobian =
            Jacobian::for_equations(&system.equations, &unknowns, &ctx)
                .unwrap();

        // make an initial guess
        let x_0 = Vector::from_vec(vec![1.0, 2.0]);

        // evaluate the components we need
        let jacobian_of_x_0 = jacobian.evaluate(x_0.as_slice(), &ctx).unwrap();
        let lookup_value = jacobian.lookup_value_by_name(x_0.as_slice());
        let f_of_x_0 = system.evaluate(lookup_value, &ctx).unwrap();

        // and double-check them
        assert_eq!(
            jacobian_of_x_0,
            Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 16.0])
        );
        assert_eq!(f_of_x_0.as_slice(), &[3.0, 13.0]);

        // one iteration of newton's method
        let x_1 = step_newtons_method(jacobian_of_x_0, &x_0, f_of_x_0).unwrap();
        let should_be = Vector::from_vec(vec![-10.0 / 12.0, 17.0 / 12.0]);
        assert!(approx::relative_eq!(x_1, should_be, epsilon = 1e-12));
    }

    #[test]
    fn initial_guess_picks_the_root() {
        let x = Symbol::named("x");
        let ctx = Builtins::default();
        let system = SystemOfEquations::from_equations(&["x*x = 4"]).unwrap();

        let negative = SolverConfig::default().with_initial_guess(x.clone(), -1.0);
        let got = system.clone().solve_with(&negative, &ctx).unwrap();
        assert!((got.known_values[&x] + 2.0).abs() < 1e-10);

        let positive = SolverConfig::default().with_default_guess(1.0);
        let got = system.clone().solve_with(&positive, &ctx).unwrap();
        assert!((got.known_values[&x] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn a_flat_starting_point_has_no_solution() {
        let system = SystemOfEquations::from_equations(&["x*x = 4"]).unwrap();

        let got = system.solve(&Builtins::default());

        assert_eq!(got, Err(SolveError::NoSolution));
    }

    #[test]
    fn running_out_of_iterations() {
        let system = SystemOfEquations::from_equations(&["x*x = 4"]).unwrap();
        let config = SolverConfig::default()
            .with_default_guess(1.0)
            .with_max_iterations(1);

        let got = system.solve_with(&config, &Builtins::default());

        assert_eq!(got, Err(SolveError::DidntConverge));
    }

    #[test]
    fn the_number_of_equations_must_match_the_unknowns() {
        let system = SystemOfEquations::from_equations(&["x + y = 1"]).unwrap();

        let got = system.solve(&Builtins::default());

        assert_eq!(
            got,
            Err(SolveError::WrongNumberOfEquations {
                equations: 1,
                unknowns: 2
            })
        );
    }

    #[test]
    fn an_empty_system_has_an_empty_solution() {
        let got = SystemOfEquations::new().solve(&Builtins::default()).unwrap();

        assert!(got.known_values.is_empty());
    }

    #[test]
    fn equations_without_unknowns_cant_be_solved() {
        let system = SystemOfEquations::from_equations(&["2 = 2"]).unwrap();

        let got = system.solve(&Builtins::default());

        assert_eq!(
            got,
            Err(SolveError::WrongNumberOfEquations {
                equations: 1,
                unknowns: 0
            })
        );
    }

    #[test]
    fn solve_with_inverse_trig_and_abs() {
        let ctx = Builtins::default();
        let x = Symbol::named("x");

        let system =
            SystemOfEquations::from_equations(&["atan(x) = 0.5"]).unwrap();
        let got = system.solve(&ctx).unwrap();
        assert!((got.known_values[&x] - 0.5_f64.tan()).abs() < 1e-10);

        let dt = delta("T").unwrap();
        let config = SolverConfig::default().with_initial_guess(dt.clone(), 1.0);
        let system =
            SystemOfEquations::from_equations(&["abs(ΔT) = 3"]).unwrap();
        let got = system.solve_with(&config, &ctx).unwrap();
        assert_eq!(got.get(&dt), Some(3.0));
    }

    #[test]
    fn evaluation_errors_are_displayed() {
        let got = SolveError::Eval(EvaluationError::UnknownFunction {
            name: "foo".into(),
        });

        assert_eq!(
            got.to_string(),
            "Evaluation failed: Unknown function, \"foo\""
        );
    }

    #[test]
    fn unknown_functions_are_reported() {
        let system = SystemOfEquations::from_equations(&["foo(x) = 1"]).unwrap();

        let got = system.solve(&Builtins::default());

        assert!(matches!(got, Err(SolveError::Eval(_))));
    }

    #[test]
    fn sorted_solution() {
        let system =
            SystemOfEquations::from_equations(&["y = 2", "x = 1"]).unwrap();

        let got = system.solve(&Builtins::default()).unwrap();

        assert_eq!(
            got.sorted(),
            vec![(&Symbol::named("x"), 1.0), (&Symbol::named("y"), 2.0)]
        );
    }
}
