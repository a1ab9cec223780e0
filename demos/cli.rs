use clap::{Parser, ValueEnum};
use delta_symbol::{
    ops::Builtins, Equation, Render, SolverConfig, Style, SystemOfEquations,
};
use std::io::{BufRead, BufReader};

/// Read equations from stdin (one per line) and solve them.
#[derive(Parser)]
#[command(name = "cli")]
struct Args {
    /// How to print equations and results
    #[arg(long, value_enum, default_value = "plain")]
    style: OutputStyle,
    /// Give up after this many Newton iterations
    #[arg(long, default_value_t = 50)]
    max_iterations: usize,
    /// Starting value for every unknown
    #[arg(long, default_value_t = 0.0)]
    initial_guess: f64,
    /// Rewrite each ΔX as X_f - X_i before solving
    #[arg(long)]
    expand_deltas: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum OutputStyle {
    Plain,
    Ascii,
    Pretty,
    Latex,
}

impl From<OutputStyle> for Style {
    fn from(style: OutputStyle) -> Style {
        match style {
            OutputStyle::Plain => Style::Plain,
            OutputStyle::Ascii => Style::Ascii,
            OutputStyle::Pretty => Style::Pretty,
            OutputStyle::Latex => Style::Latex,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let style = Style::from(args.style);

    let mut system = SystemOfEquations::new();
    let stdin = std::io::stdin();

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse::<Equation>() {
            Ok(equation) if args.expand_deltas => {
                system.push(equation.expand_deltas())
            },
            Ok(equation) => system.push(equation),
            Err(e) => eprintln!("Unable to parse \"{}\": {}", line, e),
        }
    }

    for equation in &system {
        println!("{}", equation.display(style));
    }

    let unknowns: Vec<_> = system
        .unknowns()
        .iter()
        .map(|unknown| unknown.display(style).to_string())
        .collect();
    println!("Solving for {}", unknowns.join(", "));

    let config = SolverConfig::default()
        .with_max_iterations(args.max_iterations)
        .with_default_guess(args.initial_guess);
    let solution = system.solve_with(&config, &Builtins::default())?;

    println!("Found:");

    for (symbol, value) in solution.sorted() {
        println!("  {} = {}", symbol.display(style), value);
    }

    Ok(())
}
