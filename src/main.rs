use clap::{Parser as ClapParser, Subcommand};
use jmespath_lattice::cli::{self, CheckOptions, CheckResult, CliError, LintOptions};
use jmespath_lattice::DEFAULT_ITERATION_LIMIT;
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "jmes")]
#[command(about = "jmes - evaluate, format and type-check JMESPath expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate an expression against JSON
    Check {
        /// The JMESPath expression
        query: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print an expression in canonical form
    Fmt {
        /// The JMESPath expression
        query: String,
    },

    /// Predict the result type of an expression and report problems
    Lint {
        /// The JMESPath expression
        query: String,

        /// Sample JSON whose type is used as input (reads from stdin if piped)
        #[arg(short, long)]
        sample: Option<String>,

        /// Maximum fix-point iterations for folds
        #[arg(long, default_value_t = DEFAULT_ITERATION_LIMIT)]
        iteration_limit: usize,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            query,
            input,
            pretty,
            syntax_only,
        } => run_check(query, input, pretty, syntax_only),
        Commands::Fmt { query } => cli::execute_fmt(&query).map(|text| println!("{}", text)),
        Commands::Lint {
            query,
            sample,
            iteration_limit,
        } => run_lint(query, sample, iteration_limit),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_stdin_if_piped(given: Option<String>) -> Result<Option<String>, CliError> {
    match given {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_check(
    query: String,
    input: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = if syntax_only { input } else { read_stdin_if_piped(input)? };

    let options = CheckOptions {
        query,
        input,
        pretty,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_lint(query: String, sample: Option<String>, iteration_limit: usize) -> Result<(), CliError> {
    let options = LintOptions {
        query,
        sample: read_stdin_if_piped(sample)?,
        iteration_limit,
    };

    let report = cli::execute_lint(&options)?;
    println!("input:  {}", report.input);
    println!("result: {}", report.result.result);
    for problem in &report.result.problems {
        println!("{}", problem);
    }

    let errors = report.result.with_severity(jmespath_lattice::Severity::Error).count();
    if errors > 0 {
        return Err(CliError::LintFailed(errors));
    }
    Ok(())
}
