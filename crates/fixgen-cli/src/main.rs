use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process;

use fixgen_core::expression::{ExpressionParser, Lexer, LexerRegistry};
use fixgen_core::{Error, FixtureFile, ResolvedFixtureSet};

/// fixgen: declarative test fixture generator
///
/// Load a JSON fixture file and generate its object graph, or inspect how a
/// single raw value lexes and parses.
#[derive(Parser)]
#[command(name = "fixgen", version, about, long_about = None)]
struct Cli {
    /// Log resolution steps (debug level)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every fixture of a file
    Generate {
        /// Path to the JSON fixture file
        file: PathBuf,
        /// Seed of the random source, overrides the file's options
        #[arg(long)]
        seed: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the tokens of a raw value
    Lex {
        /// Raw value, e.g. "Hello <name()> from @city"
        value: String,
    },

    /// Print the expression tree of a raw value
    Parse {
        /// Raw value, e.g. "80%? @user* : <{default_user}>"
        value: String,
    },

    /// Show version information
    Version,
}

/// Exit code for lex, parse and generation failures
const EXIT_FAILURE: i32 = 1;
/// Exit code for unreadable or malformed fixture files
const EXIT_ERROR: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Generate { file, seed, json } => cmd_generate(&file, seed, json),
        Commands::Lex { value } => cmd_lex(&value),
        Commands::Parse { value } => cmd_parse(&value),
        Commands::Version => {
            println!("fixgen {} (fixgen-core {})", env!("CARGO_PKG_VERSION"), fixgen_core::VERSION);
            0
        }
    };

    process::exit(exit_code);
}

/// `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_file(path: &Path) -> Result<FixtureFile, i32> {
    let source = std::fs::read_to_string(path).map_err(|err| {
        eprintln!("{} cannot read {}: {}", "error:".red().bold(), path.display(), err);
        EXIT_ERROR
    })?;
    fixgen_core::load_str(&source).map_err(|err| {
        eprintln!("{} {}: {}", "error:".red().bold(), path.display(), err);
        EXIT_ERROR
    })
}

fn cmd_generate(path: &Path, seed: Option<u64>, json: bool) -> i32 {
    let mut file = match load_file(path) {
        Ok(file) => file,
        Err(code) => return code,
    };
    if let Some(seed) = seed {
        file.options.seed = Some(seed);
    }
    tracing::info!(file = %path.display(), fixtures = file.fixtures.len(), "generating");

    match fixgen_core::generate(file) {
        Ok(set) if json => {
            print_json(&set.to_json());
            0
        }
        Ok(set) => {
            print_summary(&set);
            0
        }
        Err(err) => {
            report_error(&err, json);
            EXIT_FAILURE
        }
    }
}

fn cmd_lex(value: &str) -> i32 {
    match LexerRegistry::with_default_lexers().lex(value) {
        Ok(tokens) => {
            for token in tokens {
                println!("{}  {:?}", format!("{:<26}", token.kind.to_string()).cyan(), token.lexeme);
            }
            0
        }
        Err(err) => {
            report_error(&Error::from(err), false);
            EXIT_FAILURE
        }
    }
}

fn cmd_parse(value: &str) -> i32 {
    match ExpressionParser::default().parse_value(value) {
        Ok(node) => {
            println!("{}", node);
            0
        }
        Err(err) => {
            report_error(&err, false);
            EXIT_FAILURE
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("{} {}", "error:".red().bold(), err),
    }
}

fn print_summary(set: &ResolvedFixtureSet) {
    println!("{} {} objects", "generated".green().bold(), set.objects().len());

    if !set.parameters().is_empty() {
        println!("{}", "parameters".bold());
        for (name, value) in set.parameters() {
            println!("  {} = {}", name.yellow(), value.to_json());
        }
    }

    println!("{}", "objects".bold());
    for (id, instance) in set.objects() {
        println!("  {} ({})", id.green(), instance.class.dimmed());
        for (field, value) in &instance.fields {
            println!("    {}: {}", field, value.to_json());
        }
    }
}

fn report_error(err: &Error, json: bool) {
    if json {
        let trail = err.fixture_trail();
        print_json(&serde_json::json!({
            "error": err.root_cause().to_string(),
            "fixtures": trail,
            "circular_reference": err.as_circular_reference().map(|c| c.key.clone()),
        }));
        return;
    }

    eprintln!("{} {}", "error:".red().bold(), err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
        source = std::error::Error::source(cause);
    }
}
