//! Devin CLI — command-line host for the Devin language.

use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand};

fn red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}
fn green(s: &str) -> String {
    format!("\x1b[32m{}\x1b[0m", s)
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}
fn status_label(label: &str) -> String {
    format!("\x1b[1;32m{:>8}\x1b[0m", label)
}

#[derive(ClapParser)]
#[command(
    name = "devin",
    version,
    about = "Devin — a small imperative toy language",
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and type-check a source file without running it
    Check {
        /// Path to the source file
        file: PathBuf,

        /// Print the token stream instead of checking
        #[arg(long)]
        dump_tokens: bool,

        /// Print the checked AST as JSON
        #[arg(long)]
        dump_ast: bool,
    },
    /// Compile and run a source file
    Run {
        /// Path to the source file
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("devin_cli=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check {
            file,
            dump_tokens,
            dump_ast,
        } => cmd_check(&file, dump_tokens, dump_ast),
        Commands::Run { file } => cmd_run(&file),
    }
}

fn read_source(path: &PathBuf) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{} cannot read {}: {}", red("✗ Error:"), path.display(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_check(file: &PathBuf, dump_tokens: bool, dump_ast: bool) {
    let source = read_source(file);
    let filename = file.display().to_string();
    tracing::debug!(bytes = source.len(), %filename, "read source");

    if dump_tokens {
        match devin_compiler::tokenize(&source) {
            Ok(tokens) => {
                for token in &tokens {
                    println!("{:?}", token);
                }
            }
            Err(e) => {
                eprintln!("{} {}", red("✗ Error:"), e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{} {}", status_label("Checking"), bold(&filename));
    let (ast, parse_errors) = devin_compiler::parse(&source);
    if !parse_errors.is_empty() {
        tracing::warn!(count = parse_errors.len(), "parse failed");
        for err in &parse_errors {
            eprintln!("{}", format_with_location(&source, err.span.start, &err.to_string()));
        }
        std::process::exit(1);
    }
    let ast = ast.expect("parse succeeds with no errors iff it returns an AST");

    let (checked, diagnostics) = devin_compiler::check(ast);
    tracing::debug!(declarations = checked.declarations.len(), "checked program");
    if dump_ast {
        match serde_json::to_string_pretty(&checked) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} failed to serialize AST: {}", red("✗ Error:"), e),
        }
    }
    if !diagnostics.is_empty() {
        for diag in &diagnostics {
            eprintln!("{}", format_with_location(&source, diag.span().start, &diag.to_string()));
        }
        std::process::exit(1);
    }
    println!("{} no errors", green("✓"));
}

fn cmd_run(file: &PathBuf) {
    let source = read_source(file);
    let filename = file.display().to_string();

    println!("{} {}", status_label("Running"), bold(&filename));

    let (ast, parse_errors) = devin_compiler::parse(&source);
    if !parse_errors.is_empty() {
        for err in &parse_errors {
            eprintln!("{}", format_with_location(&source, err.span.start, &err.to_string()));
        }
        std::process::exit(1);
    }
    let ast = ast.expect("parse succeeds with no errors iff it returns an AST");

    let (checked, diagnostics) = devin_compiler::check(ast);
    if !diagnostics.is_empty() {
        for diag in &diagnostics {
            eprintln!("{}", format_with_location(&source, diag.span().start, &diag.to_string()));
        }
        std::process::exit(1);
    }

    let mut state = devin_rt::make_predefined_state();
    match devin_rt::evaluate(&checked, &mut state) {
        Ok(()) => {
            tracing::info!(%filename, "evaluation finished");
            println!("{} finished", green("✓"));
        }
        Err(e) => {
            tracing::error!(%filename, error = %e, "evaluation aborted");
            eprintln!("{} {}", red("✗ Runtime error:"), e);
            std::process::exit(1);
        }
    }
}

/// Converts a byte offset into a 1-based `line:col` and renders `message`
/// prefixed with it, e.g. `hello.devin:3:12: unexpected ...`.
fn format_with_location(source: &str, offset: usize, message: &str) -> String {
    let mut line = 1;
    let mut col = 1;
    for ch in source[..offset.min(source.len())].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    format!("{}:{}: {}", line, col, message)
}
