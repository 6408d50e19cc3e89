use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox as lox;

use lox::ast_printer::AstPrinter;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::scanner::Scanner;
use lox::session::{Outcome, Session};
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language tree-walking interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive session (definitions persist between lines)
    Repl,
}

/// Reads a source file into a string.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    std::fs::read_to_string(filename).context(format!("Failed to read file {:?}", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

/// Scan a whole source string, printing lexical errors as they occur.
/// Returns the tokens and whether any error was seen.
fn scan_all(source: &str) -> (Vec<Token>, bool) {
    let mut tokens = Vec::new();
    let mut had_error = false;

    for item in Scanner::new(source.as_bytes()) {
        match item {
            Ok(token) => tokens.push(token),

            Err(e) => {
                had_error = true;
                eprintln!("{}", e);
            }
        }
    }

    (tokens, had_error)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            let source = read_file(&filename)?;
            let (tokens, had_error) = scan_all(&source);

            for token in &tokens {
                println!("{}", token);
            }

            if had_error {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(65);
            }
        }

        Commands::Parse { filename } => {
            let source = read_file(&filename)?;
            let (tokens, had_error) = scan_all(&source);

            if had_error {
                std::process::exit(65);
            }

            let mut parser = Parser::new(&tokens);

            match parser.parse_expression() {
                Ok(expr) => {
                    println!("{}", AstPrinter::print(&expr));
                }

                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            }
        }

        Commands::Evaluate { filename } => {
            let source = read_file(&filename)?;
            let (tokens, had_error) = scan_all(&source);

            if had_error {
                std::process::exit(65);
            }

            let mut parser = Parser::new(&tokens);

            match parser.parse_expression() {
                Ok(expr) => {
                    let mut interpreter = Interpreter::new();

                    match interpreter.evaluate(&expr) {
                        Ok(value) => println!("{}", value),

                        Err(e) => {
                            eprintln!("{}", e);
                            std::process::exit(70);
                        }
                    }
                }

                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            }
        }

        Commands::Run { filename } => {
            let source = read_file(&filename)?;
            let mut session = Session::new();

            match session.run(&source) {
                Outcome::Ok => {
                    info!("Program executed successfully");
                }

                Outcome::StaticError => std::process::exit(65),

                Outcome::RuntimeError => std::process::exit(70),
            }
        }

        Commands::Repl => {
            // Definitions accumulate; error state resets each line.
            let mut session = Session::new();
            let stdin = io::stdin();

            print!("> ");
            io::stdout().flush()?;

            for line in stdin.lock().lines() {
                let line = line?;

                if !line.trim().is_empty() {
                    session.run(&line);
                }

                print!("> ");
                io::stdout().flush()?;
            }
        }
    }

    Ok(())
}
