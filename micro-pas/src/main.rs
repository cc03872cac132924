use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use micro_pas::parser::lexer::Lexer;
use micro_pas::CompileError;

#[derive(Parser)]
#[command(name = "micro-pas")]
#[command(about = "Front end for a small Pascal-like teaching language", version)]
struct Cli {
    /// Больше логов (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Проверяет программу: лексика, синтаксис и типы
    Check {
        /// Исходник
        input: PathBuf,
    },

    /// Показать токены без разбора
    Tokens {
        /// Исходник
        input: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("micro_pas={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), CompileError> {
    match command {
        Commands::Check { input } => {
            micro_pas::check_file(&input)?;
            println!("Compilation finished without errors!");
        }
        Commands::Tokens { input } => {
            let source = fs::read_to_string(&input)?;
            for token in Lexer::new(source.chars()) {
                println!("TOKEN: {}", token?);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
