use std::{
    error::Error,
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use yggdrasil::{lexer, parser, util::fmt::tree};

#[derive(Parser)]
#[command(name = "yggc")]
#[command(about = "Yggdrasil lexer and parser", version, long_about = None)]
struct Cli {
    /// Raises the log level (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prints the token stream of a source file
    Tokens {
        /// Path of the source file, or `-` for stdin
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Prints the syntax tree of a source file
    Ast {
        /// Path of the source file, or `-` for stdin
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Parses expressions read line by line from stdin
    Repl {
        /// Print tokens instead of the tree
        #[arg(long)]
        tokens: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    let mut out = io::stdout().lock();
    match command {
        Command::Tokens { file, json } => {
            let src = read_source(&file)?;
            let tokens = lexer::tokenize(&src).map_err(|e| format!("{}:{e:#}", file.display()))?;
            if json {
                serde_json::to_writer_pretty(&mut out, &tokens)?;
                writeln!(out)?;
            } else {
                tree::print_tokens(&mut out, &tokens)?;
            }
        }
        Command::Ast { file, json } => {
            let src = read_source(&file)?;
            let program = yggdrasil::compile(&src).map_err(|e| format!("{}:{e:#}", file.display()))?;
            if json {
                serde_json::to_writer_pretty(&mut out, &program)?;
                writeln!(out)?;
            } else {
                tree::print_node(&mut out, 0, &program)?;
            }
        }
        Command::Repl { tokens } => repl(tokens)?,
    }
    Ok(())
}

fn repl(print_tokens: bool) -> Result<(), Box<dyn Error>> {
    let mut input = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        input.clear();
        let n = io::stdin().read_line(&mut input)?;

        if n == 0 {
            println!("^D");
            return Ok(());
        }
        if input.trim().is_empty() {
            continue;
        }

        let tokens = match lexer::tokenize(&input) {
            Ok(tokens) => tokens,
            Err(error) => {
                eprintln!("{error:#}");
                continue;
            }
        };
        let mut out = io::stdout().lock();
        if print_tokens {
            tree::print_tokens(&mut out, &tokens)?;
            continue;
        }
        match parser::parse_expr(&tokens) {
            Ok(expr) => tree::print_node(&mut out, 0, &expr)?,
            Err(error) => eprintln!("{error:#}"),
        }
    }
}

fn read_source(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        Ok(src)
    } else {
        fs::read_to_string(path)
    }
}
