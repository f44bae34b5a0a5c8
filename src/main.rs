use std::{fs, io, path::PathBuf};

use anyhow::Context;
use clap::Parser as _;
use toy_frontend::{Driver, LogSink, OperatorSpec, Options, Precedence, ReadChars};

#[derive(clap::Parser, Debug)]
#[clap(about, long_about = None)]
struct Cli {
    /// Source file to parse; reads standard input interactively when absent
    file: Option<PathBuf>,

    /// Add or override a binary operator, e.g. `/=40`
    #[arg(short, long = "precedence", value_name = "OP=PREC")]
    precedence: Vec<OperatorSpec>,

    /// Start from an empty operator table instead of `< + - *`
    #[arg(long)]
    no_default_ops: bool,

    /// Print each parsed form
    #[arg(long)]
    dump_ast: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut precedence = if cli.no_default_ops {
        Precedence::empty()
    } else {
        Precedence::default()
    };
    precedence.extend(cli.precedence.iter().copied().map(Into::into));

    let summary = match &cli.file {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let options = Options {
                interactive: false,
                dump_ast: cli.dump_ast,
            };
            Driver::new(source.chars(), precedence, LogSink, io::stderr(), options)?.run()?
        }
        None => {
            let options = Options {
                interactive: true,
                dump_ast: cli.dump_ast,
            };
            let input = ReadChars::new(io::stdin().lock());
            Driver::new(input, precedence, LogSink, io::stderr(), options)?.run()?
        }
    };

    log::info!(
        "{} definitions, {} externs, {} expressions, {} errors",
        summary.definitions,
        summary.externs,
        summary.expressions,
        summary.errors
    );

    Ok(())
}
