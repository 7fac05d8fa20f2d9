use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tkdocs::logging::{init_logging, LoggingConfig};
use tkdocs::prelude::*;
use tkdocs_markup::{parse_document, render, Document, Lexer};

#[derive(Parser)]
#[command(name = "tkdocs")]
#[command(about = "Check, format and inspect TkinDocs (.tkd) documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, e.g. `debug` or `tkdocs=trace` (default: RUST_LOG, then info)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Log at debug level when no filter is given
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and build the document headlessly; report the first error
    Check { path: PathBuf },

    /// Print the document in canonical form
    Fmt {
        path: PathBuf,

        /// Rewrite the file in place instead of printing
        #[arg(long)]
        write: bool,
    },

    /// Build the document headlessly and print the widget tree
    Tree { path: PathBuf },

    /// Print the token stream, one token per line
    Tokens { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default();
    if cli.verbose {
        logging = logging.level(log::LevelFilter::Debug);
    }
    if let Some(filter) = &cli.log {
        logging = logging.filter(filter.clone());
    }
    init_logging(logging);

    match cli.command {
        Commands::Check { path } => {
            let (tk, tree) = build(&path)?;
            println!("ok: {} widgets", tree.widget_count());
            log::debug!("{} still alive in the headless toolkit", tk.live_count());
        }
        Commands::Fmt { path, write } => {
            let doc = parse(&path)?;
            let out = render(&doc);
            if write {
                fs::write(&path, &out).with_context(|| format!("writing {}", path.display()))?;
                log::info!("formatted {}", path.display());
            } else {
                print!("{out}");
            }
        }
        Commands::Tree { path } => {
            let (tk, tree) = build(&path)?;
            print!("{}", tk.dump(tree.root()));
        }
        Commands::Tokens { path } => {
            let src = read(&path)?;
            for token in Lexer::new(&src).keep_comments(true) {
                let token = token.with_context(|| path.display().to_string())?;
                println!("{}:{} {:?} {:?}", token.line, token.col, token.kind, token.lexeme);
            }
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn parse(path: &Path) -> Result<Document> {
    let src = read(path)?;
    parse_document(path.display().to_string(), 0, &src)
        .with_context(|| path.display().to_string())
}

/// Build against the headless toolkit. Callbacks are not bound to anything,
/// so every callback identifier gets a stub that only logs.
fn build(path: &Path) -> Result<(HeadlessToolkit, WidgetTree)> {
    let doc = parse(path)?;
    let compiler = Compiler::new().on_unbound(|name| {
        let name = name.to_string();
        Callback::new(name.clone(), move |ev| log::info!("{name} fired by {} on {}", ev.name, ev.widget))
    });
    let mut tk = HeadlessToolkit::new();
    let tree = compiler
        .build(&mut tk, &doc)
        .with_context(|| path.display().to_string())?;
    Ok((tk, tree))
}
