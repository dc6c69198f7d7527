use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use notepress::{Config, DocumentSession, DocumentStatus};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notepress")]
#[command(about = "Convert markdown notes to Typst and PDF")]
struct Cli {
    /// Config file
    #[arg(short, long, global = true, default_value = "notepress.toml")]
    config: PathBuf,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a markdown file to PDF
    Convert {
        /// Input Markdown file
        input: PathBuf,

        /// Output PDF file (defaults to input name with .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the Typst markup for a markdown file
    Typst {
        input: PathBuf,
    },
    /// Print the block model for a markdown file
    Blocks {
        input: PathBuf,
    },
    /// Append markdown to a Typst document, creating it if needed
    Append {
        /// Input Markdown file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Document name (defaults to the configured name)
        #[arg(short, long)]
        name: Option<String>,

        /// Directory holding the document
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Also compile the document to PDF
        #[arg(long)]
        pdf: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> notepress::Result<()> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Convert { input, output } => {
            let markdown = read_input(Some(&input))?;
            let pdf_bytes = notepress::markdown_to_pdf(&markdown, &config)?;

            // Determine output path
            let output = output.unwrap_or_else(|| input.with_extension("pdf"));
            fs::write(&output, pdf_bytes).map_err(|source| notepress::Error::Io {
                path: output.clone(),
                source,
            })?;

            println!("Created {}", output.display());
        }
        Command::Typst { input } => {
            let markdown = read_input(Some(&input))?;
            print!("{}", notepress::markdown_to_typst_with_config(&markdown, &config));
        }
        Command::Blocks { input } => {
            let markdown = read_input(Some(&input))?;
            for block in notepress::segment(&markdown) {
                println!("{:#?}", block);
            }
        }
        Command::Append {
            input,
            name,
            dir,
            pdf,
        } => {
            let content = read_input(input.as_deref())?;
            let (session, status) = match (name, dir) {
                (None, None) => DocumentSession::open_default(&config)?,
                (name, dir) => {
                    let name = name.unwrap_or_else(|| config.document.default_name.clone());
                    DocumentSession::set_document(&name, dir.as_deref(), &config)?
                }
            };

            if status == DocumentStatus::Created {
                println!("Created {}", session.path().display());
            }

            let report = session.load_content(&content)?;
            println!(
                "Appended {} block(s) to {}",
                report.blocks,
                report.path.display()
            );

            if pdf {
                let output = session.export_pdf(None)?;
                println!("Created {}", output.display());
            }
        }
    }

    Ok(())
}

/// Read a file, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> notepress::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|source| notepress::Error::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .map_err(|source| notepress::Error::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(content)
        }
    }
}
