//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use prodoc::core::oracle::NullOracle;
use prodoc::io::discovery::discover_sources;
use prodoc::io::reports::SiteRenderer;
use prodoc::{BuildSession, DocLevel, ProdocConfig};

#[derive(Parser)]
#[command(name = "prodoc", version, about = "Documentation generator for .pro sources")]
struct Cli {
    /// Increase log verbosity (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a source tree and write the documentation site.
    Build {
        /// YAML configuration file; flags override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root directory of the source tree.
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Output directory for the generated site.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Default documentation dialect.
        #[arg(long)]
        format: Option<String>,

        /// Default markup style.
        #[arg(long)]
        markup: Option<String>,

        /// Site title.
        #[arg(long)]
        title: Option<String>,

        /// Overview file for site-level documentation.
        #[arg(long)]
        overview: Option<PathBuf>,

        /// Glob pattern to exclude from discovery; repeatable.
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Include private entities in the output.
        #[arg(long)]
        developer: bool,
    },

    /// Write a default configuration file.
    Init {
        /// Where to write the configuration.
        #[arg(short, long, default_value = "prodoc.yml")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build {
            config,
            root,
            output,
            format,
            markup,
            title,
            overview,
            ignore,
            developer,
        } => build(
            config, root, output, format, markup, title, overview, ignore, developer,
        ),
        Command::Init { output } => init(output),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "prodoc=debug" } else { "prodoc=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn build(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<String>,
    markup: Option<String>,
    title: Option<String>,
    overview: Option<PathBuf>,
    ignore: Vec<String>,
    developer: bool,
) -> anyhow::Result<ExitCode> {
    let mut config = match config_path {
        Some(path) => ProdocConfig::from_yaml_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProdocConfig::default(),
    };
    if let Some(root) = root {
        config.root = root;
    }
    if let Some(output) = output {
        config.output = output;
    }
    if let Some(format) = format {
        config.doc_format = format;
    }
    if let Some(markup) = markup {
        config.markup = markup;
    }
    if let Some(title) = title {
        config.title = title;
    }
    if let Some(overview) = overview {
        config.overview = Some(overview);
    }
    config.ignore_globs.extend(ignore);
    if developer {
        config.doc_level = DocLevel::Developer;
    }
    config.validate()?;

    let sources = discover_sources(&config.root, &config.ignore_globs)?;
    if sources.is_empty() {
        warn!(root = %config.root.display(), "no .pro files found");
    }

    let mut session = BuildSession::new(config);
    let oracle = NullOracle;
    let mut failed = 0usize;
    for path in &sources {
        if let Err(err) = session.parse_path(path, &oracle) {
            warn!(path = %path.display(), "skipped: {err}");
            failed += 1;
        }
    }
    session.finish();

    SiteRenderer::new()?.write_site(&session)?;

    let summary = session.summary();
    println!(
        "{} files, {} routines, {} classes; {} fully documented, {} partial, {} undocumented; {} warnings",
        summary.files,
        summary.routines,
        summary.classes,
        summary.full,
        summary.partial,
        summary.undocumented,
        summary.warnings
    );
    for warning in session.warnings() {
        eprintln!("warning: {warning}");
    }

    if failed > 0 {
        eprintln!("{failed} file(s) could not be parsed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init(output: PathBuf) -> anyhow::Result<ExitCode> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    let config = ProdocConfig::default();
    config
        .to_yaml_file(&output)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("wrote {}", output.display());
    Ok(ExitCode::SUCCESS)
}
