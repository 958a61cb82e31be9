use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use wiki_status_core::config::{Config, CONFIG_FILE};
use wiki_status_core::{locale_menu, LocaleReport, Wiki};
use wiki_status_report::{diff, json, markdown, text, DIFF_NOT_FOUND};

#[derive(Parser)]
#[command(name = "wiki-status")]
#[command(about = "Report translation status of a multi-locale wiki kept in git")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write per-locale reports, the locale index and baseline diffs
    Build {
        /// Path to the wiki checkout
        wiki: PathBuf,
        /// Output directory
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        /// Config file path (defaults to .wiki-status.toml in the wiki or an ancestor)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the status of one locale, or the locale menu
    Summary {
        /// Path to the wiki checkout
        wiki: PathBuf,
        #[arg(short, long)]
        locale: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Create a default .wiki-status.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Json => "json",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            wiki,
            out,
            format,
            config,
        } => cmd_build(&wiki, &out, format, config.as_deref()).await,
        Commands::Summary {
            wiki,
            locale,
            config,
        } => cmd_summary(&wiki, locale.as_deref(), config.as_deref()).await,
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(wiki_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Ok(Config::load_or_default(wiki_path)),
    }
}

fn open_wiki(wiki_path: &Path, config_path: Option<&Path>) -> Result<Wiki> {
    let config = load_config(wiki_path, config_path)?;
    Wiki::open(wiki_path, config)
        .with_context(|| format!("failed to open wiki at {}", wiki_path.display()))
}

async fn cmd_build(
    wiki_path: &Path,
    out: &Path,
    format: Format,
    config_path: Option<&Path>,
) -> Result<()> {
    let wiki = open_wiki(wiki_path, config_path)?;
    let ext = format.extension();

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("failed to create {}", out.display()))?;

    let menu = locale_menu(&wiki).await?;
    let mut diff_count = 0usize;

    for item in &menu {
        let artifacts = wiki.diff_artifacts(&item.code).await?;
        let mut written = HashSet::new();
        for artifact in &artifacts {
            write_file(&out.join(artifact.output_path("diff")), &diff::format_diff(artifact))
                .await?;
            written.insert(artifact.link.clone());
        }
        diff_count += written.len();

        let report = LocaleReport::build(&wiki, &item.code).await?;
        let rendered = match format {
            Format::Markdown => markdown::format_report(&report, &written),
            Format::Json => json::format_report(&report, false)?,
        };
        write_file(&out.join(format!("{}.{ext}", item.code)), &rendered).await?;
        tracing::info!(
            locale = %item.code,
            problems = report.problem_count,
            diffs = written.len(),
            "wrote locale report"
        );
    }

    let index = match format {
        Format::Markdown => markdown::format_menu(&menu),
        Format::Json => json::format_menu(wiki.baseline(), &menu, false)?,
    };
    write_file(&out.join(format!("index.{ext}")), &index).await?;
    if format == Format::Markdown {
        write_file(
            &out.join(format!("{DIFF_NOT_FOUND}.md")),
            &markdown::format_diff_not_found(),
        )
        .await?;
    }

    println!(
        "Wrote {} locale reports and {} diffs to {}",
        menu.len(),
        diff_count,
        out.display()
    );
    Ok(())
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

async fn cmd_summary(
    wiki_path: &Path,
    locale: Option<&str>,
    config_path: Option<&Path>,
) -> Result<()> {
    let wiki = open_wiki(wiki_path, config_path)?;

    match locale {
        Some(code) => {
            if !wiki.config().locales.is_supported(code) {
                anyhow::bail!("'{code}' is not a supported locale");
            }
            let report = LocaleReport::build(&wiki, code).await?;
            print!("{}", text::format_report(&report));
        }
        None => {
            let menu = locale_menu(&wiki).await?;
            print!("{}", text::format_menu(&menu));
        }
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(())
}
