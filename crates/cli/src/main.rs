use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use firstline_cli::{watch, FsVault};
use firstline_engine::{Host, ProcessOptions, ProcessOutcome, RenameEngine};
use firstline_settings::RenameSettings;
use firstline_title::{extract_title, sanitize};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_DIR: &str = "firstline";
const CONFIG_FILE: &str = "config.toml";

#[derive(Parser)]
#[command(name = "firstline")]
#[command(about = "Rename markdown notes after their first line", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Vault directory
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    /// Settings file (default: <config dir>/firstline/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the title and file name a first line produces
    Preview(PreviewArgs),

    /// Rename one note after its first line
    Rename(RenameArgs),

    /// Rename every note in the vault
    #[command(name = "rename-all")]
    RenameAll(RenameAllArgs),

    /// Watch the vault and rename notes as they are edited
    Watch,

    /// Inspect or create the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct PreviewArgs {
    /// First line of a note
    line: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RenameArgs {
    /// Note to rename
    file: PathBuf,

    /// Bypass folder, tag, property, safeword and self-reference checks
    #[arg(long)]
    ignore_exclusions: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RenameAllArgs {
    /// Bypass folder, tag, property, safeword and self-reference checks
    #[arg(long)]
    ignore_exclusions: bool,

    /// Output the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as TOML
    Show,

    /// Write the default settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the settings file location
    Path,
}

#[derive(Serialize)]
struct PreviewOutput<'a> {
    line: &'a str,
    title: String,
    file_name: String,
}

#[derive(Serialize)]
struct RenameOutput<'a> {
    path: &'a str,
    #[serde(flatten)]
    outcome: &'a ProcessOutcome,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Preview(args) => args.json,
        Commands::Rename(args) => args.json,
        Commands::RenameAll(args) => args.json,
        Commands::Watch | Commands::Config(_) => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config_path = cli.config.clone().or_else(default_config_path);

    match cli.command {
        Commands::Preview(args) => run_preview(&args, config_path.as_deref())?,
        Commands::Rename(args) => run_rename(&cli.vault, &args, config_path.as_deref()).await?,
        Commands::RenameAll(args) => {
            run_rename_all(&cli.vault, &args, config_path.as_deref()).await?;
        }
        Commands::Watch => run_watch(&cli.vault, config_path.as_deref()).await?,
        Commands::Config(cmd) => run_config(cmd, config_path.as_deref())?,
    }

    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn load_settings(config_path: Option<&Path>) -> Result<RenameSettings> {
    match config_path {
        Some(path) => RenameSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => {
            log::debug!("No config directory on this platform, using defaults");
            Ok(RenameSettings::default())
        }
    }
}

fn open_engine(
    vault_dir: &Path,
    config_path: Option<&Path>,
) -> Result<(Arc<FsVault>, Arc<RenameEngine>)> {
    let settings = load_settings(config_path)?;
    let vault = Arc::new(
        FsVault::open(vault_dir)
            .with_context(|| format!("Invalid vault path {}", vault_dir.display()))?,
    );
    let engine = Arc::new(RenameEngine::new(Host::new(vault.clone()), settings));
    Ok((vault, engine))
}

fn options(ignore_exclusions: bool) -> ProcessOptions {
    if ignore_exclusions {
        ProcessOptions::manual().ignoring_exclusions()
    } else {
        ProcessOptions::manual()
    }
}

/// Show what a first line turns into
fn run_preview(args: &PreviewArgs, config_path: Option<&Path>) -> Result<()> {
    let settings = load_settings(config_path)?;
    let title = extract_title(&args.line, &settings);
    let file_name = format!("{}.md", sanitize(&title, &settings));

    if args.json {
        let output = PreviewOutput {
            line: &args.line,
            title,
            file_name,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Title:     {title}");
        println!("File name: {file_name}");
    }
    Ok(())
}

/// Rename a single note
async fn run_rename(vault_dir: &Path, args: &RenameArgs, config_path: Option<&Path>) -> Result<()> {
    let (vault, engine) = open_engine(vault_dir, config_path)?;
    let file = args
        .file
        .canonicalize()
        .with_context(|| format!("Invalid note path {}", args.file.display()))?;
    let Some(path) = vault.relative(&file) else {
        bail!(
            "{} is not inside the vault {}",
            file.display(),
            vault.root().display()
        );
    };

    let outcome = engine
        .process_file(&path, options(args.ignore_exclusions))
        .await;

    if args.json {
        let output = RenameOutput {
            path: &path,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &outcome {
            ProcessOutcome::Renamed { from, to } => println!("Renamed {from} -> {to}"),
            ProcessOutcome::AlreadyNamed => println!("{path} already matches its first line"),
            ProcessOutcome::Skipped { reason } => println!("Skipped {path}: {reason}"),
            ProcessOutcome::Failed { .. } => {}
        }
    }
    if let ProcessOutcome::Failed { error } = outcome {
        bail!("Failed to rename {path}: {error}");
    }
    Ok(())
}

/// Rename every note in the vault
async fn run_rename_all(
    vault_dir: &Path,
    args: &RenameAllArgs,
    config_path: Option<&Path>,
) -> Result<()> {
    let (_vault, engine) = open_engine(vault_dir, config_path)?;
    let summary = engine
        .rename_all(options(args.ignore_exclusions))
        .await
        .context("Failed to list notes")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.headline());
        for (reason, count) in &summary.skip_reasons {
            println!("  {reason}: {count}");
        }
        for error in &summary.errors {
            eprintln!("Error: {error}");
        }
    }
    Ok(())
}

async fn run_watch(vault_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let (vault, engine) = open_engine(vault_dir, config_path)?;
    watch::run(vault, engine).await
}

fn run_config(cmd: ConfigCommand, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let settings = load_settings(config_path)?;
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigCommand::Init { force } => {
            let Some(path) = config_path else {
                bail!("No config directory on this platform; pass --config");
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            RenameSettings::default()
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        ConfigCommand::Path => match config_path {
            Some(path) => println!("{}", path.display()),
            None => bail!("No config directory on this platform"),
        },
    }
    Ok(())
}
