//! acctprov - Account Provider Manifest Ingester
//!
//! Command-line driver for the package manager hooks. The process exit code
//! is the hook status (0 on success, -1 on failure).

use acctprov::config::{validate_config_result, IngestConfig};
use acctprov::hooks::{status_code, PackageHooks, STATUS_FAILED, STATUS_OK};
use acctprov::host::{StaticAppManager, StaticPackageRegistry};
use acctprov::manifest::{self, Element};
use acctprov::resolver::IconResolver;
use acctprov::store::{AccountStore, SqliteStore};
use acctprov::{Ingester, PreUpgrade};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

/// acctprov - Register packages as account providers
#[derive(Parser, Debug)]
#[command(name = "acctprov")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/acctprov/config.yaml)
    #[arg(short, long, env = "ACCTPROV_CONFIG")]
    config: Option<PathBuf>,

    /// Account database path (overrides the config file)
    #[arg(long, env = "ACCTPROV_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register the provider described by a package manifest
    Install {
        /// Manifest XML file
        manifest: PathBuf,

        /// Package ID
        #[arg(short, long)]
        package: String,
    },

    /// Remove provider registrations before an upgrade; prints the previous app ID
    PreUpgrade {
        /// Package ID
        #[arg(short, long)]
        package: String,
    },

    /// Register the upgraded provider and migrate accounts
    Upgrade {
        /// Manifest XML file
        manifest: PathBuf,

        /// Package ID
        #[arg(short, long)]
        package: String,

        /// App ID printed by pre-upgrade
        #[arg(long)]
        previous: Option<String>,
    },

    /// Remove the accounts and provider registrations of a package
    Uninstall {
        /// Package ID
        #[arg(short, long)]
        package: String,
    },

    /// Parse a manifest and print the resulting record as JSON
    Show {
        /// Manifest XML file
        manifest: PathBuf,
    },

    /// List registered provider types
    List,

    /// Write a default configuration file
    Init,
}

fn main() {
    if let Err(e) = acctprov::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            STATUS_FAILED
        }
    };

    process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let Cli {
        config: config_path,
        db,
        command,
    } = cli;

    // Every command except init needs a valid configuration
    let load = || load_config(config_path.as_deref(), db.clone());

    let code = match command {
        Commands::Init => handle_init_command(config_path.as_deref())?,

        Commands::Show { manifest } => {
            let config = load()?;
            let apps = StaticAppManager::from_config(&config.app_manager);
            let resolver = IconResolver::new(&config.icons, &apps);
            let record = load_document(&manifest)
                .and_then(|doc| manifest::parse_root(&doc, &resolver))?;
            println!("{}", record.to_json()?);
            STATUS_OK
        }

        Commands::Install { manifest, package } => {
            let ingester = open_ingester(&load()?)?;
            let result = load_document(&manifest).and_then(|doc| ingester.install(&doc, &package));
            status_code("install", &result)
        }

        Commands::PreUpgrade { package } => {
            let ingester = open_ingester(&load()?)?;
            let result = ingester.pre_upgrade(&package);
            if let Ok(PreUpgrade {
                previous_app_id: Some(ref app_id),
            }) = result
            {
                println!("{}", app_id);
            }
            status_code("pre-upgrade", &result)
        }

        Commands::Upgrade {
            manifest,
            package,
            previous,
        } => {
            let ingester = open_ingester(&load()?)?;
            let previous = PreUpgrade::new(previous);
            let result = load_document(&manifest)
                .and_then(|doc| ingester.upgrade(&doc, &package, &previous));
            status_code("upgrade", &result)
        }

        Commands::Uninstall { package } => {
            let ingester = open_ingester(&load()?)?;
            let result = ingester.uninstall(&package);
            status_code("uninstall", &result)
        }

        Commands::List => {
            let config = load()?;
            let store = SqliteStore::open(&config.database)
                .with_context(|| format!("opening {}", config.database.path.display()))?;
            let providers = store.provider_types()?;
            println!("Registered providers: {}", providers.len());
            for provider in providers {
                let label = provider
                    .label(manifest::DEFAULT_LOCALE)
                    .or_else(|| provider.labels.values().next().map(String::as_str))
                    .unwrap_or("-");
                println!(
                    "  {}  {}  multiple={}  capabilities={}",
                    provider.app_id,
                    label,
                    provider.multiple_accounts_supported,
                    provider.capabilities.len()
                );
            }
            STATUS_OK
        }
    };

    Ok(code)
}

fn load_config(path: Option<&Path>, db: Option<PathBuf>) -> anyhow::Result<IngestConfig> {
    let mut config = match path {
        Some(path) => IngestConfig::load(path)?,
        None => IngestConfig::load_default()?,
    };
    if let Some(db) = db {
        config.database.path = db;
    }
    validate_config_result(&config)?;
    Ok(config)
}

type CliIngester = Ingester<SqliteStore, StaticAppManager, StaticPackageRegistry>;

fn open_ingester(config: &IngestConfig) -> anyhow::Result<CliIngester> {
    let store = SqliteStore::open(&config.database)
        .with_context(|| format!("opening {}", config.database.path.display()))?;
    Ok(Ingester::new(
        store,
        StaticAppManager::from_config(&config.app_manager),
        StaticPackageRegistry::from_config(config),
        config.icons.clone(),
    ))
}

fn load_document(path: &Path) -> acctprov::Result<Element> {
    let xml = std::fs::read_to_string(path)?;
    manifest::parse_document(&xml)
}

fn handle_init_command(path: Option<&Path>) -> anyhow::Result<i32> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(IngestConfig::default_path);

    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(STATUS_OK);
    }

    IngestConfig::new()
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Created configuration at {}", path.display());
    Ok(STATUS_OK)
}
