use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use depcop::{
    cache::{DiskCache, TieredCache},
    composer::{read_advisories_file, read_lock, AuditRunner, LOCKFILE_NAME},
    output::{format_result_to_string, print_result, OutputFormat},
    project, scan, verdict, Config, DependencyScope, ExitCodeScheme, Overrides, PackagistRegistry,
    RegistryClient, Severity,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit codes outside the verdict range
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "depcop")]
#[command(
    author,
    version,
    about = "Scan Composer dependencies for vulnerabilities, abandonment and staleness"
)]
struct Cli {
    /// Enable info-level logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the locked dependencies of a project
    Scan(ScanArgs),

    /// Show or create config file
    Config {
        /// Project directory
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the registry metadata cache
    ClearCache {
        /// Project directory (used to locate depcop.toml)
        #[arg(long, default_value = ".")]
        project: PathBuf,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Project directory containing composer.lock
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Config file (defaults to depcop.toml in the project directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format (table, json, md, html)
    #[arg(short, long)]
    format: Option<String>,

    /// Months without a release before a package is stale
    #[arg(long)]
    stale_months: Option<u32>,

    /// Severity that fails the build (low, moderate, high, critical)
    #[arg(long)]
    fail_on: Option<Severity>,

    /// Drop advisories below this severity
    #[arg(long)]
    min_severity: Option<Severity>,

    /// Composer executable used for `composer audit`
    #[arg(long)]
    composer_bin: Option<String>,

    /// Package to skip (repeatable, supports `*`)
    #[arg(long = "ignore-package")]
    ignore_packages: Vec<String>,

    /// Dependencies to scan (all, only-dev, exclude-dev)
    #[arg(long)]
    dependency_type: Option<DependencyScope>,

    /// Allowed license (repeatable)
    #[arg(long = "license-allow")]
    license_allowlist: Vec<String>,

    /// Denied license (repeatable)
    #[arg(long = "license-deny")]
    license_denylist: Vec<String>,

    /// Do not read or write the metadata cache
    #[arg(long)]
    no_cache: bool,

    /// Cache lifetime in seconds
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Exit code scheme (legacy, enhanced)
    #[arg(long)]
    exit_code: Option<ExitCodeScheme>,

    /// Hide progress output and table decorations
    #[arg(short, long)]
    quiet: bool,

    /// Write output to file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read advisories from a saved `composer audit --format=json` payload
    #[arg(long)]
    advisories: Option<PathBuf>,
}

impl ScanArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            format: self.format.clone(),
            stale_months: self.stale_months,
            fail_on: self.fail_on,
            min_severity: self.min_severity,
            composer_bin: self.composer_bin.clone(),
            quiet: self.quiet,
            ignore_packages: self.ignore_packages.clone(),
            dependency_type: self.dependency_type,
            license_allowlist: self.license_allowlist.clone(),
            license_denylist: self.license_denylist.clone(),
            no_cache: self.no_cache,
            cache_ttl: self.cache_ttl,
            exit_code: self.exit_code,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Scan(args) => run_scan(args).await,
        Commands::Config {
            project,
            init,
            path,
        } => {
            handle_config(&project, init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache { project } => {
            let config = Config::load(&Config::config_path(&project))?;
            let removed = disk_cache(&config).clear()?;
            println!("Cache cleared ({} entries).", removed);
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn disk_cache(config: &Config) -> DiskCache {
    let dir = config.cache_dir.clone().unwrap_or_else(DiskCache::default_dir);
    DiskCache::new(dir, config.cache_ttl())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    Ok(pb)
}

async fn run_scan(args: ScanArgs) -> Result<u8> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Config::config_path(&args.project));
    let mut config = Config::load(&config_path)?;
    config.apply(args.overrides());
    config.validate()?;

    let format = config.output_format()?;
    let policy = config.policy();
    let is_interactive = format == OutputFormat::Table && !config.quiet;

    let packages = read_lock(&args.project.join(LOCKFILE_NAME))?;
    info!("Read {} locked packages", packages.len());

    let raw_advisories = match &args.advisories {
        Some(path) => read_advisories_file(path)?,
        None => {
            let progress = if is_interactive {
                Some(spinner("Running composer audit...")?)
            } else {
                None
            };
            let payload = AuditRunner::new(&config.composer_bin).run(&args.project);
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            payload
        }
    };

    let packagist = PackagistRegistry::new(
        &config.registry_url,
        config.timeout(),
        config.connect_timeout(),
    )?;
    let mut client = RegistryClient::new(Arc::new(packagist));
    if config.cache_enabled {
        client = client.with_cache(Arc::new(TieredCache::new(disk_cache(&config))));
    }

    let progress = if is_interactive {
        Some(spinner("Checking packages on Packagist...")?)
    } else {
        None
    };

    let report = scan::evaluate(&packages, &raw_advisories, &client, &policy, chrono::Utc::now())
        .await
        .with_project(project::detect(&args.project, &packages));

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Checked {} packages, {} with issues",
            report.packages_scanned,
            report.findings.len()
        ));
    }

    // Handle output
    if let Some(path) = &args.output {
        let rendered = format_result_to_string(&report, format, config.quiet)?;
        std::fs::write(path, rendered)?;
        if is_interactive {
            println!("Results written to: {}", path.display());
        }
    } else {
        print_result(&report, format, config.quiet)?;
    }

    Ok(verdict::reduce(&report.findings, policy.fail_on, policy.exit_code))
}

fn handle_config(project: &Path, init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path(project);

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        Config::default().save(&config_path)?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depcop config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
