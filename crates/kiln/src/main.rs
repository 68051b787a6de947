mod cli;

use std::process::ExitCode;

use clap::Parser;
use kiln_core::kernel::bootstrap::Application;
use kiln_core::kernel::constants;
use kiln_core::plugin_system::{PluginManager, Version, VersionMatcher};
use log::{debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{CliArgs, Commands};

/// Exit status for malformed command input
const USAGE_ERROR: u8 = 2;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // kiln-core logs through the `log` facade
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .finish();
    if let Err(e) = subscriber.try_init() {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);
    debug!("{} v{} starting", constants::APP_NAME, constants::APP_VERSION);

    match &args.command {
        Commands::Check { version, constraint } => check(version, constraint),
        Commands::List => match application(&args) {
            Some(app) => list(&app).await,
            None => ExitCode::FAILURE,
        },
        Commands::Load { identifier } => match application(&args) {
            Some(app) => load(&app, identifier).await,
            None => ExitCode::FAILURE,
        },
        Commands::Boot => match application(&args) {
            Some(mut app) => boot(&mut app).await,
            None => ExitCode::FAILURE,
        },
    }
}

fn application(args: &CliArgs) -> Option<Application> {
    match args.runtime_config() {
        Ok(config) => Some(Application::new(config)),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

async fn list(app: &Application) -> ExitCode {
    let manager = app.plugin_manager();
    let discovery = match manager.locate_all().await {
        Ok(discovery) => discovery,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    for descriptor in manager.descriptors().await {
        println!("{} {} ({})", descriptor.identifier, descriptor.version, descriptor.display_name);
        for dependency in descriptor.all_dependencies() {
            let state = if manager.is_available(&dependency.target).await {
                "available"
            } else {
                "missing"
            };
            println!("  {} [{}]", dependency, state);
        }
    }
    for (folder, e) in &discovery.skipped {
        println!("skipped {}: {}", folder, e);
    }
    ExitCode::SUCCESS
}

async fn load(app: &Application, identifier: &str) -> ExitCode {
    let manager = app.plugin_manager();
    if let Err(e) = manager.locate_all().await {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = manager.load(identifier).await {
        error!("Failed to load {}: {}", identifier, e);
        return ExitCode::FAILURE;
    }
    println!("Load order:");
    for plugin in manager.loaded_plugins().await {
        println!("  {} {}", plugin.identifier(), plugin.descriptor.version);
    }
    ExitCode::SUCCESS
}

async fn boot(app: &mut Application) -> ExitCode {
    let report = match app.boot().await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Loaded {} plugin(s):", report.loaded.len());
    for identifier in &report.loaded {
        println!("  {}", identifier);
    }
    for (identifier, e) in &report.failed {
        println!("failed {}: {}", identifier, e);
    }
    if let Err(e) = app.shutdown().await {
        error!("{}", e);
    }
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Exit status 0 when satisfied, 1 when not
fn check(version: &str, constraint: &str) -> ExitCode {
    let parsed = Version::parse(version).and_then(|candidate| {
        VersionMatcher::parse_requirement(constraint).map(|(matcher, required)| (candidate, matcher, required))
    });
    let (candidate, matcher, required) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(USAGE_ERROR);
        }
    };
    let requirement = match matcher {
        VersionMatcher::Any => matcher.to_string(),
        _ => format!("{}{}", matcher, required),
    };
    if matcher.matches(&required, &candidate) {
        println!("{} satisfies {}", candidate, requirement);
        ExitCode::SUCCESS
    } else {
        println!("{} does not satisfy {}", candidate, requirement);
        ExitCode::FAILURE
    }
}
