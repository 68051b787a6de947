use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kiln_core::config::RuntimeConfig;
use kiln_core::kernel::{Result, constants};
use kiln_core::stage_manager::Realm;

/// Kiln: discover, resolve and boot plugins
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Runtime configuration file (.json, .toml, .yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Plugin root directory, overrides the configuration
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Act as server
    #[arg(long, global = true)]
    pub server: bool,

    /// Act as client
    #[arg(long, global = true)]
    pub client: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List discovered plugins and their dependencies
    List,
    /// Load one plugin and everything it depends on
    Load {
        /// Plugin identifier, `GroupID/PluginID`
        identifier: String,
    },
    /// Load every discovered plugin
    Boot,
    /// Check a version against a constraint such as `>=1.2` or `^2.0`
    Check {
        version: String,
        constraint: String,
    },
}

impl CliArgs {
    /// Configuration from `--config` (or `kiln.toml` in the working
    /// directory), with the command line overrides applied
    pub fn runtime_config(&self) -> Result<RuntimeConfig> {
        let default_file = PathBuf::from(constants::DEFAULT_CONFIG_FILE);
        let mut config = match &self.config {
            Some(path) => RuntimeConfig::load(path)?,
            None if default_file.is_file() => RuntimeConfig::load(&default_file)?,
            None => RuntimeConfig::default(),
        };
        if let Some(root) = &self.root {
            config = config.with_plugin_root(root);
        }
        if self.server || self.client {
            config = config.with_realm(Realm {
                server: self.server,
                client: self.client,
            });
        }
        Ok(config)
    }
}
