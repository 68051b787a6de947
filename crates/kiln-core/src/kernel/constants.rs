/// Application name
pub const APP_NAME: &str = "Kiln";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default plugins directory
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Configuration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "kiln.toml";
