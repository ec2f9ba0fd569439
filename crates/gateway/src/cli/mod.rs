pub mod config;

use std::path::Path;

use clap::{Parser, Subcommand};

use gg_domain::config::Config;

/// GeminiGuard — a privacy-preserving multimodal analysis proxy.
#[derive(Debug, Parser)]
#[command(name = "geminiguard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP and WebSocket server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `GG_CONFIG` (or
/// `config.toml` by default), then apply the `PORT` override. Returns the
/// parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("GG_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let mut config = load_config_from(Path::new(&config_path))?;
    apply_port_override(&mut config, std::env::var("PORT").ok().as_deref())?;
    Ok((config, config_path))
}

/// Parse `path`, or return defaults when it does not exist.
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))
}

fn apply_port_override(config: &mut Config, port: Option<&str>) -> anyhow::Result<()> {
    if let Some(raw) = port.map(str::trim).filter(|p| !p.is_empty()) {
        config.server.port = raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT value {raw:?}: {e}"))?;
    }
    Ok(())
}
