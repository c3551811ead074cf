//! The `keyscribe config` command for configuration management.

use clap::{Args, Subcommand};
use keyscribe_core::Config;
use std::path::{Path, PathBuf};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Replace literal token values; `${ENV_VAR}` references are shown as-is.
fn redact_tokens(mut config: Config) -> Config {
    for token in [&mut config.client.token, &mut config.proxy.token] {
        let is_reference = token.starts_with("${") && token.ends_with('}');
        if !token.is_empty() && !is_reference {
            *token = "<redacted>".to_string();
        }
    }
    config
}

/// Write the default config to `path`, refusing to clobber unless `force`.
fn init_at(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = Config::default().to_toml()?;
    std::fs::write(path, toml)?;
    Ok(())
}

/// Execute the config command.
///
/// `explicit_path` is the `--config` flag, if any; `config` is what was loaded.
pub async fn execute(
    args: ConfigArgs,
    explicit_path: Option<PathBuf>,
    config: Config,
) -> anyhow::Result<()> {
    let path = explicit_path.unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            println!("{}", redact_tokens(config).to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            init_at(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init_at(&path, false).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.proxy.route, "/image-proxy");
    }

    #[test]
    fn test_show_redacts_literal_tokens() {
        let mut config = Config::default();
        config.client.token = "hf_SECRET_TOKEN".to_string();

        let shown = redact_tokens(config).to_toml().unwrap();
        assert!(!shown.contains("hf_SECRET_TOKEN"));
        assert!(shown.contains("<redacted>"));
        // Default proxy token is an env reference and stays visible
        assert!(shown.contains("${HUGGING_FACE_TOKEN}"));
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(init_at(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        init_at(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[proxy]"));
    }
}
