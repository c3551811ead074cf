//! The `keyscribe serve` command: run the inference proxy.

use clap::Args;
use keyscribe_core::Config;

/// Arguments for the `serve` command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to listen on (overrides proxy.bind)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Inference API base URL (overrides proxy.upstream_url)
    #[arg(long)]
    pub upstream: Option<String>,

    /// Outbound timeout in milliseconds (overrides proxy.timeout_ms)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Apply command-line overrides on top of the loaded config.
fn apply(args: ServeArgs, mut config: Config) -> anyhow::Result<Config> {
    if let Some(bind) = args.bind {
        config.proxy.bind = bind;
    }
    if let Some(upstream) = args.upstream {
        config.proxy.upstream_url = upstream;
    }
    if args.timeout_ms.is_some() {
        config.proxy.timeout_ms = args.timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let config = apply(args, config)?;
    keyscribe_core::proxy::serve(&config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let args = ServeArgs {
            bind: Some("0.0.0.0:9000".to_string()),
            upstream: Some("http://localhost:5000".to_string()),
            timeout_ms: Some(15_000),
        };
        let config = apply(args, Config::default()).unwrap();
        assert_eq!(config.proxy.bind, "0.0.0.0:9000");
        assert_eq!(config.proxy.upstream_url, "http://localhost:5000");
        assert_eq!(config.proxy.timeout_ms, Some(15_000));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = ServeArgs {
            bind: Some("not an address".to_string()),
            ..ServeArgs::default()
        };
        assert!(apply(args, Config::default()).is_err());
    }
}
