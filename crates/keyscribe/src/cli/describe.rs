//! The `keyscribe describe` command: caption images and derive keywords.

use clap::{Args, ValueEnum};
use keyscribe_core::{Config, Orchestrator, OutputFormat, OutputWriter, Phase, Session, UploadedImage};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Description and keyword sections as plain text
    Text,
    /// One JSON document per image
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Arguments for the `describe` command.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Image files to describe, processed one after another
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Proxy endpoint URL (overrides client.proxy_url)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Output format (defaults to output.format from config)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Per-hop timeout in milliseconds (overrides client.timeout_ms)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Execute the describe command.
pub async fn execute(args: DescribeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(proxy) = args.proxy {
        config.client.proxy_url = proxy;
    }
    if args.timeout_ms.is_some() {
        config.client.timeout_ms = args.timeout_ms;
    }
    config.validate()?;

    let orchestrator = Arc::new(Orchestrator::from_config(&config));
    // No point reading any image without a token
    orchestrator.token()?;
    let mut session = Session::new(orchestrator);

    let format = args
        .format
        .map(OutputFormat::from)
        .or_else(|| OutputFormat::parse(&config.output.format))
        .unwrap_or(OutputFormat::Text);
    let pretty = args.pretty || config.output.pretty;
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, format, pretty);

    let total = args.images.len();
    let mut failed = 0usize;
    for path in &args.images {
        let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        let state = match UploadedImage::from_path(&path, &config.limits).await {
            Ok(image) => session.run(image).await,
            Err(e) => session.reject(e),
        };

        if state.phase != Phase::Done {
            failed += 1;
            if let Some(error) = &state.error {
                tracing::error!("{}: {error}", path.display());
            }
        }
        writer.write(&state)?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        tracing::info!("Wrote {} result(s) to {}", writer.items_written(), path.display());
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {total} image(s) failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(images: Vec<PathBuf>, output: Option<PathBuf>) -> DescribeArgs {
        DescribeArgs {
            images,
            proxy: None,
            format: Some(FormatArg::Jsonl),
            pretty: false,
            output,
            timeout_ms: None,
        }
    }

    #[test]
    fn test_format_arg_maps_to_output_format() {
        assert_eq!(OutputFormat::from(FormatArg::Text), OutputFormat::Text);
        assert_eq!(OutputFormat::from(FormatArg::Jsonl), OutputFormat::JsonLines);
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_reading_images() {
        let mut config = Config::default();
        config.client.token = String::new();

        let err = execute(args(vec![PathBuf::from("nope.jpg")], None), config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("token is not set"));
    }

    #[tokio::test]
    async fn test_unreadable_images_are_reported_and_fail() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "not an image").unwrap();
        let out = dir.path().join("out.jsonl");

        let mut config = Config::default();
        config.client.token = "hf_test".to_string();

        let images = vec![dir.path().join("missing.jpg"), text];
        let err = execute(args(images, Some(out.clone())), config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("2 of 2"));

        let written = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["phase"], "idle");
        assert!(lines[1]["error"]
            .as_str()
            .unwrap()
            .contains("valid image file"));
    }
}
