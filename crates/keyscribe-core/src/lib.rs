//! Keyscribe Core - caption an image, then derive keywords from the caption.
//!
//! Keyscribe chains two hosted inference models behind a small
//! credential-forwarding proxy:
//!
//! ```text
//! Image → Proxy → captioning model → caption
//!       → Proxy → keyphrase model  → "a, b c, d e f" → short-tail / long-tail
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use keyscribe_core::{Config, Orchestrator, UploadedImage};
//!
//! #[tokio::main]
//! async fn main() -> keyscribe_core::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator = Orchestrator::from_config(&config);
//!
//!     let image = UploadedImage::from_path("./dog.png".as_ref(), &config.limits).await?;
//!     let description = orchestrator.run(&image).await?;
//!     println!("{}", description.caption);
//!     println!("short-tail: {}", description.keywords.short_tail_text());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod keywords;
pub mod orchestrator;
pub mod output;
pub mod proxy;
pub mod session;
pub mod transport;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, KeyscribeError, PipelineError, PipelineResult, Result};
pub use keywords::KeywordSet;
pub use orchestrator::{Orchestrator, PipelineSettings};
pub use output::{OutputFormat, OutputWriter};
pub use session::{DisplayState, Phase, Session};
pub use transport::{InferenceRequest, InferenceTransport, ProxyTransport, TransportReply};
pub use types::{Caption, Description};
pub use upload::{ImageSummary, UploadedImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
