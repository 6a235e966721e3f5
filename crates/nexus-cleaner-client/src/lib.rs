//! # Nexus Cleaner Client
//!
//! Client for the Sonatype Nexus Repository Manager REST API, limited to what
//! pruning docker images requires: listing hosted docker repositories, paging
//! through their components and deleting assets or components.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nexus_cleaner_client::{ConfigFile, NexusClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigFile::load("nexus-cleaner.conf")?.into_config();
//!     let client = NexusClient::new(config)?;
//!
//!     for repository in client.docker_repositories().await? {
//!         let components = client.list_components(&repository).await?;
//!         println!("{repository}: {} components", components.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! All calls are issued sequentially by the caller; the client holds no state
//! besides its connection pool.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod api;
mod client;
mod config;
mod error;

pub use api::{Asset, Component, Page, Repository};
pub use client::NexusClient;
pub use config::{ConfigFile, NexusAuth, NexusConfig, DEFAULT_CONFIG_FILE};
pub use error::ClientError;
