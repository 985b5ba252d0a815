//! CLI for the cachedl download cache.

mod commands;

use anyhow::Result;
use cachedl_core::config;
use cachedl_core::CacheStore;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{
    run_clear, run_completions, run_get, run_inspect, run_manpage, run_path, GetRequest,
};

/// Top-level CLI for cachedl.
#[derive(Debug, Parser)]
#[command(name = "cachedl")]
#[command(about = "cachedl: checksum-validated HTTP download cache", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/cachedl/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the cache root directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch one or more URIs, optionally through the checksum-validated cache.
    Get {
        /// HTTP/HTTPS URIs to fetch. Several URIs are fetched concurrently.
        #[arg(required = true)]
        uris: Vec<String>,

        /// Cache id for the payload (enables caching; needs --checksum-uri).
        #[arg(long, requires = "checksum_uri")]
        id: Option<String>,

        /// URI whose body is the current checksum of the payload.
        #[arg(long, requires = "id", value_name = "URI")]
        checksum_uri: Option<String>,

        /// Suffix for the checksum marker file (default from config, ".cache").
        #[arg(long, value_name = "EXT")]
        checksum_ext: Option<String>,

        /// Extra request header, "Name: value". Repeat for more headers or values.
        #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
        headers: Vec<String>,

        /// Per-request timeout in milliseconds.
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Store the cached payload gzip-compressed.
        #[arg(long)]
        gzip: bool,

        /// Write the payload to this file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show cache paths, size, SHA-256 and stored checksum for an id.
    Inspect {
        /// Cache id.
        id: String,
        /// Checksum marker suffix.
        #[arg(long, value_name = "EXT")]
        checksum_ext: Option<String>,
    },

    /// Remove the cached payload and checksum marker for an id.
    Clear {
        /// Cache id.
        id: String,
        /// Checksum marker suffix.
        #[arg(long, value_name = "EXT")]
        checksum_ext: Option<String>,
    },

    /// Print the cache root directory.
    Path,

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print a roff man page.
    Manpage,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // These need no config or cache.
        match &cli.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Manpage => return run_manpage(),
            _ => {}
        }

        let mut cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        if let Some(dir) = cli.cache_dir {
            cfg.cache_dir = Some(dir);
        }
        tracing::debug!("loaded config: {:?}", cfg);
        let store = CacheStore::new(cfg.cache_root()?);

        match cli.command {
            CliCommand::Get {
                uris,
                id,
                checksum_uri,
                checksum_ext,
                headers,
                timeout_ms,
                gzip,
                output,
            } => {
                let req = GetRequest {
                    uris,
                    id,
                    checksum_uri,
                    checksum_ext,
                    headers,
                    timeout_ms,
                    gzip,
                    output,
                };
                run_get(&cfg, store, req).await?
            }
            CliCommand::Inspect { id, checksum_ext } => {
                let ext = checksum_ext.unwrap_or_else(|| cfg.checksum_extension.clone());
                run_inspect(&store, &id, &ext).await?
            }
            CliCommand::Clear { id, checksum_ext } => {
                let ext = checksum_ext.unwrap_or_else(|| cfg.checksum_extension.clone());
                run_clear(&store, &id, &ext).await?
            }
            CliCommand::Path => run_path(&store),
            CliCommand::Completions { .. } | CliCommand::Manpage => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
