// src/main.rs

use anyhow::{Context, Result};
use cairn::{
    inspect_candidate, ArtifactCoordinate, ArtifactRepository, CandidateStatus,
    ChannelArtifactResolver, FilesystemSource, Installation, ResolverConfig, StagingDir,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "cairn")]
#[command(author, version, about = "Channel-based artifact resolution and candidate staging", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the saved revisions of an installation, newest first
    History {
        /// Installation directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Resolve an artifact against the installation's channels
    Resolve {
        /// Coordinate: group:artifact[:extension[:classifier]]:version
        coordinate: String,
        /// Version range overriding the coordinate's version, e.g. "[1.0,2.0)"
        #[arg(short, long)]
        range: Option<String>,
        /// Installation directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Report whether a staged candidate is complete
    CandidateStatus {
        /// Candidate directory
        candidate: PathBuf,
    },
    /// Delete a staged candidate
    Discard {
        /// Candidate directory
        candidate: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Some(Commands::History { dir }) => {
            let installation = Installation::open(&dir)
                .with_context(|| format!("Failed to open installation at {}", dir.display()))?;
            let mut count = 0;
            for state in installation.revisions() {
                println!(
                    "{}  {}  {}",
                    state.id,
                    state.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    state.description
                );
                count += 1;
            }
            if count == 0 {
                println!("No saved revisions");
            }
            Ok(())
        }
        Some(Commands::Resolve {
            coordinate,
            range,
            dir,
        }) => {
            let installation = Installation::open(&dir)
                .with_context(|| format!("Failed to open installation at {}", dir.display()))?;
            let config = ResolverConfig::load(&dir)?;
            let source = FilesystemSource::new().offline(config.offline);
            let mut resolver = ChannelArtifactResolver::from_config(
                installation.channels().to_vec(),
                Box::new(source),
                &config,
            )?;

            let mut request = ArtifactCoordinate::parse(&coordinate)?;
            let artifact = match range {
                Some(range) => {
                    request = request.with_range(range);
                    resolver.resolve_latest_version(&request)?
                }
                None => resolver.resolve(&request)?,
            };
            resolver.close()?;

            info!("Resolved {} from channel {}", request, artifact.channel);
            println!("{}:{}", artifact.key, artifact.version);
            println!("  Channel: {}", artifact.channel);
            println!("  Path: {}", artifact.path.display());
            Ok(())
        }
        Some(Commands::CandidateStatus { candidate }) => {
            match inspect_candidate(&candidate)? {
                CandidateStatus::Complete(marker) => {
                    println!("Complete: {} based on revision {}", marker.operation, marker.revision);
                }
                CandidateStatus::Incomplete => {
                    println!("Incomplete: no valid marker in {}", candidate.display());
                }
            }
            Ok(())
        }
        Some(Commands::Discard { candidate }) => {
            StagingDir::open(&candidate)?
                .discard()
                .with_context(|| format!("Failed to discard {}", candidate.display()))?;
            println!("Discarded {}", candidate.display());
            Ok(())
        }
        None => {
            println!("Cairn v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'cairn --help' for usage information");
            Ok(())
        }
    }
}
