//! CLI module for bz2redmine.
//!
//! Subcommands:
//! - `check`: Run the validation gate only
//! - `migrate`: Validate, then reload Redmine from Bugzilla

mod check;
mod migrate;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use crate::blob::FsBlobStore;
use crate::config::Config;
use crate::context::{Context, SourceDb, TargetDb};
use crate::directory::{open_directory, LoginDirectory};
use crate::error::StoreSide;
use crate::store::backends::postgres::PostgresStore;

/// bz2redmine - Bugzilla to Redmine migration
#[derive(Parser)]
#[command(name = "bz2redmine")]
#[command(about = "Migrate a Bugzilla database into Redmine (destructive reload)")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file, layered over the user and project files
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that every Bugzilla value can be mapped, without touching Redmine
    Check,

    /// Clear the Redmine tables and migrate everything from Bugzilla
    Migrate,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Check => self.run_check().await,
            Command::Migrate => self.run_migrate().await,
        }
    }

    /// Loads configuration and opens both stores and the collaborators.
    async fn connect(&self) -> Result<Context> {
        let config = Config::load(self.config.as_deref()).wrap_err("Failed to load configuration")?;

        let source = PostgresStore::connect(&config.source.uri, StoreSide::Source).await?;
        let target = PostgresStore::connect(&config.target.uri, StoreSide::Target).await?;

        let directory: Option<Arc<dyn LoginDirectory>> = match &config.directory {
            Some(settings) => Some(open_directory(settings).await?),
            None => None,
        };
        let blobs = Arc::new(FsBlobStore::new(&config.attachments.path));

        Ok(Context::new(
            SourceDb::new(source),
            TargetDb::new(target),
            config,
            blobs,
            directory,
        ))
    }
}
