use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cluster_directory: String,
    pub strict_naming: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Object-storage tenant provisioning service")]
pub struct Args {
    /// Host to bind to (overrides PROVISIONER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PROVISIONER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides PROVISIONER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Path to the cluster directory JSON file (overrides PROVISIONER_CLUSTER_DIRECTORY)
    #[arg(long)]
    pub cluster_directory: Option<String>,

    /// Treat naming convention violations as hard errors instead of warnings
    #[arg(long)]
    pub strict_naming: bool,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("PROVISIONER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("PROVISIONER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PROVISIONER_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading PROVISIONER_PORT"),
        };
        let env_db = env::var("PROVISIONER_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/provisioner.db".into());
        let env_directory = env::var("PROVISIONER_CLUSTER_DIRECTORY")
            .unwrap_or_else(|_| "./clusters.json".into());
        let env_strict = env::var("PROVISIONER_STRICT_NAMING")
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            cluster_directory: args.cluster_directory.unwrap_or(env_directory),
            strict_naming: args.strict_naming || env_strict,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
