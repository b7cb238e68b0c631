use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root of uploaded files; images live in `<upload_dir>/images`.
    pub upload_dir: String,
    pub database_url: String,
    /// Allowed browser origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// Seed admin account, created at startup when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            upload_dir: "./data/uploads".into(),
            database_url: "sqlite://./data/db/location_admin.db".into(),
            cors_origins: vec!["http://localhost:3000".into()],
            admin_email: None,
            admin_password: None,
        }
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Location and booking admin API")]
pub struct Args {
    /// Host to bind to (overrides LOCATION_ADMIN_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides LOCATION_ADMIN_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory for uploaded images (overrides LOCATION_ADMIN_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Database URL (overrides LOCATION_ADMIN_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Comma-separated allowed origins (overrides LOCATION_ADMIN_CORS_ORIGINS)
    #[arg(long)]
    pub cors_origins: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    /// CLI values win over `LOCATION_ADMIN_*` variables, which win over
    /// the defaults.
    pub fn merge(args: Args) -> Result<Self> {
        let defaults = Self::default();

        let env_port = match env::var("LOCATION_ADMIN_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing LOCATION_ADMIN_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => defaults.port,
            Err(err) => return Err(err).context("reading LOCATION_ADMIN_PORT"),
        };
        let cors = args
            .cors_origins
            .or_else(|| env::var("LOCATION_ADMIN_CORS_ORIGINS").ok())
            .map(|raw| split_origins(&raw))
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            host: args
                .host
                .or_else(|| env::var("LOCATION_ADMIN_HOST").ok())
                .unwrap_or(defaults.host),
            port: args.port.unwrap_or(env_port),
            upload_dir: args
                .upload_dir
                .or_else(|| env::var("LOCATION_ADMIN_UPLOAD_DIR").ok())
                .unwrap_or(defaults.upload_dir),
            database_url: args
                .database_url
                .or_else(|| env::var("LOCATION_ADMIN_DATABASE_URL").ok())
                .unwrap_or(defaults.database_url),
            cors_origins: cors,
            admin_email: non_empty_env("LOCATION_ADMIN_ADMIN_EMAIL"),
            admin_password: non_empty_env("LOCATION_ADMIN_ADMIN_PASSWORD"),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_override_defaults() {
        let cfg = AppConfig::merge(Args {
            host: Some("127.0.0.1".into()),
            port: Some(8088),
            upload_dir: Some("/srv/uploads".into()),
            database_url: Some("sqlite://x.db".into()),
            cors_origins: Some("http://a.kg, ,http://b.kg".into()),
            migrate: false,
        })
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8088");
        assert_eq!(cfg.upload_dir, "/srv/uploads");
        assert_eq!(cfg.cors_origins, vec!["http://a.kg", "http://b.kg"]);
    }
}
