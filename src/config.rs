//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::Error;
use crate::middleware::ApiConfig;
use crate::password::CredentialVerifier;

/// Deployment environment, selecting log format and whether in-memory backends are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum Environment {
    #[default]
    #[display("local")]
    Local,
    #[display("dev")]
    Dev,
    #[display("prod")]
    Prod,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(Error::Config(format!(
                "APP_ENV: unknown environment '{other}' (expected local, dev or prod)"
            ))),
        }
    }
}

impl Environment {
    /// Read `APP_ENV`, defaulting to [`Environment::Local`] when unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown environment name.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_var(non_empty_var("APP_ENV"))
    }

    fn from_var(raw: Option<String>) -> Result<Self, Error> {
        raw.map_or(Ok(Self::default()), |raw| raw.parse())
    }
}

/// Everything the binary needs to start.
pub struct Config {
    pub environment: Environment,
    pub listen_addr: SocketAddr,
    /// Postgres URL. Only optional in [`Environment::Local`].
    pub database_url: Option<String>,
    /// Redis URL. Only optional in [`Environment::Local`].
    pub redis_url: Option<String>,
    /// Argon2 memory cost in KiB.
    pub password_hash_cost: Option<u32>,
    pub api: ApiConfig,
}

impl Config {
    /// # Env vars
    /// - `APP_ENV`: `local` (default), `dev` or `prod`
    /// - `LISTEN_ADDR`: bind address (default `0.0.0.0:8010`)
    /// - `DATABASE_URL`, `REDIS_URL`: required outside `local`
    /// - `PASSWORD_HASH_COST`: Argon2 memory cost in KiB
    /// - everything read by [`ApiConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid values or missing backends outside `local`.
    pub fn from_env() -> Result<Self, Error> {
        let environment = Environment::from_env()?;

        let listen_addr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8010".into())
            .parse()
            .map_err(|e| Error::Config(format!("LISTEN_ADDR: {e}")))?;

        let database_url = non_empty_var("DATABASE_URL");
        let redis_url = non_empty_var("REDIS_URL");
        if environment != Environment::Local {
            if database_url.is_none() {
                return Err(Error::Config(format!("DATABASE_URL is required in {environment}")));
            }
            if redis_url.is_none() {
                return Err(Error::Config(format!("REDIS_URL is required in {environment}")));
            }
        }

        let password_hash_cost = non_empty_var("PASSWORD_HASH_COST")
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|e| Error::Config(format!("PASSWORD_HASH_COST: {e}")))
            })
            .transpose()?;

        Ok(Self {
            environment,
            listen_addr,
            database_url,
            redis_url,
            password_hash_cost,
            api: ApiConfig::from_env()?,
        })
    }

    /// Credential verifier using the configured hash cost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if Argon2 rejects the cost.
    pub fn credentials(&self) -> Result<CredentialVerifier, Error> {
        match self.password_hash_cost {
            Some(cost) => CredentialVerifier::with_memory_cost(cost),
            None => Ok(CredentialVerifier::new()),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
