//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::client::Api;
use crate::config::{ClientConfig, CredentialConfig, RLL_SECRET_PATH};
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.client_config()?;
        match &self.cli.command {
            Commands::Check => self.check(&config).await,
            Commands::Get { path } => self.get(&config, path).await,
        }
    }

    /// Build the client configuration from the config file and flags
    ///
    /// Flags override the file; credential flags replace the file's
    /// credentials entirely.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let cli = &self.cli;
        let mut config = match (&cli.config, self.credentials_from_flags()?) {
            (Some(path), credentials) => {
                let mut config = ClientConfig::load(path)?;
                if let Some(credentials) = credentials {
                    config.credentials = credentials;
                }
                config
            }
            (None, Some(credentials)) => ClientConfig::new("", credentials),
            (None, None) => {
                return Err(Error::config(
                    "missing credentials, use --config, --email/--pwd, --key, --access-token, --api-token or --rl10",
                ))
            }
        };

        if let Some(host) = &cli.host {
            config.host.clone_from(host);
        }
        if cli.account.is_some() {
            config.account_id = cli.account;
        }
        if let Some(dump) = cli.dump {
            config.dump = dump.into();
        }
        config.self_service |= cli.ss;
        Ok(config)
    }

    fn credentials_from_flags(&self) -> Result<Option<CredentialConfig>> {
        let cli = &self.cli;
        if cli.rl10 {
            return Ok(Some(CredentialConfig::ProxySecret {
                secret_file: PathBuf::from(RLL_SECRET_PATH),
            }));
        }
        if let Some(refresh_token) = &cli.key {
            return Ok(Some(CredentialConfig::OAuth {
                refresh_token: refresh_token.clone(),
            }));
        }
        if let Some(token) = &cli.access_token {
            return Ok(Some(CredentialConfig::AccessToken {
                token: token.clone(),
            }));
        }
        if let Some(token) = &cli.api_token {
            return Ok(Some(CredentialConfig::Instance {
                token: token.clone(),
            }));
        }
        match (&cli.email, &cli.pwd) {
            (Some(email), Some(password)) => Ok(Some(CredentialConfig::Password {
                email: email.clone(),
                password: password.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(Error::config("--email and --pwd must be used together")),
        }
    }

    /// Check the credentials
    async fn check(&self, config: &ClientConfig) -> Result<()> {
        let api = Api::from_config(config).await?;
        info!("Checking credentials against {}", api.host());
        if let Some(auth) = api.auth() {
            auth.can_authenticate().await?;
        }
        println!("ok");
        Ok(())
    }

    /// Send a signed GET request
    async fn get(&self, config: &ClientConfig, path: &str) -> Result<()> {
        let api = Api::from_config(config).await?;
        let response = api.get(path).await?;
        println!("{}", response.status());
        println!("{}", response.text().await?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DumpFormat;
    use clap::Parser;
    use std::io::Write;

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["rsapi-auth"];
        argv.extend_from_slice(args);
        Runner::new(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_password_flags() {
        let config = runner(&[
            "--email", "a@b.c", "--pwd", "pw", "--account", "42", "--host", "us-4.rightscale.com",
            "check",
        ])
        .client_config()
        .unwrap();

        assert_eq!(config.host, "us-4.rightscale.com");
        assert_eq!(config.account_id, Some(42));
        assert!(matches!(config.credentials, CredentialConfig::Password { ref email, .. } if email == "a@b.c"));
    }

    #[test]
    fn test_email_without_password() {
        let err = runner(&["--email", "a@b.c", "check"]).client_config().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_missing_credentials() {
        let err = runner(&["get", "/api/clouds"]).client_config().unwrap_err();
        assert!(err.to_string().contains("missing credentials"));
    }

    #[test]
    fn test_flag_precedence() {
        let config = runner(&["--key", "rt", "--api-token", "it", "check"])
            .client_config()
            .unwrap();
        assert!(matches!(config.credentials, CredentialConfig::OAuth { .. }));

        let config = runner(&["--rl10", "--key", "rt", "check"]).client_config().unwrap();
        assert!(matches!(
            config.credentials,
            CredentialConfig::ProxySecret { ref secret_file } if secret_file == &PathBuf::from(RLL_SECRET_PATH)
        ));
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "host: us-3.rightscale.com\naccount_id: 1\ncredentials:\n  type: access_token\n  token: t\n"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let config = runner(&["--config", path, "--ss", "--dump", "json", "--account", "7", "check"])
            .client_config()
            .unwrap();
        assert_eq!(config.host, "us-3.rightscale.com");
        assert_eq!(config.account_id, Some(7));
        assert_eq!(config.dump, DumpFormat::Json);
        assert!(config.self_service);
        assert!(matches!(config.credentials, CredentialConfig::AccessToken { .. }));

        let config = runner(&["--config", path, "--key", "rt", "check"])
            .client_config()
            .unwrap();
        assert!(matches!(config.credentials, CredentialConfig::OAuth { .. }));
    }
}
