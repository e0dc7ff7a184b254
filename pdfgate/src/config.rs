//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `PDFGATE_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`, missing file is fine)
//! 2. **Environment variables** - Variables prefixed with `PDFGATE_` override YAML values
//! 3. **PORT** - Special case: the bare `PORT` variable overrides `port` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `PDFGATE_UPLOAD__MAX_FILE_SIZE=10485760` sets the `upload.max_file_size` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port (both forms accepted)
//! PORT=8080
//! PDFGATE_PORT=8080
//!
//! # Point at a different encryption tool binary
//! PDFGATE_TOOL__BINARY=/usr/local/bin/qpdf
//!
//! # Tighten the upload ceiling to 10 MiB
//! PDFGATE_UPLOAD__MAX_FILE_SIZE=10485760
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::qpdf::KeyLength;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PDFGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Cross-origin access configuration
    pub cors: CorsConfig,
    /// Upload handling configuration
    pub upload: UploadConfig,
    /// External encryption tool configuration
    pub tool: ToolConfig,
    /// Per-request workspace configuration
    pub workspace: WorkspaceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors: CorsConfig::default(),
            upload: UploadConfig::default(),
            tool: ToolConfig::default(),
            workspace: WorkspaceConfig::default(),
        }
    }
}

/// Cross-origin access configuration.
///
/// The allow-list holds exact origin strings. Requests from any other origin
/// (or with no `Origin` header) receive no cross-origin headers at all, which
/// leaves same-origin and server-to-server callers unaffected.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Origins permitted cross-origin access to responses (exact match)
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "https://docjoiner.com".to_string(),
                "https://www.docjoiner.com".to_string(),
            ],
        }
    }
}

/// Upload handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Maximum accepted size of the uploaded document in bytes.
    ///
    /// Oversized uploads are drained to the end of the stream and answered
    /// with 413 rather than aborted mid-parse.
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 60 * 1024 * 1024, // 60 MiB
        }
    }
}

/// External encryption tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Tool executable, either a bare name resolved on PATH or an absolute path
    pub binary: PathBuf,
    /// Cipher key length used when the request does not select one
    pub default_key_length: KeyLength,
    /// Bound on a single tool invocation; the subprocess is killed on expiry
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("qpdf"),
            default_key_length: KeyLength::default(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Per-request workspace configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Directory under which per-request workspaces are created.
    /// Defaults to the system temporary directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("PDFGATE_").split("__"))
            // The deployment platform hands the listening port over as bare PORT
            .merge(Env::raw().only(&["PORT"]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upload.max_file_size == 0 {
            anyhow::bail!("Config validation: upload.max_file_size must be greater than zero");
        }
        if self.tool.binary.as_os_str().is_empty() {
            anyhow::bail!("Config validation: tool.binary must not be empty");
        }
        if self.tool.timeout.is_zero() {
            anyhow::bail!("Config validation: tool.timeout must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args_for(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args_for("missing.yaml"))?;

            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 3000);
            assert_eq!(config.upload.max_file_size, 60 * 1024 * 1024);
            assert_eq!(config.tool.binary, PathBuf::from("qpdf"));
            assert_eq!(config.tool.default_key_length, KeyLength::Aes256);
            assert_eq!(config.tool.timeout, Duration::from_secs(120));
            assert_eq!(
                config.cors.allowed_origins,
                vec!["https://docjoiner.com".to_string(), "https://www.docjoiner.com".to_string()]
            );
            assert!(config.workspace.root.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8080
cors:
  allowed_origins:
    - https://example.com
upload:
  max_file_size: 1048576
tool:
  binary: /opt/qpdf/bin/qpdf
  default_key_length: 128
  timeout: 30s
workspace:
  root: /var/tmp/pdfgate
"#,
            )?;

            let config = Config::load(&args_for("test.yaml"))?;

            assert_eq!(config.port, 8080);
            assert_eq!(config.cors.allowed_origins, vec!["https://example.com".to_string()]);
            assert_eq!(config.upload.max_file_size, 1_048_576);
            assert_eq!(config.tool.binary, PathBuf::from("/opt/qpdf/bin/qpdf"));
            assert_eq!(config.tool.default_key_length, KeyLength::Aes128);
            assert_eq!(config.tool.timeout, Duration::from_secs(30));
            assert_eq!(config.workspace.root, Some(PathBuf::from("/var/tmp/pdfgate")));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 8080\n")?;

            jail.set_env("PDFGATE_HOST", "127.0.0.1");
            jail.set_env("PDFGATE_PORT", "9090");
            jail.set_env("PDFGATE_UPLOAD__MAX_FILE_SIZE", "2048");

            let config = Config::load(&args_for("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9090);
            assert_eq!(config.upload.max_file_size, 2048);

            Ok(())
        });
    }

    #[test]
    fn test_bare_port_env_wins() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 8080\n")?;
            jail.set_env("PORT", "4545");

            let config = Config::load(&args_for("test.yaml"))?;
            assert_eq!(config.port, 4545);

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "listen_port: 8080\n")?;

            assert!(Config::load(&args_for("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "upload:\n  max_file_size: 0\n")?;

            assert!(Config::load(&args_for("test.yaml")).is_err());

            Ok(())
        });
    }
}
