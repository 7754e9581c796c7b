//! Configuration resolution from CLI args and the JSON config file

use crate::cli::Args;
use crate::error::CliError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

/// Contents of the JSON config file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    catalog: Option<String>,
    userid: Option<String>,
    password: Option<String>,
}

/// Resolved runtime configuration
pub struct Config {
    /// Catalog URL
    pub catalog: String,
    /// Patron card number
    pub userid: String,
    /// Patron PIN (zeroized on drop)
    pub password: Zeroizing<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Config {
    /// Build config from CLI args, falling back to the config file and a prompt
    pub fn from_args(args: Args) -> Result<Self, CliError> {
        let needs_file =
            args.catalog.is_none() || args.userid.is_none() || args.password.is_none();
        let file = if needs_file {
            load_file(
                &expand_tilde(&args.config),
                args.catalog.is_none() || args.userid.is_none(),
            )?
        } else {
            ConfigFile::default()
        };

        let catalog = args.catalog.or(file.catalog).ok_or_else(|| {
            CliError::Config(format!("no catalog URL given or in {}", args.config.display()))
        })?;
        let userid = args.userid.or(file.userid).ok_or_else(|| {
            CliError::Config(format!("no userid given or in {}", args.config.display()))
        })?;
        let password = match args.password.or(file.password) {
            Some(password) => Zeroizing::new(password),
            None => prompt_password(&userid)?,
        };

        Ok(Config {
            catalog,
            userid,
            password,
            timeout: args.timeout,
        })
    }
}

/// Read the config file; a missing file is only an error when `required`
fn load_file(path: &Path, required: bool) -> Result<ConfigFile, CliError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => Zeroizing::new(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            return Ok(ConfigFile::default());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CliError::Config(format!(
                "config file {} not found; pass --catalog and --userid or create it",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    log::debug!("Loaded config from {}", path.display());

    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str()
        && (path_str.starts_with("~/") || path_str == "~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path_str.trim_start_matches('~').trim_start_matches('/'));
    }
    path.to_path_buf()
}

/// Prompt for the patron PIN without echo
fn prompt_password(userid: &str) -> Result<Zeroizing<String>, CliError> {
    let pin = rpassword::prompt_password(format!("PIN for {}: ", userid))
        .map_err(|e| CliError::Config(format!("Failed to read PIN: {}", e)))?;
    if pin.is_empty() {
        return Err(CliError::Config("PIN is required.".to_string()));
    }
    Ok(Zeroizing::new(pin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(["sirsi"].iter().chain(extra).copied())
            .unwrap()
    }

    #[test]
    fn test_values_from_file() {
        let file = config_file(
            r#"{"catalog": "https://catalog.test/", "userid": "2112", "password": "1234"}"#,
        );
        let path = file.path().to_str().unwrap();

        let config = Config::from_args(args(&["--config", path])).unwrap();
        assert_eq!(config.catalog, "https://catalog.test/");
        assert_eq!(config.userid, "2112");
        assert_eq!(config.password.as_str(), "1234");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_flags_override_file() {
        let file = config_file(
            r#"{"catalog": "https://catalog.test/", "userid": "2112", "password": "1234"}"#,
        );
        let path = file.path().to_str().unwrap();

        let config = Config::from_args(args(&["--config", path, "--userid", "9999"])).unwrap();
        assert_eq!(config.catalog, "https://catalog.test/");
        assert_eq!(config.userid, "9999");
        assert_eq!(config.password.as_str(), "1234");
    }

    #[test]
    fn test_flags_alone_need_no_file() {
        let config = Config::from_args(args(&[
            "--config",
            "/nonexistent/sirsi.json",
            "--catalog",
            "https://catalog.test/",
            "--userid",
            "2112",
            "--password",
            "1234",
        ]))
        .unwrap();
        assert_eq!(config.userid, "2112");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::from_args(args(&["--config", "/nonexistent/sirsi.json"]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_json() {
        let file = config_file("{ not json");
        let path = file.path().to_str().unwrap();
        let result = Config::from_args(args(&["--config", path]));
        assert!(matches!(result, Err(CliError::Json { .. })));
    }

    #[test]
    fn test_missing_key() {
        let file = config_file(r#"{"userid": "2112", "password": "1234"}"#);
        let path = file.path().to_str().unwrap();
        let result = Config::from_args(args(&["--config", path]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/etc/sirsi.json");
        assert_eq!(expand_tilde(plain), plain.to_path_buf());
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/.sirsi.json")),
                home.join(".sirsi.json")
            );
        }
    }
}
