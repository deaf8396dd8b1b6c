//! Resolution of run parameters from flags and environment-derived defaults.

use std::{env, path::PathBuf};

use anyhow::{Context, Result};

use crate::cli::Args;

/// Profile used when neither `--profile` nor `AWS_PROFILE` is set.
pub const DEFAULT_PROFILE: &str = "default";

/// Appended to the source profile name to derive the destination profile name.
pub const DEFAULT_NAME_SUFFIX: &str = "_mfa";

/// Parameters for a single run. Built once, validated once, then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Source profile holding the long-term credentials.
    pub profile: String,
    /// Destination profile receiving the session credentials.
    pub name: String,
    /// One-time MFA code.
    pub code: String,
    /// MFA device serial number or ARN; empty until resolved.
    pub device: String,
    /// Region of the source profile, filled in after the AWS config is loaded.
    pub region: String,
}

/// Defaults taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `AWS_PROFILE`
    pub profile: Option<String>,
    /// `AWS_CONFIG_FILE`
    pub config_file: Option<PathBuf>,
    /// `AWS_SHARED_CREDENTIALS_FILE`
    pub credentials_file: Option<PathBuf>,
}

impl Environment {
    /// Reads the defaults from the process environment. Empty variables count as unset.
    pub fn from_env() -> Self {
        Self {
            profile: non_empty_var("AWS_PROFILE"),
            config_file: non_empty_var("AWS_CONFIG_FILE").map(PathBuf::from),
            credentials_file: non_empty_var("AWS_SHARED_CREDENTIALS_FILE").map(PathBuf::from),
        }
    }

    /// Path of the shared config file: `AWS_CONFIG_FILE` or `~/.aws/config`.
    pub fn shared_config_path(&self) -> Result<PathBuf> {
        self.config_file
            .clone()
            .or_else(|| dirs::home_dir().map(|d| d.join(".aws").join("config")))
            .context("Could not determine home directory")
    }

    /// Path of the shared credentials file: `AWS_SHARED_CREDENTIALS_FILE` or `~/.aws/credentials`.
    pub fn shared_credentials_path(&self) -> Result<PathBuf> {
        self.credentials_file
            .clone()
            .or_else(|| dirs::home_dir().map(|d| d.join(".aws").join("credentials")))
            .context("Could not determine home directory")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Options {
    /// Applies defaults to the explicit flags without validating anything.
    ///
    /// `profile` falls back to `AWS_PROFILE`, then to `default`; `name` falls
    /// back to `<profile>_mfa`. `device` and `code` are taken as given, empty
    /// when absent. `region` is left empty.
    pub fn resolve(args: &Args, env: &Environment) -> Self {
        let profile = non_empty(&args.profile)
            .or(env.profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE)
            .to_string();
        let name = non_empty(&args.name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{profile}{DEFAULT_NAME_SUFFIX}"));

        Self {
            profile,
            name,
            code: args.code.clone().unwrap_or_default(),
            device: args.device.clone().unwrap_or_default(),
            region: String::new(),
        }
    }
}
