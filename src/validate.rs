//! Validation of resolved options against the shared config file.
//!
//! Profile names, device identifiers and codes end up as arguments of
//! external commands, so they are restricted to small ASCII character sets
//! before anything else happens.

use std::{fs, path::Path, sync::LazyLock};

use log::debug;
use regex::{Regex, bytes};

use crate::{error::Error, options::Options};

static MFA_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{6}$").unwrap());

static MFA_DEVICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)^[\w+=/:,.@-]{9,256}$").unwrap());

static PROFILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)^[\w-]+$").unwrap());

/// Checks `opt` and confirms that `opt.profile` has a section in `config_file`.
///
/// Checks run in a fixed order and stop at the first failure: code, device
/// (only when set), destination name, source profile, then the config file.
///
/// # Arguments
/// * `opt` - Resolved options; `region` is not looked at
/// * `config_file` - Path of the shared config file, read once
///
/// # Errors
/// * [`Error::InvalidCode`] - `code` is not exactly six ASCII digits
/// * [`Error::InvalidDevice`] - `device` is set but not 9-256 characters of `[\w+=/:,.@-]`
/// * [`Error::InvalidProfileName`] - `name` or `profile` is not `[\w-]+`
/// * [`Error::SharedConfigUnavailable`] - `config_file` cannot be read
/// * [`Error::CannotParseConfig`] - the section pattern does not compile
/// * [`Error::ProfileDoesNotExist`] - neither `[profile <profile>]` nor `[<profile>]` is present
pub fn validate(opt: &Options, config_file: &Path) -> Result<(), Error> {
    if !MFA_CODE.is_match(&opt.code) {
        return Err(Error::InvalidCode);
    }

    if !opt.device.is_empty() && !MFA_DEVICE.is_match(&opt.device) {
        return Err(Error::InvalidDevice);
    }

    if !PROFILE_NAME.is_match(&opt.name) || !PROFILE_NAME.is_match(&opt.profile) {
        return Err(Error::InvalidProfileName);
    }

    let content = fs::read(config_file).map_err(|source| Error::SharedConfigUnavailable {
        path: config_file.to_path_buf(),
        source,
    })?;

    if !profile_section(&opt.profile)?.is_match(&content) {
        return Err(Error::ProfileDoesNotExist);
    }
    debug!("Found profile {:?} in {}", opt.profile, config_file.display());

    Ok(())
}

/// Matches `[<profile>]` as well as `[profile <profile>]`; only `[default]`
/// is written without the `profile` keyword by the AWS CLI.
fn profile_section(profile: &str) -> Result<bytes::Regex, Error> {
    bytes::Regex::new(&format!(r"\[(profile )?{}\]", regex::escape(profile)))
        .map_err(Error::CannotParseConfig)
}
