//! Persistence of the new profile.
//!
//! [`save_profile`] issues one [`CredentialStore::set`] call per value. The
//! calls are independent: a failure part-way leaves the earlier values in
//! place.

use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::session::SessionCredentials;

/// Keys that belong in the shared credentials file rather than the config file.
const CREDENTIAL_KEYS: [&str; 3] = ["aws_access_key_id", "aws_secret_access_key", "aws_session_token"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot run {}", program.to_string_lossy())]
    Spawn {
        program: OsString,
        #[source]
        source: io::Error,
    },
    #[error("setting {key} failed ({status}): {stderr}")]
    CommandFailed {
        key: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Sets a single key of a named profile.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore {
    fn set(&self, profile: &str, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Writes access key, secret key and session token, then the region, to `name`.
///
/// All four values are always written; an empty `region` is written as an
/// empty value and logged as a warning.
pub fn save_profile<S>(
    store: &S,
    name: &str,
    region: &str,
    credentials: &SessionCredentials,
) -> Result<(), StoreError>
where
    S: CredentialStore + ?Sized,
{
    let values = [
        ("aws_access_key_id", credentials.access_key_id.as_str()),
        ("aws_secret_access_key", credentials.secret_access_key.as_str()),
        ("aws_session_token", credentials.session_token.as_str()),
        ("region", region),
    ];
    if region.is_empty() {
        warn!("No region configured for the source profile, {name} gets an empty region");
    }

    let total = values.len();
    for (i, (key, value)) in values.into_iter().enumerate() {
        let shown = if key == "region" { value } else { "<VALUE>" };
        info!("Setting {} out of {total}: {key} = {shown} for profile {name}", i + 1);
        store.set(name, key, value)?;
    }
    Ok(())
}

/// Runs `aws configure set <key> <value> --profile <name>` for each value.
///
/// Arguments are passed directly to the process, no shell is involved.
pub struct AwsCliStore {
    program: OsString,
}

impl Default for AwsCliStore {
    fn default() -> Self {
        Self::with_program("aws")
    }
}

impl AwsCliStore {
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CredentialStore for AwsCliStore {
    fn set(&self, profile: &str, key: &str, value: &str) -> Result<(), StoreError> {
        debug!(
            "Running {} configure set {key} <VALUE> --profile {profile}",
            self.program.to_string_lossy()
        );
        let output = Command::new(&self.program)
            .args(["configure", "set", key, value, "--profile", profile])
            .output()
            .map_err(|source| StoreError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                key: key.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Edits the shared credentials and config files in place.
///
/// Credential keys go to `[<name>]` in the credentials file, everything else
/// to `[profile <name>]` (or `[default]`) in the config file, the same split
/// `aws configure set` makes. Only the lines of the target section are
/// touched; every other byte of the file is written back unchanged.
pub struct IniFileStore {
    credentials_path: PathBuf,
    config_path: PathBuf,
}

impl IniFileStore {
    pub fn new(credentials_path: PathBuf, config_path: PathBuf) -> Self {
        Self {
            credentials_path,
            config_path,
        }
    }

    fn target(&self, profile: &str, key: &str) -> (&Path, String) {
        if CREDENTIAL_KEYS.contains(&key) {
            (self.credentials_path.as_path(), profile.to_string())
        } else if profile == "default" {
            (self.config_path.as_path(), profile.to_string())
        } else {
            (self.config_path.as_path(), format!("profile {profile}"))
        }
    }
}

impl CredentialStore for IniFileStore {
    fn set(&self, profile: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let (path, section) = self.target(profile, key);
        debug!("Writing {key} to [{section}] in {}", path.display());

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir).map_err(|source| StoreError::Write {
                        path: path.to_path_buf(),
                        source,
                    })?;
                }
                String::new()
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        fs::write(path, set_key(&content, &section, key, value)).map_err(|source| {
            StoreError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

fn section_name(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

/// Key of a top-level `key = value` line. Indented lines belong to nested
/// settings such as `s3 =` and never match.
fn key_name(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) || line.starts_with(['#', ';']) {
        return None;
    }
    line.split_once('=').map(|(k, _)| k.trim())
}

/// Returns `content` with `key = value` set in `[section]`.
///
/// An existing top-level assignment of `key` in that section is replaced,
/// otherwise the line is added after the section's last non-blank line. A
/// missing section is appended at the end of the file.
fn set_key(content: &str, section: &str, key: &str, value: &str) -> String {
    let entry = format!("{key} = {value}\n");
    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

    let Some(header) = lines.iter().position(|l| section_name(l) == Some(section)) else {
        let mut out = content.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{section}]\n{entry}"));
        return out;
    };

    let end = lines[header + 1..]
        .iter()
        .position(|l| section_name(l).is_some())
        .map_or(lines.len(), |i| header + 1 + i);

    if let Some(i) = (header + 1..end).find(|&i| key_name(&lines[i]) == Some(key)) {
        lines[i] = entry;
    } else {
        let last = (header..end)
            .rev()
            .find(|&i| !lines[i].trim().is_empty())
            .unwrap_or(header);
        if !lines[last].ends_with('\n') {
            lines[last].push('\n');
        }
        lines.insert(last + 1, entry);
    }
    lines.concat()
}

#[cfg(test)]
mod tests {
    use configparser::ini::Ini;
    use mockall::{Sequence, predicate::eq};

    use super::*;

    fn credentials() -> SessionCredentials {
        SessionCredentials {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "secret/with+chars=".to_string(),
            session_token: "token==".to_string(),
            expiration: "2026-10-19T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn writes_four_values_in_order() {
        let mut store = MockCredentialStore::new();
        let mut seq = Sequence::new();
        for (key, value) in [
            ("aws_access_key_id", "ASIAEXAMPLE"),
            ("aws_secret_access_key", "secret/with+chars="),
            ("aws_session_token", "token=="),
            ("region", "eu-west-1"),
        ] {
            store
                .expect_set()
                .with(eq("named"), eq(key), eq(value))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _| Ok(()));
        }

        save_profile(&store, "named", "eu-west-1", &credentials()).unwrap();
    }

    #[test]
    fn empty_region_is_still_written() {
        let mut store = MockCredentialStore::new();
        store
            .expect_set()
            .withf(|_, key, _| key != "region")
            .times(3)
            .returning(|_, _, _| Ok(()));
        store
            .expect_set()
            .with(eq("named"), eq("region"), eq(""))
            .times(1)
            .returning(|_, _, _| Ok(()));

        save_profile(&store, "named", "", &credentials()).unwrap();
    }

    #[test]
    fn stops_at_first_failure() {
        let mut store = MockCredentialStore::new();
        store
            .expect_set()
            .with(eq("named"), eq("aws_access_key_id"), eq("ASIAEXAMPLE"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_set()
            .with(eq("named"), eq("aws_secret_access_key"), eq("secret/with+chars="))
            .times(1)
            .returning(|_, _, _| {
                Err(StoreError::Read {
                    path: PathBuf::from("credentials"),
                    source: io::Error::other("boom"),
                })
            });

        let err = save_profile(&store, "named", "eu-west-1", &credentials()).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[test]
    fn file_store_splits_credentials_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let credentials_path = dir.path().join("credentials");
        let config_path = dir.path().join("config");
        fs::write(&config_path, "[default]\nregion = us-east-1\n").unwrap();

        let store = IniFileStore::new(credentials_path.clone(), config_path.clone());
        save_profile(&store, "Named", "eu-west-1", &credentials()).unwrap();

        let mut creds = Ini::new_cs();
        creds.load(&credentials_path).unwrap();
        assert_eq!(creds.get("Named", "aws_access_key_id").as_deref(), Some("ASIAEXAMPLE"));
        assert_eq!(
            creds.get("Named", "aws_secret_access_key").as_deref(),
            Some("secret/with+chars=")
        );
        assert_eq!(creds.get("Named", "aws_session_token").as_deref(), Some("token=="));

        let config = fs::read_to_string(&config_path).unwrap();
        assert!(config.contains("[default]"));
        assert!(config.contains("[profile Named]"));
        assert!(config.contains("eu-west-1"));
        assert!(config.contains("us-east-1"));
    }

    const WORK_CONFIG: &str = "\
# my profiles
[default]
region = us-east-1

[profile work]
credential_process = /opt/bin/creds --id 12;34 # primary
s3 =
  max_concurrent_requests = 20
  addressing_style = path
";

    const WORK_CREDENTIALS: &str = "\
# my creds
[default]
aws_access_key_id = AKIAEXAMPLE
aws_secret_access_key = abc;def#ghi
";

    #[test]
    fn file_store_leaves_other_profiles_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let credentials_path = dir.path().join("credentials");
        let config_path = dir.path().join("config");
        fs::write(&credentials_path, WORK_CREDENTIALS).unwrap();
        fs::write(&config_path, WORK_CONFIG).unwrap();

        let store = IniFileStore::new(credentials_path.clone(), config_path.clone());
        save_profile(&store, "other", "us-east-1", &credentials()).unwrap();

        let config = fs::read_to_string(&config_path).unwrap();
        assert_eq!(
            config,
            format!("{WORK_CONFIG}\n[profile other]\nregion = us-east-1\n")
        );
        let creds = fs::read_to_string(&credentials_path).unwrap();
        assert!(creds.starts_with(WORK_CREDENTIALS), "{creds}");
        assert!(creds.ends_with(
            "[other]\naws_access_key_id = ASIAEXAMPLE\n\
             aws_secret_access_key = secret/with+chars=\n\
             aws_session_token = token==\n"
        ));
    }

    #[test]
    fn file_store_updates_only_top_level_key_of_target() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config");
        let existing = "[profile work]\nregion = eu-west-1\ns3 =\n  region = nested\n\n[profile other]\nregion = ap-south-1\n";
        fs::write(&config_path, existing).unwrap();

        let store = IniFileStore::new(dir.path().join("credentials"), config_path.clone());
        store.set("work", "region", "us-west-2").unwrap();

        assert_eq!(
            fs::read_to_string(&config_path).unwrap(),
            "[profile work]\nregion = us-west-2\ns3 =\n  region = nested\n\n[profile other]\nregion = ap-south-1\n"
        );
    }

    #[test]
    fn new_key_goes_before_blank_lines_of_section() {
        let content = "[default]\nregion = us-east-1\n\n[profile work]\nregion = eu-west-1";
        assert_eq!(
            set_key(content, "default", "output", "json"),
            "[default]\nregion = us-east-1\noutput = json\n\n[profile work]\nregion = eu-west-1"
        );
        assert_eq!(
            set_key(content, "profile work", "output", "json"),
            "[default]\nregion = us-east-1\n\n[profile work]\nregion = eu-west-1\noutput = json\n"
        );
    }

    #[test]
    fn file_store_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let credentials_path = dir.path().join("aws").join("credentials");
        let config_path = dir.path().join("aws").join("config");

        let store = IniFileStore::new(credentials_path.clone(), config_path.clone());
        store.set("default", "region", "ap-northeast-1").unwrap();

        let config = fs::read_to_string(&config_path).unwrap();
        assert!(config.contains("[default]"));
        assert!(config.contains("ap-northeast-1"));
        assert!(!credentials_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn cli_store_reports_exit_status() {
        assert!(AwsCliStore::with_program("true").set("named", "region", "eu-west-1").is_ok());

        let err = AwsCliStore::with_program("false")
            .set("named", "region", "eu-west-1")
            .unwrap_err();
        assert!(matches!(err, StoreError::CommandFailed { ref key, .. } if key == "region"));
    }

    #[test]
    fn cli_store_reports_missing_program() {
        let err = AwsCliStore::with_program("definitely-not-an-aws-cli")
            .set("named", "region", "eu-west-1")
            .unwrap_err();
        assert!(matches!(err, StoreError::Spawn { .. }));
    }
}
