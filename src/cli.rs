//! Command-line interface definitions.

use std::ffi::OsString;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Long flags that are also accepted with a single dash, e.g. `-profile work`.
const SINGLE_DASH_FLAGS: [&str; 8] = [
    "profile", "name", "code", "device", "duration", "store", "debug", "quiet",
];

/// AWS MFA profile creator.
///
/// Requests temporary session credentials with an MFA code and saves them
/// as a new named AWS CLI profile.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Name of the AWS CLI profile to authenticate [default: $AWS_PROFILE or "default"]
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Name of the resulting AWS CLI profile [default: <profile>_mfa]
    #[arg(short, long)]
    pub name: Option<String>,

    /// The value provided by the MFA device. Prompted for when omitted
    #[arg(short, long)]
    pub code: Option<String>,

    /// Serial number of a hardware device or ARN of a virtual device
    /// [default: the first device returned by ListMFADevices]
    #[arg(short, long)]
    pub device: Option<String>,

    /// Session duration in seconds (900-129600) [default: AWS STS default]
    #[arg(long, env = "AWS_SESSION_DURATION", value_parser = clap::value_parser!(i32).range(900..=129600))]
    pub duration: Option<i32>,

    /// How the new profile is written
    #[arg(long, value_enum, default_value_t = StoreKind::AwsCli)]
    pub store: StoreKind,

    /// Enable debug messages, overrides --quiet
    #[arg(long)]
    pub debug: bool,

    /// Suppress everything but warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Backend used to persist the new profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Run `aws configure set` for each value
    AwsCli,
    /// Edit the shared credentials and config files directly
    File,
}

impl Args {
    /// Parses the process arguments, accepting `-flag` as well as `--flag`.
    pub fn parse_args() -> Self {
        Self::parse_from(single_dash_to_long(std::env::args_os()))
    }

    /// Log level derived from `--debug` and `--quiet`.
    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}

/// Rewrites `-profile`, `-code=123456` and the like into their `--` form.
///
/// Short flags (`-p`) and anything after `--` are passed through unchanged.
pub fn single_dash_to_long<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            let Some(flag) = arg.to_str().and_then(|a| a.strip_prefix('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if SINGLE_DASH_FLAGS.contains(&name) {
                OsString::from(format!("-{flag}"))
            } else {
                arg
            }
        })
        .collect()
}
