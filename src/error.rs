//! Error taxonomy for parameter validation and MFA device discovery.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Boxed error returned by external capabilities (AWS SDK calls and friends).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised before any credentials are requested or written.
///
/// Every variant is fatal for the run. Variants that wrap a lower-level
/// failure expose it through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("code must be exactly 6 digits")]
    InvalidCode,

    #[error("device serial number is not valid")]
    InvalidDevice,

    #[error("profile name must be alphanumeric (underscores and hyphens allowed)")]
    InvalidProfileName,

    #[error("cannot access shared config {}", path.display())]
    SharedConfigUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config file")]
    CannotParseConfig(#[source] regex::Error),

    #[error("profile does not exist")]
    ProfileDoesNotExist,

    #[error("there are no MFA devices associated with this user")]
    NoDevicesAssociated,

    #[error("cannot list MFA devices")]
    CannotListDevices(#[source] BoxError),
}

/// Cause-free discriminant of [`Error`], for matching on the kind of failure only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCode,
    InvalidDevice,
    InvalidProfileName,
    SharedConfigUnavailable,
    CannotParseConfig,
    ProfileDoesNotExist,
    NoDevicesAssociated,
    CannotListDevices,
}

impl Error {
    /// Kind of this error without its cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCode => ErrorKind::InvalidCode,
            Self::InvalidDevice => ErrorKind::InvalidDevice,
            Self::InvalidProfileName => ErrorKind::InvalidProfileName,
            Self::SharedConfigUnavailable { .. } => ErrorKind::SharedConfigUnavailable,
            Self::CannotParseConfig(_) => ErrorKind::CannotParseConfig,
            Self::ProfileDoesNotExist => ErrorKind::ProfileDoesNotExist,
            Self::NoDevicesAssociated => ErrorKind::NoDevicesAssociated,
            Self::CannotListDevices(_) => ErrorKind::CannotListDevices,
        }
    }

    /// Returns `true` when `self` is of the given kind, ignoring any wrapped cause.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}
