//! Creates a temporary, MFA-authenticated AWS CLI profile from an existing
//! long-lived IAM profile.
//!
//! The one-time MFA code is exchanged for session credentials with STS
//! `GetSessionToken`, and the result is saved as a new named profile (by
//! default `<profile>_mfa`). Profile names, device identifiers and codes are
//! validated before they are passed on to any external command, and the
//! source profile must exist in the shared config file.

pub mod app;
pub mod cli;
pub mod device;
pub mod error;
pub mod options;
pub mod session;
pub mod store;
pub mod validate;
