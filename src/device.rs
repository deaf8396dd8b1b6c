//! MFA device discovery for when no device is given on the command line.

use async_trait::async_trait;
use log::debug;

use crate::error::{BoxError, Error};

/// An MFA device registered to the calling IAM user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaDevice {
    /// Serial number of a hardware device or ARN of a virtual one.
    pub serial_number: String,
}

impl MfaDevice {
    /// Creates a device from its serial number or ARN.
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
        }
    }
}

/// Lists the MFA devices of the current user, in service response order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListMfaDevices {
    async fn list_devices(&self) -> Result<Vec<MfaDevice>, BoxError>;
}

#[async_trait]
impl ListMfaDevices for aws_sdk_iam::Client {
    async fn list_devices(&self) -> Result<Vec<MfaDevice>, BoxError> {
        let output = self.list_mfa_devices().send().await?;
        Ok(output
            .mfa_devices()
            .iter()
            .map(|d| MfaDevice::new(d.serial_number()))
            .collect())
    }
}

/// Returns the serial number of the first listed device.
///
/// Multiple devices are not disambiguated; the service's order decides.
/// The listing is requested exactly once.
///
/// # Returns
/// * `Ok(String)` - Serial number or ARN of the first device
///
/// # Errors
/// * [`Error::CannotListDevices`] - the listing call failed; the cause is kept as the source
/// * [`Error::NoDevicesAssociated`] - the user has no MFA devices
pub async fn first_device<A>(api: &A) -> Result<String, Error>
where
    A: ListMfaDevices + ?Sized,
{
    let devices = api.list_devices().await.map_err(Error::CannotListDevices)?;
    debug!("ListMFADevices returned {} device(s)", devices.len());

    devices
        .into_iter()
        .next()
        .map(|d| d.serial_number)
        .ok_or(Error::NoDevicesAssociated)
}
