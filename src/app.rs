//! Run orchestration.
//!
//! A run is a straight pipeline and any failure ends it:
//! 1. Resolve profile and destination name from flags and environment
//! 2. Prompt for the MFA code when it was not given
//! 3. Validate the options against the shared config file
//! 4. Load the source profile's AWS configuration and region
//! 5. Pick the first MFA device when none was given
//! 6. Request session credentials from STS
//! 7. Write them to the destination profile

use std::io::Write;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use log::{debug, info};

use crate::{
    cli::{Args, StoreKind},
    device::{ListMfaDevices, first_device},
    options::{Environment, Options},
    session::{RequestSessionToken, SessionCredentials},
    store::{AwsCliStore, CredentialStore, IniFileStore, save_profile},
    validate::validate,
};

/// Creates the MFA profile described by `args`.
///
/// # Arguments
/// * `args` - Parsed command-line flags
/// * `env` - Defaults taken from the environment (`AWS_PROFILE`, `AWS_CONFIG_FILE`, ...)
///
/// # Returns
/// * `Ok(())` - The destination profile has been written
/// * `Err(anyhow::Error)` - The first failure of any stage; the run stops there
///
/// # Errors
/// This function will return an error if:
/// * The MFA code cannot be read from the prompt
/// * The home directory cannot be determined
/// * Validation fails (see [`validate`](crate::validate::validate))
/// * No MFA device can be found (see [`first_device`](crate::device::first_device))
/// * STS rejects the session token request
/// * Any of the profile writes fails; earlier writes are not rolled back
pub async fn run(args: Args, env: Environment) -> Result<()> {
    let mut opt = Options::resolve(&args, &env);
    debug!("Using profile name {:?}", opt.profile);

    if opt.code.is_empty() {
        opt.code = prompt_code()?;
    }

    let config_file = env.shared_config_path()?;
    debug!("Using shared config file {}", config_file.display());
    debug!("Args: {opt:?}");

    validate(&opt, &config_file)?;

    let config = aws_config::defaults(BehaviorVersion::latest())
        .profile_name(&opt.profile)
        .load()
        .await;
    opt.region = config.region().map(ToString::to_string).unwrap_or_default();
    debug!("Detected region: {}", opt.region);

    let store: Box<dyn CredentialStore> = match args.store {
        StoreKind::AwsCli => Box::new(AwsCliStore::default()),
        StoreKind::File => Box::new(IniFileStore::new(
            env.shared_credentials_path()?,
            config_file,
        )),
    };

    let credentials = provision(
        &mut opt,
        &aws_sdk_iam::Client::new(&config),
        &aws_sdk_sts::Client::new(&config),
        store.as_ref(),
        args.duration,
    )
    .await?;

    info!("Success! Credentials expire at: {}", credentials.expiration);
    info!("{}", usage_message(&opt.name));
    Ok(())
}

/// Resolves the device if needed, then requests and saves session credentials.
///
/// Nothing is written unless both the device lookup and the token request succeed.
async fn provision<D, T, S>(
    opt: &mut Options,
    devices: &D,
    tokens: &T,
    store: &S,
    duration: Option<i32>,
) -> Result<SessionCredentials>
where
    D: ListMfaDevices + ?Sized,
    T: RequestSessionToken + ?Sized,
    S: CredentialStore + ?Sized,
{
    if opt.device.is_empty() {
        info!("No MFA device serial number provided, getting one from ListMFADevices");
        opt.device = first_device(devices).await?;
    }
    debug!("Using MFA device {}", opt.device);

    info!("Getting temporary credentials");
    let credentials = tokens
        .session_token(&opt.device, &opt.code, duration)
        .await
        .context("cannot get session token")?;

    info!("Saving new profile");
    save_profile(store, &opt.name, &opt.region, &credentials)
        .with_context(|| format!("cannot save profile {}", opt.name))?;

    Ok(credentials)
}

fn prompt_code() -> Result<String> {
    print!("Enter MFA code: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn usage_message(name: &str) -> String {
    format!(
        r#"
The named profile "{name}" has been configured.
To use it set an environment variable like this.

For Linux and macOS:
	export AWS_PROFILE={name}
For Windows:
	setx AWS_PROFILE {name}

Or use --profile argument with AWS CLI.
"#
    )
}
