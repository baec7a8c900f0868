#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for mailgate
//!
//! This crate owns the HTTP client and the remote verification call. The
//! [`Verifier`] trait is the seam the verification loop depends on; the
//! [`TombaVerifier`] is the production implementation.

mod client;
mod verifier;

pub use client::{NetClient, NetConfig};
pub use verifier::{payload_status, TombaVerifier, Verifier};

use mailgate_config::{Config, Credentials};
use mailgate_errors::Error;

/// Build the production verifier from merged configuration
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created or the configured
/// base URL is invalid.
pub fn verifier_from_config(
    config: &Config,
    credentials: &Credentials,
) -> Result<TombaVerifier, Error> {
    let client = NetClient::new(&NetConfig::from_config(config))?;
    TombaVerifier::new(client, &config.api.base_url, credentials)
}
