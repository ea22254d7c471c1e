//! Error types surfaced by the decoder, the fetcher and the device adapter.

use thiserror::Error;

use crate::models::Field;

/// A report was fetched but could not be turned into a [`crate::Reading`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("required field {0} not found")]
    MissingField(Field),
}

/// The station could not be read.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not use specified URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("could not read data from Cloudwatcher: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Cloudwatcher answered with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("could not read response body: {0}")]
    Body(#[source] reqwest::Error),
    /// Failure reported by a non-HTTP report source.
    #[error("{0}")]
    Other(String),
}

/// Failure of a device lifecycle hook.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("you must set the address first")]
    MissingAddress,
    #[error("data not read yet")]
    NotInitialized,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("could not decode values from device: {0}")]
    Decode(#[from] DecodeError),
    #[error("could not save configuration: {0:#}")]
    Config(anyhow::Error),
}
