//! Weather-safety driver for AAG CloudWatcher compatible stations.
//!
//! The station serves a plain-text `key=value` report over HTTP. This crate
//! fetches it ([`fetcher`]), decodes it into a validated [`Reading`]
//! ([`decoder`]) and republishes the values as weather parameters through a
//! host framework ([`device`], [`host`]). [`registry`] and [`routes`] provide a
//! small in-process host so the driver can run as its own service.

pub mod config;
pub mod decoder;
pub mod device;
pub mod error;
pub mod fetcher;
pub mod host;
pub mod models;
pub mod registry;
pub mod routes;

pub use config::Config;
pub use decoder::decode;
pub use device::CloudwatcherSolo;
pub use error::{DecodeError, DriverError, TransportError};
pub use fetcher::{HttpFetcher, ReportSource};
pub use host::{ParameterSpec, PropertyState, RawElement, RawGroup, RawValue, WeatherHost};
pub use models::{Field, Reading, SwitchState};
pub use registry::{ParameterRegistry, WeatherStatus};
