//! Device adapter bridging the station to the host framework.
//!
//! `CloudwatcherSolo` owns the last decoded [`Reading`] and drives one
//! fetch → decode → publish cycle per call. It registers its weather
//! parameters once, from the content of the first successful read, and
//! afterwards only updates values. Everything client-visible goes through the
//! [`WeatherHost`] it was built with.

use tracing::{debug, error, info};

use crate::decoder::decode;
use crate::error::DriverError;
use crate::fetcher::ReportSource;
use crate::host::{ParameterSpec, PropertyState, RawElement, RawGroup, RawValue, WeatherHost};
use crate::models::Reading;

// ---

pub const DEFAULT_NAME: &str = "Cloudwatcher Solo";
pub const DRIVER_VERSION: (u16, u16) = (0, 1);

pub const ADDRESS_PROPERTY: &str = "CWS_ADDRESS";
/// Config key of the persisted station URL.
pub const ADDRESS_KEY: &str = "CWS_ADDRESS.ADDRESS";

pub const RAW_STRING: &str = "RAW_STRING";
pub const RAW_FLOAT: &str = "RAW_FLOAT";

/// A weather parameter and where its value comes from.
struct WeatherParameter {
    spec: ParameterSpec,
    /// Critical parameters decide the overall safe/unsafe verdict.
    critical: bool,
    value: fn(&Reading) -> Option<f64>,
}

const fn parameter(
    name: &'static str,
    label: &'static str,
    min_ok: f64,
    max_ok: f64,
    warn_percent: f64,
    critical: bool,
    value: fn(&Reading) -> Option<f64>,
) -> WeatherParameter {
    WeatherParameter {
        spec: ParameterSpec {
            name,
            label,
            min_ok,
            max_ok,
            warn_percent,
        },
        critical,
        value,
    }
}

/// Registration order. Mandatory readings always yield a value, so their
/// parameters are always registered.
static PARAMETERS: [WeatherParameter; 12] = [
    parameter("WEATHER_SAFE", "Safe", 1.0, 1.0, 0.0, true, |r| Some(r.safe_value())),
    parameter("WEATHER_SWITCH", "Switch", 1.0, 1.0, 0.0, false, |r| Some(r.switch.as_f64())),
    parameter("WEATHER_SKYTEMP", "Sky Temperature [°C]", -100.0, -20.0, 10.0, true, |r| {
        Some(r.clouds)
    }),
    parameter("WEATHER_TEMP", "Temperature [°C]", -30.0, 50.0, 10.0, false, |r| Some(r.temp)),
    parameter(
        "WEATHER_SKY_QUALITY",
        "Sky Brightness [mag/arcsec^2]",
        15.0,
        23.0,
        10.0,
        false,
        |r| Some(r.lightmpsas),
    ),
    parameter("WEATHER_WIND", "Wind [km/h]", 0.0, 40.0, 10.0, true, |r| r.wind),
    parameter("WEATHER_GUST", "Gust [km/h]", 0.0, 40.0, 10.0, true, |r| r.gust),
    parameter("WEATHER_RAIN", "Rain [a.u.]", 2900.0, 3200.0, 10.0, true, |r| r.rain),
    parameter("WEATHER_HUMIDITY", "Humidity [%]", 0.0, 100.0, 0.0, false, |r| r.hum),
    parameter("WEATHER_DEWPOINT", "Dewpoint [°C]", -30.0, 50.0, 0.0, false, |r| r.dewp),
    parameter(
        "WEATHER_ABSPRESS",
        "Absolute Pressure [mbar]",
        500.0,
        1500.0,
        0.0,
        false,
        |r| r.abspress,
    ),
    parameter(
        "WEATHER_RELPRESS",
        "Relative Pressure [mbar]",
        500.0,
        1500.0,
        0.0,
        false,
        |r| r.relpress,
    ),
];

/// Driver for one CloudWatcher station.
pub struct CloudwatcherSolo<S, H> {
    source: S,
    host: H,
    address: String,
    last_reading: Option<Reading>,
    registered: Vec<&'static str>,
    initialized: bool,
    connected: bool,
}

impl<S: ReportSource, H: WeatherHost> CloudwatcherSolo<S, H> {
    pub fn new(source: S, host: H) -> Self {
        // ---
        Self {
            source,
            host,
            address: String::new(),
            last_reading: None,
            registered: Vec::new(),
            initialized: false,
            connected: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Last successfully decoded reading, possibly stale.
    pub fn last_reading(&self) -> Option<&Reading> {
        self.last_reading.as_ref()
    }

    /// Names of the weather parameters registered during initialization.
    pub fn registered_parameters(&self) -> &[&'static str] {
        &self.registered
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Load the persisted address, read the station once and register the
    /// weather parameters its report supports.
    ///
    /// Any failure here is fatal: which parameters exist depends on this
    /// first read.
    pub async fn initialize(&mut self) -> Result<(), DriverError> {
        // ---
        if let Some(address) = self.host.load_config(ADDRESS_KEY) {
            self.address = address;
        }
        self.host
            .define_text_property(ADDRESS_PROPERTY, &self.address, PropertyState::Idle);

        self.update_raw().await?;
        let Some(reading) = self.last_reading.as_ref() else {
            error!("Data not read yet!");
            return Err(DriverError::NotInitialized);
        };

        self.registered.clear();
        for p in PARAMETERS.iter().filter(|p| (p.value)(reading).is_some()) {
            self.host.add_parameter(p.spec.clone());
            self.registered.push(p.spec.name);
        }
        for p in PARAMETERS.iter().filter(|p| p.critical) {
            if self.registered.contains(&p.spec.name) {
                self.host.set_critical_parameter(p.spec.name);
            }
        }

        info!(
            "Registered {} weather parameters: {}",
            self.registered.len(),
            self.registered.join(", ")
        );
        self.initialized = true;
        Ok(())
    }

    /// Connect to the station: requires an address and one successful cycle.
    pub async fn connect(&mut self) -> Result<(), DriverError> {
        // ---
        if self.address.trim().is_empty() {
            error!("You must set the address first!");
            self.disconnect();
            return Err(DriverError::MissingAddress);
        }
        if !self.initialized {
            error!("Data not read yet!");
            return Err(DriverError::NotInitialized);
        }

        self.connected = true;
        self.update_properties();

        if let Err(e) = self.poll().await {
            self.disconnect();
            return Err(e);
        }

        info!("Connected to {} at {}", DEFAULT_NAME, self.address);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        // ---
        if self.connected {
            info!("Disconnected from {}", DEFAULT_NAME);
        }
        self.connected = false;
        self.update_properties();
    }

    /// Define the raw groups while connected, remove them otherwise.
    pub fn update_properties(&mut self) {
        // ---
        if self.connected {
            let reading = self.last_reading.as_ref();
            self.host.define_group(RawGroup {
                name: RAW_STRING,
                label: "Raw",
                elements: raw_text_elements(reading),
            });
            self.host.define_group(RawGroup {
                name: RAW_FLOAT,
                label: "Raw",
                elements: raw_number_elements(reading),
            });
        } else {
            self.host.delete_group(RAW_STRING);
            self.host.delete_group(RAW_FLOAT);
        }
    }

    /// Change the station URL and persist it.
    pub fn set_address(&mut self, address: &str) -> Result<(), DriverError> {
        // ---
        self.address = address.to_string();
        self.host
            .define_text_property(ADDRESS_PROPERTY, address, PropertyState::Ok);
        self.host
            .save_config(ADDRESS_KEY, address)
            .map_err(DriverError::Config)?;

        info!("Cloudwatcher address set to {}", address);
        Ok(())
    }

    /// One poll cycle as requested by the host timer.
    ///
    /// On failure the raw groups are alerted and the previously published
    /// parameter values stay untouched.
    pub async fn update_weather(&mut self) -> PropertyState {
        // ---
        match self.poll().await {
            Ok(()) => PropertyState::Ok,
            Err(_) => PropertyState::Alert,
        }
    }

    async fn poll(&mut self) -> Result<(), DriverError> {
        // ---
        self.update_raw().await?;
        let Some(reading) = self.last_reading.as_ref() else {
            return Err(DriverError::NotInitialized);
        };

        for p in PARAMETERS.iter() {
            if !self.registered.contains(&p.spec.name) {
                continue;
            }
            if let Some(v) = (p.value)(reading) {
                self.host.set_parameter_value(p.spec.name, v);
            }
        }
        Ok(())
    }

    /// Fetch and decode a report, mirroring the result into the raw groups.
    async fn update_raw(&mut self) -> Result<(), DriverError> {
        // ---
        self.host.set_group_state(RAW_STRING, PropertyState::Busy);
        self.host.set_group_state(RAW_FLOAT, PropertyState::Busy);

        let reading = match self.read_raw().await {
            Ok(reading) => reading,
            Err(e) => {
                error!("{}", e);
                self.host.set_group_state(RAW_STRING, PropertyState::Alert);
                self.host.set_group_state(RAW_FLOAT, PropertyState::Alert);
                return Err(e);
            }
        };

        debug!("Decoded reading: {:?}", reading);

        self.host.publish_group(
            RAW_STRING,
            PropertyState::Ok,
            raw_text_elements(Some(&reading)),
        );
        self.host.publish_group(
            RAW_FLOAT,
            PropertyState::Ok,
            raw_number_elements(Some(&reading)),
        );
        self.last_reading = Some(reading);
        Ok(())
    }

    async fn read_raw(&self) -> Result<Reading, DriverError> {
        // ---
        if self.address.trim().is_empty() {
            return Err(DriverError::MissingAddress);
        }
        let body = self.source.fetch(&self.address).await?;
        Ok(decode(&body)?)
    }
}

fn raw_text_elements(reading: Option<&Reading>) -> Vec<RawElement> {
    // ---
    let (date, cwinfo) = match reading {
        Some(r) => (r.date.clone(), r.cwinfo.clone()),
        None => ("n/a".to_string(), "n/a".to_string()),
    };

    vec![
        RawElement {
            name: "RAW_DATE",
            label: "dataGMTTime",
            value: RawValue::Text(date),
        },
        RawElement {
            name: "RAW_CWINFO",
            label: "cwinfo",
            value: RawValue::Text(cwinfo),
        },
    ]
}

fn raw_number_elements(reading: Option<&Reading>) -> Vec<RawElement> {
    // ---
    let fields: [(&'static str, &'static str, fn(&Reading) -> Option<f64>); 13] = [
        ("RAW_CLOUDS", "clouds", |r| Some(r.clouds)),
        ("RAW_TEMP", "temp", |r| Some(r.temp)),
        ("RAW_WIND", "wind", |r| r.wind),
        ("RAW_GUST", "gust", |r| r.gust),
        ("RAW_RAIN", "rain", |r| r.rain),
        ("RAW_LIGHTMPSAS", "lightmpsas", |r| Some(r.lightmpsas)),
        ("RAW_SWITCH", "switch", |r| Some(r.switch.as_f64())),
        ("RAW_SAFE", "safe", |r| Some(r.safe_value())),
        ("RAW_HUM", "hum", |r| r.hum),
        ("RAW_DEWP", "dewp", |r| r.dewp),
        ("RAW_IR", "ir", |r| r.rawir),
        ("RAW_ABSPRESS", "abspress", |r| r.abspress),
        ("RAW_RELPRESS", "relpress", |r| r.relpress),
    ];

    fields
        .into_iter()
        .map(|(name, label, f)| RawElement {
            name,
            label,
            value: RawValue::Number(reading.and_then(f)),
        })
        .collect()
}
