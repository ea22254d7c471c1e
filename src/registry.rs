//! In-process host for running the driver as a standalone service.
//!
//! Keeps registered parameters, raw groups and text properties in memory,
//! derives each parameter's state from its OK range and reports the overall
//! safety verdict from the critical parameters. Persisted settings live in a
//! small JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::host::{ParameterSpec, PropertyState, RawElement, RawGroup, WeatherHost};

// ---

/// A registered parameter with its latest value.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    #[serde(flatten)]
    pub spec: ParameterSpec,
    pub critical: bool,
    pub value: Option<f64>,
    pub state: PropertyState,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupStatus {
    #[serde(flatten)]
    pub group: RawGroup,
    pub state: PropertyState,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextProperty {
    pub name: &'static str,
    pub value: String,
    pub state: PropertyState,
}

/// Serializable copy of everything the registry publishes.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherStatus {
    pub device: String,
    /// Worst state among critical parameters.
    pub state: PropertyState,
    pub updated_at: Option<DateTime<Utc>>,
    pub parameters: Vec<Parameter>,
    pub groups: Vec<GroupStatus>,
    pub properties: Vec<TextProperty>,
}

impl WeatherStatus {
    /// Status before the driver has published anything.
    pub fn empty(device: &str) -> Self {
        Self {
            device: device.to_string(),
            state: PropertyState::Idle,
            updated_at: None,
            parameters: Vec::new(),
            groups: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// Map a value onto its state within `spec`'s OK range.
///
/// Outside `[min_ok, max_ok]` is an alert; inside the warning band at either
/// edge is busy (warning).
pub fn parameter_state(spec: &ParameterSpec, value: f64) -> PropertyState {
    // ---
    if value.is_nan() || value < spec.min_ok || value > spec.max_ok {
        return PropertyState::Alert;
    }
    if spec.warn_percent > 0.0 {
        let band = (spec.max_ok - spec.min_ok) * spec.warn_percent / 100.0;
        if value < spec.min_ok + band || value > spec.max_ok - band {
            return PropertyState::Busy;
        }
    }
    PropertyState::Ok
}

#[derive(Debug)]
pub struct ParameterRegistry {
    device: String,
    config_path: Option<PathBuf>,
    config: BTreeMap<String, String>,
    parameters: Vec<Parameter>,
    groups: Vec<GroupStatus>,
    properties: Vec<TextProperty>,
    updated_at: Option<DateTime<Utc>>,
}

impl ParameterRegistry {
    /// Registry without persistence; `save_config` only updates memory.
    pub fn in_memory(device: &str) -> Self {
        // ---
        Self {
            device: device.to_string(),
            config_path: None,
            config: BTreeMap::new(),
            parameters: Vec::new(),
            groups: Vec::new(),
            properties: Vec::new(),
            updated_at: None,
        }
    }

    /// Registry backed by a JSON config file. A missing file is an empty
    /// config; an unreadable or malformed one is an error.
    pub fn with_config_file(device: &str, path: impl AsRef<Path>) -> Result<Self> {
        // ---
        let path = path.as_ref();
        let config: BTreeMap<String, String> = if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config file: {}", path.display()))?
        } else {
            debug!("Config file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            config_path: Some(path.to_path_buf()),
            config,
            ..Self::in_memory(device)
        })
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.spec.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&GroupStatus> {
        self.groups.iter().find(|g| g.group.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&TextProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Overall verdict: worst state of the critical parameters that have a
    /// value, `Idle` when none do.
    pub fn overall_state(&self) -> PropertyState {
        // ---
        self.parameters
            .iter()
            .filter(|p| p.critical && p.value.is_some())
            .map(|p| p.state)
            .max()
            .unwrap_or(PropertyState::Idle)
    }

    pub fn status(&self) -> WeatherStatus {
        // ---
        WeatherStatus {
            device: self.device.clone(),
            state: self.overall_state(),
            updated_at: self.updated_at,
            parameters: self.parameters.clone(),
            groups: self.groups.clone(),
            properties: self.properties.clone(),
        }
    }

    fn write_config(&self) -> Result<()> {
        // ---
        let Some(path) = &self.config_path else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&self.config)?;
        fs::write(path, text)
            .with_context(|| format!("failed to write config file: {}", path.display()))
    }
}

impl WeatherHost for ParameterRegistry {
    fn load_config(&self, key: &str) -> Option<String> {
        self.config.get(key).cloned()
    }

    fn save_config(&mut self, key: &str, value: &str) -> Result<()> {
        // ---
        self.config.insert(key.to_string(), value.to_string());
        self.write_config()
    }

    fn define_text_property(&mut self, name: &'static str, value: &str, state: PropertyState) {
        // ---
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.value = value.to_string();
                p.state = state;
            }
            None => self.properties.push(TextProperty {
                name,
                value: value.to_string(),
                state,
            }),
        }
    }

    fn define_group(&mut self, group: RawGroup) {
        // ---
        self.groups.retain(|g| g.group.name != group.name);
        self.groups.push(GroupStatus {
            group,
            state: PropertyState::Idle,
        });
    }

    fn delete_group(&mut self, name: &str) {
        self.groups.retain(|g| g.group.name != name);
    }

    fn publish_group(&mut self, name: &str, state: PropertyState, elements: Vec<RawElement>) {
        // ---
        match self.groups.iter_mut().find(|g| g.group.name == name) {
            Some(g) => {
                g.group.elements = elements;
                g.state = state;
                self.updated_at = Some(Utc::now());
            }
            None => debug!("Group {} not defined, update dropped", name),
        }
    }

    fn set_group_state(&mut self, name: &str, state: PropertyState) {
        // ---
        if let Some(g) = self.groups.iter_mut().find(|g| g.group.name == name) {
            g.state = state;
        }
    }

    fn add_parameter(&mut self, spec: ParameterSpec) {
        // ---
        if self.parameter(spec.name).is_some() {
            warn!("Parameter {} already registered", spec.name);
            return;
        }
        self.parameters.push(Parameter {
            spec,
            critical: false,
            value: None,
            state: PropertyState::Idle,
        });
    }

    fn set_critical_parameter(&mut self, name: &str) -> bool {
        // ---
        match self.parameters.iter_mut().find(|p| p.spec.name == name) {
            Some(p) => {
                p.critical = true;
                true
            }
            None => {
                warn!("Unable to find parameter {} in list of existing parameters", name);
                false
            }
        }
    }

    fn set_parameter_value(&mut self, name: &str, value: f64) -> bool {
        // ---
        let Some(p) = self.parameters.iter_mut().find(|p| p.spec.name == name) else {
            return false;
        };
        p.value = Some(value);
        p.state = parameter_state(&p.spec, value);
        self.updated_at = Some(Utc::now());
        true
    }
}
