//! Capabilities the device adapter borrows from its host framework.
//!
//! The adapter never owns property storage, parameter evaluation or config
//! persistence; it asks the host through [`WeatherHost`]. The bundled
//! [`crate::registry::ParameterRegistry`] is one implementation, test doubles
//! are another.

use serde::Serialize;

// ---

/// State of a property or parameter as seen by clients.
///
/// Ordered from best to worst so the worst of a set is its `max()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyState {
    #[default]
    Idle,
    Ok,
    Busy,
    Alert,
}

/// A weather parameter the host evaluates and publishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub min_ok: f64,
    pub max_ok: f64,
    /// Width of the warning band at each edge, in percent of the OK range.
    pub warn_percent: f64,
}

/// One element of a raw property group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawElement {
    pub name: &'static str,
    pub label: &'static str,
    pub value: RawValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    /// `None` when the last report did not carry the value.
    Number(Option<f64>),
}

/// Definition of a read-only group of raw values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawGroup {
    pub name: &'static str,
    pub label: &'static str,
    pub elements: Vec<RawElement>,
}

/// Host framework surface used by [`crate::device::CloudwatcherSolo`].
pub trait WeatherHost {
    /// Read a persisted setting, keyed `PROPERTY.ELEMENT`.
    fn load_config(&self, key: &str) -> Option<String>;

    /// Persist a setting so `load_config` returns it on the next start.
    fn save_config(&mut self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Define (or redefine) a writable text property.
    fn define_text_property(&mut self, name: &'static str, value: &str, state: PropertyState);

    /// Make a raw group visible to clients.
    fn define_group(&mut self, group: RawGroup);

    /// Remove a raw group from clients; unknown names are ignored.
    fn delete_group(&mut self, name: &str);

    /// Replace all element values of a group and set its state.
    fn publish_group(&mut self, name: &str, state: PropertyState, elements: Vec<RawElement>);

    /// Change only the state of a group, keeping its values.
    fn set_group_state(&mut self, name: &str, state: PropertyState);

    fn add_parameter(&mut self, spec: ParameterSpec);

    /// Mark a registered parameter as governing the overall safety verdict.
    ///
    /// Returns `false` when no parameter with that name is registered.
    fn set_critical_parameter(&mut self, name: &str) -> bool;

    /// Returns `false` when no parameter with that name is registered.
    fn set_parameter_value(&mut self, name: &str, value: f64) -> bool;
}
