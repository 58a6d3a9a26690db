//! Report property definitions with defaults from report.json
//!
//! report.json is embedded at compile time and is the single source of truth
//! for every chart constant (labels, colors, sizes, limits). Per-run overrides
//! come from the command line as `name=value` pairs and are layered on top of
//! the registry defaults by `PropertyReader`.

use super::error::{ReportError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// report.json embedded at compile time
const REPORT_JSON: &str = include_str!("../../report.json");

/// Registry built from report.json on first access
pub static PROPERTY_REGISTRY: LazyLock<PropertyRegistry> = LazyLock::new(|| {
    PropertyRegistry::from_json(REPORT_JSON).unwrap_or_else(|e| {
        log::error!("Failed to load report.json: {}", e);
        PropertyRegistry::default()
    })
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PropertyKind {
    #[serde(rename = "StringProperty")]
    String,
    #[serde(rename = "EnumeratedProperty")]
    Enumerated,
}

/// One chart setting declared in report.json
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default)]
    pub default_value: String,
    /// Choices of an enumerated property
    #[serde(default)]
    pub values: Vec<String>,
}

impl PropertyDef {
    /// String properties accept anything; enumerated ones match a choice
    /// case-insensitively
    pub fn accepts(&self, value: &str) -> bool {
        match self.kind {
            PropertyKind::String => true,
            PropertyKind::Enumerated => self.values.iter().any(|v| v.eq_ignore_ascii_case(value)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReportFile {
    properties: Vec<PropertyDef>,
}

/// Report settings by name
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    properties: HashMap<String, PropertyDef>,
}

impl PropertyRegistry {
    /// Parse a document with the report.json layout
    ///
    /// An enumerated property whose default is not one of its choices is
    /// rejected, so defaults never need validating at read time.
    pub fn from_json(json_str: &str) -> std::result::Result<Self, String> {
        let file: ReportFile = serde_json::from_str(json_str).map_err(|e| e.to_string())?;

        let mut properties = HashMap::with_capacity(file.properties.len());
        for def in file.properties {
            if !def.accepts(&def.default_value) {
                return Err(format!(
                    "default '{}' of '{}' is not one of [{}]",
                    def.default_value,
                    def.name,
                    def.values.join(", ")
                ));
            }
            properties.insert(def.name.clone(), def);
        }

        Ok(Self { properties })
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.get(name)
    }

    /// All property names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Typed property reader
///
/// Returns the override value when one was given, otherwise the default from
/// report.json. Registry defaults are trusted; overrides are validated and a
/// bad override is an error rather than a silent fallback.
#[derive(Debug, Default)]
pub struct PropertyReader {
    user_values: HashMap<String, String>,
}

impl PropertyReader {
    /// Reader with no overrides (registry defaults only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from `name=value` override strings
    pub fn from_overrides<S: AsRef<str>>(overrides: &[S]) -> Result<Self> {
        let reg = &*PROPERTY_REGISTRY;
        let mut user_values = HashMap::new();

        for raw in overrides {
            let raw = raw.as_ref();
            let (name, value) = raw.split_once('=').ok_or_else(|| ReportError::InvalidProperty {
                name: raw.to_string(),
                value: String::new(),
                reason: "expected name=value".to_string(),
            })?;
            let name = name.trim();
            let value = value.trim();

            if reg.get(name).is_none() {
                return Err(ReportError::InvalidProperty {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason: format!("unknown property (known: {})", reg.names().join(", ")),
                });
            }

            if value.is_empty() {
                // Empty = not set
                continue;
            }

            log::debug!("property override '{}' = '{}'", name, value);
            user_values.insert(name.to_string(), value.to_string());
        }

        Ok(Self { user_values })
    }

    fn is_override(&self, name: &str) -> bool {
        self.user_values.contains_key(name)
    }

    fn invalid(&self, name: &str, value: &str, reason: impl Into<String>) -> ReportError {
        ReportError::InvalidProperty {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Get string property (override or default from report.json)
    pub fn get_string(&self, name: &str) -> String {
        if let Some(value) = self.user_values.get(name) {
            return value.clone();
        }
        PROPERTY_REGISTRY
            .get(name)
            .map(|p| p.default_value.clone())
            .unwrap_or_default()
    }

    /// Get enumerated property, lowercased
    pub fn get_enum(&self, name: &str) -> Result<String> {
        let value = self.get_string(name);
        if let Some(def) = PROPERTY_REGISTRY.get(name) {
            if self.is_override(name) && !def.accepts(&value) {
                let reason = format!("valid values: [{}]", def.values.join(", "));
                return Err(self.invalid(name, &value, reason));
            }
        }
        Ok(value.to_lowercase())
    }

    /// Get boolean property ("true"/"false")
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.get_enum(name)?.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.invalid(name, other, "expected true or false")),
        }
    }

    /// Get f64 property
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        let value = self.get_string(name);
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(name, &value, "expected a number"))
    }

    /// Get f64 property constrained to `[min, max]`
    pub fn get_f64_in_range(&self, name: &str, min: f64, max: f64) -> Result<f64> {
        let v = self.get_f64(name)?;
        if v < min || v > max {
            return Err(self.invalid(
                name,
                &v.to_string(),
                format!("must be within [{}, {}]", min, max),
            ));
        }
        Ok(v)
    }

    /// Get a coordinate pair "a,b"
    pub fn get_coords(&self, name: &str) -> Result<(f64, f64)> {
        let value = self.get_string(name);
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() == 2 {
            if let (Ok(a), Ok(b)) = (parts[0].trim().parse(), parts[1].trim().parse()) {
                return Ok((a, b));
            }
        }
        Err(self.invalid(name, &value, "expected \"a,b\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_defaults() {
        let reg = &*PROPERTY_REGISTRY;
        assert!(reg.get("threshold.label").is_some());
        assert!(reg.get("no.such.property").is_none());

        let default = |name: &str| reg.get(name).map(|p| p.default_value.as_str());
        assert_eq!(default("input.path"), Some("results.csv"));
        assert_eq!(default("output.path"), Some("heaven_hell_plot.png"));
        assert_eq!(default("theme"), Some("whitegrid"));
        assert_eq!(default("figure.dpi"), Some("300"));
    }

    #[test]
    fn test_enum_choices() {
        let theme = PROPERTY_REGISTRY.get("theme").unwrap();
        assert_eq!(theme.kind, PropertyKind::Enumerated);
        assert_eq!(theme.values, vec!["whitegrid", "white", "darkgrid"]);
        assert!(theme.accepts("DarkGrid"));
        assert!(!theme.accepts("solarized"));

        let title = PROPERTY_REGISTRY.get("plot.title").unwrap();
        assert_eq!(title.kind, PropertyKind::String);
        assert!(title.accepts("whatever"));
    }

    #[test]
    fn test_reader_defaults() {
        let reader = PropertyReader::new();
        assert_eq!(reader.get_enum("theme").unwrap(), "whitegrid");
        assert_eq!(reader.get_f64("figure.width").unwrap(), 10.0);
        assert_eq!(reader.get_coords("axis.y.limits").unwrap(), (-0.05, 1.05));
        assert!(reader.get_bool("legend.frame").unwrap());
    }

    #[test]
    fn test_reader_overrides() {
        let reader =
            PropertyReader::from_overrides(&["figure.dpi=150", "theme = darkgrid", "plot.title="])
                .unwrap();
        assert_eq!(reader.get_f64("figure.dpi").unwrap(), 150.0);
        assert_eq!(reader.get_enum("theme").unwrap(), "darkgrid");
        // Empty override keeps the default
        assert!(reader.get_string("plot.title").starts_with("System Convergence"));
    }

    #[test]
    fn test_reader_rejects_bad_overrides() {
        assert!(matches!(
            PropertyReader::from_overrides(&["no.such.property=1"]),
            Err(ReportError::InvalidProperty { .. })
        ));
        assert!(matches!(
            PropertyReader::from_overrides(&["figure.dpi"]),
            Err(ReportError::InvalidProperty { .. })
        ));

        let reader = PropertyReader::from_overrides(&["theme=solarized", "figure.dpi=lots"]).unwrap();
        assert!(reader.get_enum("theme").is_err());
        assert!(reader.get_f64("figure.dpi").is_err());
    }

    #[test]
    fn test_f64_range() {
        let reader = PropertyReader::from_overrides(&["figure.dpi=5000"]).unwrap();
        assert!(reader.get_f64_in_range("figure.dpi", 10.0, 1200.0).is_err());
        let reader = PropertyReader::new();
        assert_eq!(reader.get_f64_in_range("figure.dpi", 10.0, 1200.0).unwrap(), 300.0);
    }

    #[test]
    fn test_from_json_rejects_bad_definitions() {
        let unknown_kind = r#"{"properties": [{"name": "x", "kind": "MagicProperty"}]}"#;
        assert!(PropertyRegistry::from_json(unknown_kind).is_err());

        let bad_default = r#"{"properties": [{"name": "legend.frame", "kind": "EnumeratedProperty",
            "defaultValue": "maybe", "values": ["true", "false"]}]}"#;
        let err = PropertyRegistry::from_json(bad_default).unwrap_err();
        assert!(err.contains("legend.frame"));
    }
}
