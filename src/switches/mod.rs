pub mod attributes;
pub mod percentage;
pub mod simple;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::context::DecisionContext;

pub use attributes::AttributeBag;
pub use percentage::{PercentageFeatureSwitch, RandomSource};
pub use simple::SimpleFeatureSwitch;

/// The master switch (`is_enabled`) is not consulted by `is_on`; callers
/// such as [`crate::evaluation::Switchboard`] check it first.
pub trait FeatureSwitch: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn feature_type(&self) -> &str;

    /// Never fails; degenerate contexts resolve to `false`.
    fn is_on(&self, context: &mut dyn DecisionContext) -> bool;

    fn set_custom_attributes(&mut self, values: &AttributeBag);

    fn custom_attributes(&self) -> BTreeMap<String, String>;

    fn clone_box(&self) -> Box<dyn FeatureSwitch>;

    fn to_record(&self) -> SwitchRecord {
        SwitchRecord {
            name: self.name().to_string(),
            is_enabled: self.is_enabled(),
            feature_type: self.feature_type().to_string(),
            attributes: self.custom_attributes(),
        }
    }
}

impl Clone for Box<dyn FeatureSwitch> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRecord {
    pub name: String,
    pub is_enabled: bool,
    pub feature_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

// Switch names double as cookie names, so they stay within a safe alphabet.
pub fn validate_switch_name(name: &str) -> Result<(), String> {
    let Some(first) = name.chars().next() else {
        return Err("Switch name cannot be empty".to_string());
    };

    if name.len() > 64 {
        return Err("Switch name is too long (Max: 64 characters)".to_string());
    }

    if !first.is_ascii_alphabetic() {
        return Err("Switch name must start with a letter".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(
            "Switch name can only contain letters, numbers, underscores, hyphens and dots"
                .to_string(),
        );
    }

    Ok(())
}

pub type SwitchConstructor = Arc<dyn Fn(&str) -> Box<dyn FeatureSwitch> + Send + Sync>;

#[derive(Clone)]
pub struct SwitchTypes {
    constructors: BTreeMap<String, SwitchConstructor>,
    default_type: String,
}

impl SwitchTypes {
    /// A registry with no types. `default_type` must be registered before
    /// [`SwitchTypes::create_default`] can succeed.
    pub fn empty(default_type: impl Into<String>) -> Self {
        Self {
            constructors: BTreeMap::new(),
            default_type: default_type.into(),
        }
    }

    pub fn register<F>(mut self, feature_type: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&str) -> Box<dyn FeatureSwitch> + Send + Sync + 'static,
    {
        self.constructors
            .insert(feature_type.into(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, feature_type: &str) -> bool {
        self.constructors.contains_key(feature_type)
    }

    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    pub fn feature_types(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(&self, feature_type: &str, name: &str) -> Option<Box<dyn FeatureSwitch>> {
        self.constructors.get(feature_type).map(|ctor| ctor(name))
    }

    pub fn create_default(&self, name: &str) -> Option<Box<dyn FeatureSwitch>> {
        self.create(&self.default_type, name)
    }

    /// `None` when the record's feature type is not registered.
    pub fn from_record(&self, record: &SwitchRecord) -> Option<Box<dyn FeatureSwitch>> {
        let mut switch = self.create(&record.feature_type, &record.name)?;
        switch.set_enabled(record.is_enabled);
        switch.set_custom_attributes(&AttributeBag::from(record.attributes.clone()));
        Some(switch)
    }
}

impl Default for SwitchTypes {
    fn default() -> Self {
        Self::empty(SimpleFeatureSwitch::FEATURE_TYPE)
            .register(SimpleFeatureSwitch::FEATURE_TYPE, |name| {
                Box::new(SimpleFeatureSwitch::new(name))
            })
            .register(PercentageFeatureSwitch::FEATURE_TYPE, |name| {
                Box::new(PercentageFeatureSwitch::new(name))
            })
    }
}

impl fmt::Debug for SwitchTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchTypes")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .field("default_type", &self.default_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let types = SwitchTypes::default();

        assert!(types.contains("simple"));
        assert!(types.contains("percentage"));
        assert_eq!(types.default_type(), "simple");

        let switch = types.create_default("checkout").unwrap();
        assert_eq!(switch.name(), "checkout");
        assert_eq!(switch.feature_type(), "simple");
        assert!(!switch.is_enabled());
    }

    #[test]
    fn test_from_record_restores_configuration() {
        let record = SwitchRecord {
            name: "new-search".to_string(),
            is_enabled: true,
            feature_type: "percentage".to_string(),
            attributes: BTreeMap::from([("percentage".to_string(), "37".to_string())]),
        };

        let switch = SwitchTypes::default().from_record(&record).unwrap();
        assert_eq!(switch.to_record(), record);
    }

    #[test]
    fn test_from_record_unknown_type() {
        let record = SwitchRecord {
            name: "legacy".to_string(),
            is_enabled: true,
            feature_type: "time-window".to_string(),
            attributes: BTreeMap::new(),
        };

        assert!(SwitchTypes::default().from_record(&record).is_none());
    }

    #[test]
    fn test_register_custom_constructor() {
        let types = SwitchTypes::default().register("percentage", |name| {
            Box::new(PercentageFeatureSwitch::with_random_source(name, || 0.0))
        });

        let mut switch = types.create("percentage", "fixed").unwrap();
        switch.set_custom_attributes(&AttributeBag::new().with("percentage", "1"));
        assert!(switch.is_on(&mut crate::context::MemoryContext::new()));
    }

    #[test]
    fn test_validate_switch_name() {
        assert!(validate_switch_name("A").is_ok());
        assert!(validate_switch_name("new-search_v2.1").is_ok());

        assert!(validate_switch_name("").is_err());
        assert!(validate_switch_name("2fast").is_err());
        assert!(validate_switch_name("has space").is_err());
        assert!(validate_switch_name("semi;colon").is_err());
        assert!(validate_switch_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let record = SimpleFeatureSwitch::new("dark-mode").to_record();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "name": "dark-mode",
                "is_enabled": false,
                "feature_type": "simple",
                "attributes": {}
            })
        );
    }
}
