use std::collections::BTreeMap;

use super::attributes::AttributeBag;
use super::FeatureSwitch;
use crate::context::DecisionContext;

/// On for every request whenever it is enabled. Providers create this type
/// for names they have not stored yet.
#[derive(Debug, Clone)]
pub struct SimpleFeatureSwitch {
    name: String,
    is_enabled: bool,
}

impl SimpleFeatureSwitch {
    pub const FEATURE_TYPE: &'static str = "simple";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_enabled: false,
        }
    }

    pub fn enabled(mut self) -> Self {
        self.is_enabled = true;
        self
    }
}

impl FeatureSwitch for SimpleFeatureSwitch {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.is_enabled = enabled;
    }

    fn feature_type(&self) -> &str {
        Self::FEATURE_TYPE
    }

    fn is_on(&self, context: &mut dyn DecisionContext) -> bool {
        context.has_request()
    }

    fn set_custom_attributes(&mut self, _values: &AttributeBag) {}

    fn custom_attributes(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn clone_box(&self) -> Box<dyn FeatureSwitch> {
        Box::new(self.clone())
    }
}
