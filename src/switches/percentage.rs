use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::attributes::{apply_attributes, parse_bool, parse_int, Attribute, AttributeBag};
use super::FeatureSwitch;
use crate::context::DecisionContext;

// uniform samples in [0.0, 1.0)
pub type RandomSource = Arc<dyn Fn() -> f64 + Send + Sync>;

/// A switch that is on for a set percentage of clients.
///
/// The first time a client is seen its state is drawn at random, weighted by
/// `percentage_on`, and stored in the decision context under the switch
/// name. Later evaluations for that client return the stored state.
#[derive(Clone)]
pub struct PercentageFeatureSwitch {
    name: String,
    is_enabled: bool,
    pub percentage_on: i32,
    random: RandomSource,
}

const ATTRIBUTES: &[Attribute<PercentageFeatureSwitch>] =
    &[Attribute::new("percentage", set_percentage)];

fn set_percentage(switch: &mut PercentageFeatureSwitch, raw: &str) -> bool {
    match parse_int(raw) {
        Some(percentage) => {
            switch.percentage_on = percentage;
            true
        }
        None => false,
    }
}

fn thread_sample() -> f64 {
    rand::thread_rng().gen::<f64>()
}

impl PercentageFeatureSwitch {
    pub const FEATURE_TYPE: &'static str = "percentage";

    pub fn new(name: impl Into<String>) -> Self {
        Self::with_random_source(name, thread_sample)
    }

    pub fn with_random_source<F>(name: impl Into<String>, random: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            is_enabled: false,
            percentage_on: 0,
            random: Arc::new(random),
        }
    }

    pub fn with_percentage(mut self, percentage_on: i32) -> Self {
        self.percentage_on = percentage_on;
        self
    }

    pub fn enabled(mut self) -> Self {
        self.is_enabled = true;
        self
    }

    fn threshold(&self) -> f64 {
        f64::from(self.percentage_on) / 100.0
    }
}

impl FeatureSwitch for PercentageFeatureSwitch {
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
        if !context.has_request() {
            return false;
        }

        if let Some(stored) = context.read(&self.name) {
            let is_on = parse_bool(&stored).unwrap_or(false);
            tracing::debug!(switch = %self.name, is_on, "using sticky decision");
            return is_on;
        }

        let is_on = (self.random)() < self.threshold();

        if !context.write(&self.name, &is_on.to_string()) {
            tracing::debug!(switch = %self.name, "response not writable, decision not persisted");
        }

        is_on
    }

    fn set_custom_attributes(&mut self, values: &AttributeBag) {
        apply_attributes(self, ATTRIBUTES, values);
    }

    fn custom_attributes(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("percentage".to_string(), self.percentage_on.to_string())])
    }

    fn clone_box(&self) -> Box<dyn FeatureSwitch> {
        Box::new(self.clone())
    }
}

impl fmt::Debug for PercentageFeatureSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PercentageFeatureSwitch")
            .field("name", &self.name)
            .field("is_enabled", &self.is_enabled)
            .field("percentage_on", &self.percentage_on)
            .finish_non_exhaustive()
    }
}
