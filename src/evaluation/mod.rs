use serde::Serialize;
use std::sync::Arc;

use crate::context::DecisionContext;
use crate::error::ProviderError;
use crate::providers::FeatureSwitchProvider;
use crate::switches::{AttributeBag, FeatureSwitch, SwitchRecord, SwitchTypes};

// Switch evaluation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchEvaluation {
    pub enabled: bool,
    pub reason: String,
}

impl SwitchEvaluation {
    fn off(reason: impl Into<String>) -> Self {
        Self {
            enabled: false,
            reason: reason.into(),
        }
    }
}

/// Entry point for callers: looks switches up in a provider and evaluates
/// them, and applies configuration changes back through the provider.
#[derive(Clone)]
pub struct Switchboard {
    provider: Arc<dyn FeatureSwitchProvider>,
    types: SwitchTypes,
}

impl Switchboard {
    pub fn new(provider: Arc<dyn FeatureSwitchProvider>) -> Self {
        Self::with_types(provider, SwitchTypes::default())
    }

    pub fn with_types(provider: Arc<dyn FeatureSwitchProvider>, types: SwitchTypes) -> Self {
        Self { provider, types }
    }

    pub fn types(&self) -> &SwitchTypes {
        &self.types
    }

    pub async fn initialise(&self, switch_names: &[String]) -> Result<(), ProviderError> {
        self.provider.initialise(switch_names).await
    }

    /// Whether the named switch is on for the client behind `context`.
    /// Unknown and disabled switches are off, and so is any switch the
    /// provider fails to return.
    pub async fn is_on(&self, name: &str, context: &mut dyn DecisionContext) -> bool {
        self.evaluate(name, context).await.enabled
    }

    pub async fn evaluate(&self, name: &str, context: &mut dyn DecisionContext) -> SwitchEvaluation {
        // Step 1: Look the switch up, failing to off
        let switch = match self.provider.get(name).await {
            Ok(Some(switch)) => switch,
            Ok(None) => return SwitchEvaluation::off("Switch not found"),
            Err(e) => {
                tracing::warn!(switch = name, error = %e, "provider failed during evaluation");
                return SwitchEvaluation::off("Switch could not be loaded");
            }
        };

        // Step 2: The master switch overrides any type-specific logic
        if !switch.is_enabled() {
            return SwitchEvaluation::off("Switch is disabled");
        }

        // Step 3: Type-specific decision
        SwitchEvaluation {
            enabled: switch.is_on(context),
            reason: format!("Evaluated by {} switch", switch.feature_type()),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Option<SwitchRecord>, ProviderError> {
        Ok(self.provider.get(name).await?.map(|s| s.to_record()))
    }

    pub async fn all(&self) -> Result<Vec<SwitchRecord>, ProviderError> {
        Ok(self
            .provider
            .all()
            .await?
            .iter()
            .map(|s| s.to_record())
            .collect())
    }

    pub async fn save(&self, switch: &dyn FeatureSwitch) -> Result<SwitchRecord, ProviderError> {
        self.provider.save(switch).await?;
        Ok(switch.to_record())
    }

    /// Stores a new switch. Returns `None` when the name is already taken.
    pub async fn create(
        &self,
        switch: &dyn FeatureSwitch,
    ) -> Result<Option<SwitchRecord>, ProviderError> {
        if !self.provider.insert(switch).await? {
            return Ok(None);
        }
        Ok(Some(switch.to_record()))
    }

    /// Applies a configuration bag to the named switch and saves it.
    /// Returns `None` when the switch does not exist.
    pub async fn configure(
        &self,
        name: &str,
        values: &AttributeBag,
    ) -> Result<Option<SwitchRecord>, ProviderError> {
        self.update(name, |switch| switch.set_custom_attributes(values))
            .await
    }

    pub async fn set_enabled(
        &self,
        name: &str,
        enabled: bool,
    ) -> Result<Option<SwitchRecord>, ProviderError> {
        self.update(name, |switch| switch.set_enabled(enabled)).await
    }

    pub async fn toggle(&self, name: &str) -> Result<Option<SwitchRecord>, ProviderError> {
        self.update(name, |switch| {
            let enabled = switch.is_enabled();
            switch.set_enabled(!enabled);
        })
        .await
    }

    /// Replaces the named switch with one of `feature_type`, keeping its
    /// name and enablement and carrying over the attributes the new type
    /// recognises.
    pub async fn change_type(
        &self,
        name: &str,
        feature_type: &str,
    ) -> Result<Option<SwitchRecord>, ProviderError> {
        let Some(current) = self.provider.get(name).await? else {
            return Ok(None);
        };

        let mut replacement = self.types.create(feature_type, name).ok_or_else(|| {
            ProviderError::UnknownFeatureType {
                name: name.to_string(),
                feature_type: feature_type.to_string(),
            }
        })?;
        replacement.set_enabled(current.is_enabled());
        replacement.set_custom_attributes(&AttributeBag::from(current.custom_attributes()));

        self.provider.save(replacement.as_ref()).await?;
        Ok(Some(replacement.to_record()))
    }

    async fn update<F>(&self, name: &str, change: F) -> Result<Option<SwitchRecord>, ProviderError>
    where
        F: FnOnce(&mut dyn FeatureSwitch) + Send,
    {
        let Some(mut switch) = self.provider.get(name).await? else {
            return Ok(None);
        };

        change(switch.as_mut());
        self.provider.save(switch.as_ref()).await?;
        Ok(Some(switch.to_record()))
    }
}
