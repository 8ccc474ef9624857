use async_trait::async_trait;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::FeatureSwitchProvider;
use crate::error::ProviderError;
use crate::switches::{FeatureSwitch, SwitchTypes};

/// Keeps switches in process memory. Concurrent saves are last-write-wins.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    switches: RwLock<BTreeMap<String, Box<dyn FeatureSwitch>>>,
    types: SwitchTypes,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(types: SwitchTypes) -> Self {
        Self {
            switches: RwLock::default(),
            types,
        }
    }
}

#[async_trait]
impl FeatureSwitchProvider for InMemoryProvider {
    async fn initialise(&self, switch_names: &[String]) -> Result<(), ProviderError> {
        let mut switches = self.switches.write().await;

        for name in switch_names {
            if switches.contains_key(name) {
                continue;
            }
            let switch = self.types.create_default(name).ok_or_else(|| {
                ProviderError::UnknownFeatureType {
                    name: name.clone(),
                    feature_type: self.types.default_type().to_string(),
                }
            })?;
            switches.insert(name.clone(), switch);
        }

        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Box<dyn FeatureSwitch>>, ProviderError> {
        Ok(self.switches.read().await.get(name).cloned())
    }

    async fn save(&self, switch: &dyn FeatureSwitch) -> Result<(), ProviderError> {
        self.switches
            .write()
            .await
            .insert(switch.name().to_string(), switch.clone_box());
        Ok(())
    }

    async fn insert(&self, switch: &dyn FeatureSwitch) -> Result<bool, ProviderError> {
        match self.switches.write().await.entry(switch.name().to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(switch.clone_box());
                Ok(true)
            }
        }
    }

    async fn all(&self) -> Result<Vec<Box<dyn FeatureSwitch>>, ProviderError> {
        Ok(self.switches.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switches::{AttributeBag, PercentageFeatureSwitch, SimpleFeatureSwitch};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let provider = InMemoryProvider::new();
        assert!(provider.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_get_round_trip() {
        let provider = InMemoryProvider::new();
        let switch = PercentageFeatureSwitch::new("new-search")
            .with_percentage(42)
            .enabled();

        provider.save(&switch).await.unwrap();
        let stored = provider.get("new-search").await.unwrap().unwrap();

        assert_eq!(stored.to_record(), switch.to_record());
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let provider = InMemoryProvider::new();
        let mut switch = PercentageFeatureSwitch::new("A");

        provider.save(&switch).await.unwrap();
        switch.set_custom_attributes(&AttributeBag::new().with("percentage", "80"));
        provider.save(&switch).await.unwrap();
        provider.save(&switch).await.unwrap();

        let all = provider.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].custom_attributes()["percentage"], "80");
    }

    #[tokio::test]
    async fn test_insert_keeps_existing_switch() {
        let provider = InMemoryProvider::new();
        let first = PercentageFeatureSwitch::new("A").with_percentage(10).enabled();
        let second = PercentageFeatureSwitch::new("A").with_percentage(90);

        assert!(provider.insert(&first).await.unwrap());
        assert!(!provider.insert(&second).await.unwrap());

        let stored = provider.get("A").await.unwrap().unwrap();
        assert_eq!(stored.to_record(), first.to_record());
        assert_eq!(provider.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_has_one_entry_per_name() {
        let provider = InMemoryProvider::new();
        provider.save(&SimpleFeatureSwitch::new("B")).await.unwrap();
        provider.save(&SimpleFeatureSwitch::new("A")).await.unwrap();
        provider.save(&SimpleFeatureSwitch::new("B").enabled()).await.unwrap();

        let all = provider.all().await.unwrap();
        let listed: Vec<&str> = all.iter().map(|s| s.name()).collect();
        assert_eq!(listed, vec!["A", "B"]);
        assert!(all[1].is_enabled());
    }

    #[tokio::test]
    async fn test_initialise_creates_missing_defaults_only() {
        let provider = InMemoryProvider::new();
        provider
            .save(&PercentageFeatureSwitch::new("beta").with_percentage(5).enabled())
            .await
            .unwrap();

        provider.initialise(&names(&["beta", "checkout"])).await.unwrap();

        let beta = provider.get("beta").await.unwrap().unwrap();
        assert_eq!(beta.feature_type(), "percentage");
        assert!(beta.is_enabled());

        let checkout = provider.get("checkout").await.unwrap().unwrap();
        assert_eq!(checkout.feature_type(), "simple");
        assert!(!checkout.is_enabled());
    }

    #[tokio::test]
    async fn test_initialise_without_default_type_fails() {
        let provider = InMemoryProvider::with_types(SwitchTypes::empty("simple"));
        let err = provider.initialise(&names(&["checkout"])).await.unwrap_err();

        assert!(matches!(err, ProviderError::UnknownFeatureType { .. }));
    }

    #[tokio::test]
    async fn test_returned_copies_are_detached() {
        let provider = InMemoryProvider::new();
        provider.save(&SimpleFeatureSwitch::new("A")).await.unwrap();

        let mut copy = provider.get("A").await.unwrap().unwrap();
        copy.set_enabled(true);

        assert!(!provider.get("A").await.unwrap().unwrap().is_enabled());
    }
}
