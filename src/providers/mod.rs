pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::switches::FeatureSwitch;

pub use memory::InMemoryProvider;
pub use postgres::PostgresProvider;

/// Backends hand out owned copies; changes take effect once saved.
#[async_trait]
pub trait FeatureSwitchProvider: Send + Sync {
    /// Existing entries are left as they are.
    async fn initialise(&self, switch_names: &[String]) -> Result<(), ProviderError>;

    async fn get(&self, name: &str) -> Result<Option<Box<dyn FeatureSwitch>>, ProviderError>;

    async fn save(&self, switch: &dyn FeatureSwitch) -> Result<(), ProviderError>;

    /// Stores the switch only if its name is free. Returns `false`, leaving
    /// the stored switch untouched, when the name is taken.
    async fn insert(&self, switch: &dyn FeatureSwitch) -> Result<bool, ProviderError>;

    // ordered by name
    async fn all(&self) -> Result<Vec<Box<dyn FeatureSwitch>>, ProviderError>;
}
