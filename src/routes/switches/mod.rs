pub mod routes;

use serde::Deserialize;

use crate::switches::AttributeBag;

// MODELS

#[derive(Debug, Deserialize)]
pub struct CreateSwitchRequest {
    pub name: String,
    pub feature_type: Option<String>,
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub attributes: AttributeBag,
}

#[derive(Debug, Deserialize)]
pub struct ChangeTypeRequest {
    pub feature_type: String,
}
