//! Feature switch evaluation.
//!
//! A [`providers::FeatureSwitchProvider`] stores switch definitions, a
//! [`switches::FeatureSwitch`] decides whether its feature is on for one
//! client, and a [`context::DecisionContext`] carries the client-side state
//! (cookies, over HTTP) that keeps percentage decisions sticky.
//!
//! ```
//! use feature_switch::context::{DecisionContext, MemoryContext};
//! use feature_switch::switches::{AttributeBag, FeatureSwitch, PercentageFeatureSwitch};
//!
//! let mut switch = PercentageFeatureSwitch::new("new-search");
//! switch.set_custom_attributes(&AttributeBag::new().with("percentage", "100"));
//!
//! let mut ctx = MemoryContext::new();
//! assert!(switch.is_on(&mut ctx));
//! assert_eq!(ctx.read("new-search").as_deref(), Some("true"));
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod evaluation;
pub mod providers;
pub mod routes;
pub mod state;
pub mod switches;
