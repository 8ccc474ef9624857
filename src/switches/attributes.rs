use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// String-keyed configuration bag. A key may carry several values; readers
/// see them joined with a comma.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, AttributeValue>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct AttributeBag {
    values: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    One(String),
    Many(Vec<String>),
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|values| values.join(","))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, AttributeValue>> for AttributeBag {
    fn from(raw: BTreeMap<String, AttributeValue>) -> Self {
        let values = raw
            .into_iter()
            .map(|(key, value)| match value {
                AttributeValue::One(v) => (key, vec![v]),
                AttributeValue::Many(vs) => (key, vs),
            })
            .collect();
        Self { values }
    }
}

impl From<AttributeBag> for BTreeMap<String, Vec<String>> {
    fn from(bag: AttributeBag) -> Self {
        bag.values
    }
}

impl From<BTreeMap<String, String>> for AttributeBag {
    fn from(raw: BTreeMap<String, String>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<HashMap<String, String>> for AttributeBag {
    fn from(raw: HashMap<String, String>) -> Self {
        raw.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

// The setter returns false when the raw value does not parse.
pub struct Attribute<S> {
    pub key: &'static str,
    apply: fn(&mut S, &str) -> bool,
}

impl<S> Attribute<S> {
    pub const fn new(key: &'static str, apply: fn(&mut S, &str) -> bool) -> Self {
        Self { key, apply }
    }
}

/// Unknown keys are ignored and malformed values skipped. Returns the
/// number of fields that were set.
pub fn apply_attributes<S>(target: &mut S, schema: &[Attribute<S>], values: &AttributeBag) -> usize {
    let mut applied = 0;

    for attribute in schema {
        let Some(raw) = values.get(attribute.key) else {
            continue;
        };

        if (attribute.apply)(target, &raw) {
            applied += 1;
        } else {
            tracing::debug!(key = attribute.key, value = %raw, "ignoring malformed attribute value");
        }
    }

    applied
}

pub fn parse_int(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
