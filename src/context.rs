use std::collections::HashMap;

/// Client-side store (cookies, over HTTP) keyed by switch name.
pub trait DecisionContext: Send {
    /// Without a request every switch answers `false`.
    fn has_request(&self) -> bool;

    fn read(&self, key: &str) -> Option<String>;

    /// Returns `false` when the response can no longer be influenced. A
    /// successful write is visible to later reads on the same context.
    fn write(&mut self, key: &str, value: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    store: Option<HashMap<String, String>>,
    writable: bool,
    written: Vec<(String, String)>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self {
            store: Some(HashMap::new()),
            writable: true,
            written: Vec::new(),
        }
    }

    /// A context with a request whose response can no longer be changed.
    pub fn read_only() -> Self {
        Self {
            store: Some(HashMap::new()),
            writable: false,
            written: Vec::new(),
        }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    /// Seeds a value as if the client had sent it with the request.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(store) = self.store.as_mut() {
            store.insert(key.into(), value.into());
        }
        self
    }

    pub fn written(&self) -> &[(String, String)] {
        &self.written
    }
}

impl DecisionContext for MemoryContext {
    fn has_request(&self) -> bool {
        self.store.is_some()
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.as_ref()?.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> bool {
        if !self.writable {
            return false;
        }
        let Some(store) = self.store.as_mut() else {
            return false;
        };

        store.insert(key.to_string(), value.to_string());
        self.written.push((key.to_string(), value.to_string()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_is_visible_to_reads() {
        let mut ctx = MemoryContext::new();
        assert!(ctx.has_request());
        assert_eq!(ctx.read("beta"), None);

        assert!(ctx.write("beta", "True"));
        assert_eq!(ctx.read("beta").as_deref(), Some("True"));
        assert_eq!(ctx.written(), &[("beta".to_string(), "True".to_string())]);
    }

    #[test]
    fn test_read_only_context_rejects_writes() {
        let mut ctx = MemoryContext::read_only().with_value("beta", "False");

        assert!(!ctx.write("beta", "True"));
        assert_eq!(ctx.read("beta").as_deref(), Some("False"));
        assert!(ctx.written().is_empty());
    }

    #[test]
    fn test_detached_context_has_nothing() {
        let mut ctx = MemoryContext::detached().with_value("beta", "True");

        assert!(!ctx.has_request());
        assert_eq!(ctx.read("beta"), None);
        assert!(!ctx.write("beta", "True"));
    }
}
