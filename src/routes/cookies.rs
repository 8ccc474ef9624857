use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use std::collections::HashMap;
use std::convert::Infallible;

use crate::context::DecisionContext;

/// How sticky decisions are written back to the client.
#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    /// Lifetime of the cookie; `None` makes it a session cookie.
    pub max_age_secs: Option<u64>,
}

/// [`DecisionContext`] over the request's `Cookie` header. Decisions written
/// during evaluation are turned into `Set-Cookie` headers for the response.
#[derive(Debug, Clone, Default)]
pub struct CookieContext {
    cookies: HashMap<String, String>,
    pending: Vec<(String, String)>,
}

impl CookieContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();

        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let Some((name, raw)) = pair.split_once('=') else {
                    continue;
                };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let raw = raw.trim();
                let raw = raw
                    .strip_prefix('"')
                    .and_then(|r| r.strip_suffix('"'))
                    .unwrap_or(raw);
                // first occurrence is the most specific path
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| raw.to_string());
            }
        }

        Self {
            cookies,
            pending: Vec::new(),
        }
    }

    /// `Set-Cookie` headers for every decision written on this context.
    pub fn set_cookie_headers(&self, settings: &CookieSettings) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.pending {
            let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
            if let Some(max_age) = settings.max_age_secs {
                cookie.push_str(&format!("; Max-Age={max_age}"));
            }

            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(cookie = %name, error = %e, "cannot encode sticky cookie"),
            }
        }

        headers
    }
}

impl DecisionContext for CookieContext {
    fn has_request(&self) -> bool {
        true
    }

    fn read(&self, key: &str) -> Option<String> {
        self.cookies.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> bool {
        self.cookies.insert(key.to_string(), value.to_string());
        self.pending.retain(|(name, _)| name != key);
        self.pending.push((key.to_string(), value.to_string()));
        true
    }
}

impl<S> FromRequestParts<S> for CookieContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
