//! Inbound webhook request as seen by validators.

use std::collections::HashMap;

/// Headers plus the exact bytes that were transmitted.
///
/// Header names are stored lowercase, so lookups ignore case.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Builds a request from header pairs. Later duplicates win.
    pub fn from_parts<I, K, V>(headers: I, body: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut request = Self::new(body);
        for (name, value) in headers {
            request
                .headers
                .insert(name.as_ref().to_ascii_lowercase(), value.into());
        }
        request
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw body bytes, never re-serialized.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let request = WebhookRequest::new("{}").with_header("X-Wave-Signature", "abc");

        assert_eq!(request.header("x-wave-signature"), Some("abc"));
        assert_eq!(request.header("X-WAVE-SIGNATURE"), Some("abc"));
        assert_eq!(request.header("x-other"), None);
    }

    #[test]
    fn body_is_kept_verbatim() {
        let raw = b"{ \"b\": 2,  \"a\": 1 }".to_vec();
        let request = WebhookRequest::from_parts([("Content-Type", "application/json")], raw.clone());
        assert_eq!(request.body(), raw.as_slice());
    }
}
