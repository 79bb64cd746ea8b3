//! Wire payload construction.
//!
//! Builds the flat JSON-shaped response bodies incrementally. This is not a
//! general-purpose JSON serializer: fields are emitted in call order, doubles
//! always carry exactly two fractional digits, and nesting happens only
//! through pre-rendered raw values.

/// Escape a string field for embedding between double quotes.
///
/// Only the characters that would corrupt the flat format are escaped;
/// everything else passes through verbatim so payloads stay human-readable.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Incremental builder for one object payload.
#[derive(Debug, Default)]
pub struct PayloadBuilder {
    fields: Vec<String>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.fields.push(format!("\"{}\":\"{}\"", key, escape(value)));
        self
    }

    pub fn number(mut self, key: &str, value: i64) -> Self {
        self.fields.push(format!("\"{}\":{}", key, value));
        self
    }

    /// Doubles are always rendered with exactly two fractional digits.
    pub fn double(mut self, key: &str, value: f64) -> Self {
        self.fields.push(format!("\"{}\":{:.2}", key, value));
        self
    }

    pub fn boolean(mut self, key: &str, value: bool) -> Self {
        self.fields.push(format!("\"{}\":{}", key, value));
        self
    }

    /// Embed an already-rendered value (nested object or array) verbatim.
    pub fn raw(mut self, key: &str, rendered: &str) -> Self {
        self.fields.push(format!("\"{}\":{}", key, rendered));
        self
    }

    pub fn build(self) -> String {
        format!("{{{}}}", self.fields.join(","))
    }
}

/// Builder for an array of already-rendered objects.
#[derive(Debug, Default)]
pub struct ArrayBuilder {
    items: Vec<String>,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rendered: String) {
        self.items.push(rendered);
    }

    pub fn build(self) -> String {
        format!("[{}]", self.items.join(","))
    }
}
