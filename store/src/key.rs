//! Canonical key rendering.
//!
//! A key renders as `{ID:field1|field2|...}`. Backslash, `|`, `{` and `}`
//! inside a field are escaped with a backslash, so two keys of the same arity
//! render to the same string only if every field is equal.

/// A structured key with a stable string identity.
pub trait CanonicalKey {
    fn canonical_key(&self) -> String;
}

const OPEN: &str = "{ID:";
const CLOSE: char = '}';
const SEPARATOR: char = '|';
const ESCAPE: char = '\\';

fn needs_escape(c: char) -> bool {
    matches!(c, '\\' | '|' | '{' | '}')
}

/// Incremental builder for canonical keys.
///
/// ```
/// use marketd_store::KeyEncoder;
///
/// let key = KeyEncoder::new().field("org").field("a|b").finish();
/// assert_eq!(key, r"{ID:org|a\|b}");
/// ```
#[derive(Debug)]
pub struct KeyEncoder {
    buf: String,
    fields: usize,
}

impl KeyEncoder {
    pub fn new() -> Self {
        Self {
            buf: String::from(OPEN),
            fields: 0,
        }
    }

    pub fn field(mut self, value: &str) -> Self {
        if self.fields > 0 {
            self.buf.push(SEPARATOR);
        }
        for c in value.chars() {
            if needs_escape(c) {
                self.buf.push(ESCAPE);
            }
            self.buf.push(c);
        }
        self.fields += 1;
        self
    }

    pub fn finish(mut self) -> String {
        self.buf.push(CLOSE);
        self.buf
    }
}

impl Default for KeyEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a canonical key back into its fields.
///
/// Returns `None` if `key` is not a well-formed canonical key.
pub fn decode_key(key: &str) -> Option<Vec<String>> {
    let body = key.strip_prefix(OPEN)?;
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                let escaped = chars.next()?;
                if !needs_escape(escaped) {
                    return None;
                }
                current.push(escaped);
            }
            SEPARATOR => fields.push(std::mem::take(&mut current)),
            CLOSE => {
                if chars.next().is_some() {
                    return None;
                }
                fields.push(current);
                return Some(fields);
            }
            '{' => return None,
            other => current.push(other),
        }
    }
    None
}
