//! YAML text codec
//!
//! Decoding is plain `serde_yaml`. Encoding walks the value tree itself so
//! the layout can be controlled the way content files have always been
//! written:
//!
//! - `inline` is the nesting level at which the emitter switches from block
//!   style to flow style (`{ a: 1 }`, `[a, b]`). `0` writes everything inline.
//! - `indent` is the number of spaces per block level.
//!
//! Scalars are rendered by `serde_yaml` so quoting rules match the decoder.

use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Stored YAML is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Failed to render scalar: {0}")]
    Render(String),
}

/// Default inline level
pub const DEFAULT_INLINE: usize = 15;

/// Default indent width
pub const DEFAULT_INDENT: usize = 2;

/// Encoder/decoder for YAML documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YamlCodec {
    inline: usize,
    indent: usize,
}

impl Default for YamlCodec {
    fn default() -> Self {
        Self::new(DEFAULT_INLINE, DEFAULT_INDENT)
    }
}

impl YamlCodec {
    /// Creates a codec. An indent of zero is treated as one.
    pub fn new(inline: usize, indent: usize) -> Self {
        Self {
            inline,
            indent: indent.max(1),
        }
    }

    pub fn inline(&self) -> usize {
        self.inline
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Parses YAML text into a value
    pub fn decode(&self, text: &str) -> Result<Value, CodecError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parses stored bytes into a value
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        self.decode(std::str::from_utf8(bytes)?)
    }

    /// Renders a value as YAML text
    pub fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let mut out = String::new();
        self.write_block(&mut out, value, self.inline, 0)?;
        Ok(out)
    }

    fn write_block(
        &self,
        out: &mut String,
        value: &Value,
        inline: usize,
        indent: usize,
    ) -> Result<(), CodecError> {
        let prefix = " ".repeat(indent);

        if inline == 0 || !is_open_collection(value) {
            out.push_str(&prefix);
            out.push_str(&flow(value)?);
            out.push('\n');
            return Ok(());
        }

        match value {
            Value::Mapping(map) => {
                for (key, child) in map {
                    out.push_str(&prefix);
                    out.push_str(&render_key(key)?);

                    if inline == 1 || !is_open_collection(child) {
                        out.push_str(": ");
                        out.push_str(&flow(child)?);
                        out.push('\n');
                    } else {
                        out.push_str(":\n");
                        self.write_block(out, child, inline - 1, indent + self.indent)?;
                    }
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    if inline == 1 || !is_open_collection(item) {
                        out.push_str(&prefix);
                        out.push_str("- ");
                        out.push_str(&flow(item)?);
                        out.push('\n');
                        continue;
                    }

                    let mut child = String::new();
                    self.write_block(&mut child, item, inline - 1, indent + self.indent)?;

                    if self.indent >= 2 {
                        // Compact form: `- key: value` on the dash line
                        out.push_str(&prefix);
                        out.push_str("- ");
                        out.push_str(&child[indent + 2..]);
                    } else {
                        out.push_str(&prefix);
                        out.push_str("-\n");
                        out.push_str(&child);
                    }
                }
            }
            _ => unreachable!("only non-empty collections are written as blocks"),
        }

        Ok(())
    }
}

/// Non-empty mapping or sequence
fn is_open_collection(value: &Value) -> bool {
    match value {
        Value::Mapping(map) => !map.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        _ => false,
    }
}

/// Renders a value in flow style on a single line
fn flow(value: &Value) -> Result<String, CodecError> {
    match value {
        Value::String(s) => render_string(s, true),
        Value::Sequence(items) if items.is_empty() => Ok("[]".to_string()),
        Value::Sequence(items) => {
            let rendered = items.iter().map(flow).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", rendered.join(", ")))
        }
        Value::Mapping(map) if map.is_empty() => Ok("{}".to_string()),
        Value::Mapping(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, child) in map {
                entries.push(format!("{}: {}", flow_key(key)?, flow(child)?));
            }
            Ok(format!("{{ {} }}", entries.join(", ")))
        }
        Value::Tagged(tagged) => Ok(format!("{} {}", tagged.tag, flow(&tagged.value)?)),
        scalar => render_scalar(scalar),
    }
}

fn render_key(key: &Value) -> Result<String, CodecError> {
    match key {
        Value::String(s) => render_string(s, false),
        other => flow_key(other),
    }
}

fn flow_key(key: &Value) -> Result<String, CodecError> {
    match key {
        Value::String(s) => render_string(s, true),
        other => flow(other),
    }
}

fn render_scalar(value: &Value) -> Result<String, CodecError> {
    let text = serde_yaml::to_string(value)?;
    let text = text.strip_suffix('\n').unwrap_or(&text);

    if text.contains('\n') {
        return Err(CodecError::Render(text.to_string()));
    }
    Ok(text.to_string())
}

/// Characters a plain scalar may not carry inside a flow collection
const FLOW_UNSAFE: &[char] = &[
    ',', '[', ']', '{', '}', ':', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`', '?',
];

fn render_string(s: &str, in_flow: bool) -> Result<String, CodecError> {
    let rendered = serde_yaml::to_string(s)?;
    let rendered = rendered.strip_suffix('\n').unwrap_or(&rendered);

    let multiline = rendered.contains('\n');
    let plain = rendered == s;

    if multiline || (in_flow && plain && s.contains(FLOW_UNSAFE)) {
        // A JSON string is a valid YAML double-quoted scalar
        return serde_json::to_string(s).map_err(|e| CodecError::Render(e.to_string()));
    }

    Ok(rendered.to_string())
}
