//! Leading `---` YAML header blocks on markdown artifacts.
//!
//! The block is cut out by its fences and handed to `serde_yaml`. A block that
//! does not parse reads as an empty header; the body is still split off.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Split `text` into the YAML between the first pair of `---` fences and the
/// body after the closing fence. `None` when `text` does not open with a
/// fence or the block is never closed.
fn split_block(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;

    let (yaml, after) = if let Some(after) = rest.strip_prefix("---") {
        ("", after)
    } else {
        let end = rest.find("\n---")?;
        (&rest[..end], &rest[end + "\n---".len()..])
    };

    // The closing fence must be a line of its own.
    let after = after.trim_start_matches([' ', '\t', '\r']);
    if !(after.is_empty() || after.starts_with('\n')) {
        return None;
    }
    Some((yaml, after.trim_start_matches(['\r', '\n'])))
}

/// Deserialize the header block of `text` into `T` and return it with the
/// body. Missing or unparseable headers yield `T::default()`.
pub fn parse_front_matter<T>(text: &str) -> (T, &str)
where
    T: DeserializeOwned + Default,
{
    let Some((yaml, body)) = split_block(text) else {
        return (T::default(), text);
    };
    if yaml.trim().is_empty() {
        return (T::default(), body);
    }
    let header = serde_yaml::from_str(yaml).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "unreadable header block; using an empty header");
        T::default()
    });
    (header, body)
}

/// Header fields a skill contributes to the initial load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkillHeader {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "description-en")]
    pub description_en: Option<String>,
}

impl SkillHeader {
    pub fn parse(text: &str) -> Self {
        parse_front_matter::<Self>(text).0
    }
}

/// A parsed header block and the text that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock<'a> {
    pub fields: BTreeMap<String, String>,
    pub body: &'a str,
}

impl HeaderBlock<'_> {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Scalar header fields as strings. Sequences, mappings and empty values are
/// left out.
pub fn parse_header_block(text: &str) -> HeaderBlock<'_> {
    let (raw, body) = parse_front_matter::<BTreeMap<String, serde_yaml::Value>>(text);

    let fields = raw
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::String(s) => s.trim().to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!value.is_empty()).then_some((key, value))
        })
        .collect();

    HeaderBlock { fields, body }
}

/// The body of `text` with any leading header block removed.
pub fn strip_header_block(text: &str) -> &str {
    split_block(text).map_or(text, |(_, body)| body)
}
