//! Near-duplicate detection for notes.
//!
//! A fingerprint covers only the first [`FINGERPRINT_WINDOW`] characters of the
//! trimmed, lowercased content and folds them into a 32-bit rolling hash. Two
//! notes that differ only after the window share a fingerprint, and unrelated
//! notes can collide. Treat equal fingerprints as "probably duplicated", never
//! as proof of identical content.

use serde::{Deserialize, Serialize};

/// Number of leading characters that take part in a fingerprint. Lossy by
/// construction; raising it trades speed for fewer false groupings.
pub const FINGERPRINT_WINDOW: usize = 500;

pub fn fingerprint(content: &str) -> String {
    let normalized: String = content
        .trim()
        .to_lowercase()
        .chars()
        .take(FINGERPRINT_WINDOW)
        .collect();

    let mut hash: u32 = 0;
    for unit in normalized.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(u32::from(unit));
    }
    format!("{hash:08x}")
}

/// Artifacts sharing one fingerprint, in the order they were seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub fingerprint: String,
    pub members: Vec<String>,
}

impl DuplicateGroup {
    /// The first member is canonical; everything after it is a duplicate.
    pub fn duplicates(&self) -> &[String] {
        self.members.get(1..).unwrap_or(&[])
    }
}

/// Group `(name, content)` pairs by fingerprint. Only groups with more than
/// one member are returned, ordered by their canonical member's position.
pub fn group_duplicates<'a, I>(items: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for (name, content) in items {
        let fp = fingerprint(content);
        match groups.iter_mut().find(|g| g.fingerprint == fp) {
            Some(group) => group.members.push(name.to_string()),
            None => groups.push(DuplicateGroup {
                fingerprint: fp,
                members: vec![name.to_string()],
            }),
        }
    }
    groups.retain(|g| g.members.len() > 1);
    groups
}

/// Every non-canonical member across `groups`.
pub fn duplicate_names(groups: &[DuplicateGroup]) -> Vec<String> {
    groups
        .iter()
        .flat_map(|g| g.duplicates().iter().cloned())
        .collect()
}
