//! Unit descriptors and id schemes.

use serde::{Deserialize, Serialize};

/// How unit ids are canonicalized across the process.
///
/// The scheme is a host-wide setting, never per unit: every id handed to
/// a chain is interpreted under the same scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// `"{format}-{name}-{uid:x}"`.
    #[default]
    Native,
    /// `"{format}-{name}-{file hash:x}-{uid:x}"`, stable across renamed
    /// formats that share a uid.
    Identifier,
}

/// Describes a unit the host can instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    /// Display name.
    pub name: String,
    /// Vendor name.
    pub manufacturer: String,
    /// Format family (e.g. `"VST3"`, `"Builtin"`).
    pub format: String,
    /// Free-form category.
    pub category: String,
    /// Format-specific unique id.
    pub uid: u32,
    /// Version string.
    pub version: String,
    /// Path of the binary or a format-specific identifier.
    pub file_or_identifier: String,
    /// Whether the unit generates audio rather than processing it.
    pub is_instrument: bool,
}

/// One line of the catalog listing.
#[derive(Serialize)]
struct ListingEntry<'a> {
    name: &'a str,
    company: &'a str,
    id: String,
    #[serde(rename = "type")]
    format: &'a str,
    category: &'a str,
    #[serde(rename = "isInstrument")]
    is_instrument: bool,
}

impl UnitDescriptor {
    /// Id of this unit under `scheme`.
    pub fn plugin_id(&self, scheme: IdScheme) -> String {
        match scheme {
            IdScheme::Native => format!("{}-{}-{:x}", self.format, self.name, self.uid),
            IdScheme::Identifier => self.identifier_string(),
        }
    }

    /// Alternate canonical identifier, independent of the active scheme.
    pub fn identifier_string(&self) -> String {
        format!(
            "{}-{}-{:x}-{:x}",
            self.format,
            self.name,
            fnv1a(self.file_or_identifier.as_bytes()),
            self.uid
        )
    }

    /// Single-line JSON listing entry, newline terminated.
    pub fn to_json_line(&self, scheme: IdScheme) -> String {
        let entry = ListingEntry {
            name: &self.name,
            company: &self.manufacturer,
            id: self.plugin_id(scheme),
            format: &self.format,
            category: &self.category,
            is_instrument: self.is_instrument,
        };
        // Serializing a struct of strings and bools cannot fail.
        let mut line = serde_json::to_string(&entry).unwrap_or_default();
        line.push('\n');
        line
    }
}

/// 32-bit FNV-1a; stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> UnitDescriptor {
        UnitDescriptor {
            name: "Comp".to_owned(),
            manufacturer: "Acme".to_owned(),
            format: "VST3".to_owned(),
            category: "Dynamics".to_owned(),
            uid: 0xbeef,
            version: "1.0.0".to_owned(),
            file_or_identifier: "/lib/comp.vst3".to_owned(),
            is_instrument: false,
        }
    }

    #[test]
    fn native_id_uses_hex_uid() {
        assert_eq!(desc().plugin_id(IdScheme::Native), "VST3-Comp-beef");
    }

    #[test]
    fn identifier_scheme_includes_file_hash() {
        let d = desc();
        let id = d.plugin_id(IdScheme::Identifier);
        assert_eq!(id, d.identifier_string());
        assert!(id.starts_with("VST3-Comp-"));
        assert!(id.ends_with("-beef"));

        let mut moved = d.clone();
        moved.file_or_identifier = "/other/comp.vst3".to_owned();
        assert_ne!(moved.identifier_string(), id);
    }

    #[test]
    fn fnv_reference_values() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
    }

    #[test]
    fn json_line_shape() {
        let line = desc().to_json_line(IdScheme::Native);
        assert!(line.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(v["name"], "Comp");
        assert_eq!(v["company"], "Acme");
        assert_eq!(v["id"], "VST3-Comp-beef");
        assert_eq!(v["type"], "VST3");
        assert_eq!(v["isInstrument"], false);
    }
}
