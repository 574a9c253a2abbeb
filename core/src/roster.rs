//! Trustee identities, group files and public key lists.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use ots_threshold::G1Affine;
use ots_threshold::serde_utils::{hex_point, point_from_hex, point_to_hex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    #[serde(alias = "Address")]
    pub address: String,
    #[serde(alias = "Public", with = "hex_point")]
    pub public: G1Affine,
    #[serde(default, alias = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServerIdentity {
    pub fn new(address: impl Into<String>, public: G1Affine) -> Self {
        Self {
            address: address.into(),
            public,
            description: None,
        }
    }
}

/// Ordered trustee list; a trustee's position is its share slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(rename = "servers", alias = "Servers")]
    pub list: Vec<ServerIdentity>,
}

impl Roster {
    pub fn new(list: Vec<ServerIdentity>) -> Self {
        Self { list }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn publics(&self) -> Vec<G1Affine> {
        self.list.iter().map(|s| s.public).collect()
    }

    /// Slot of the trustee with this public key
    pub fn slot_of(&self, public: &G1Affine) -> Option<usize> {
        self.list.iter().position(|s| &s.public == public)
    }

    /// Load a group file (`[[servers]]` tables with `address` and hex `public`)
    pub fn load_group(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read group file: {}", path.display()))?;
        let roster: Roster = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse group file: {}", path.display()))?;
        if roster.is_empty() {
            bail!("Group file {} lists no servers", path.display());
        }
        Ok(roster)
    }

    pub fn to_group_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to encode group file")
    }
}

/// Read a list of hex public keys, one per line; blank lines and `#` comments
/// are skipped
pub fn read_public_keys(path: &Path) -> Result<Vec<G1Affine>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file: {}", path.display()))?;
    contents
        .lines()
        .enumerate()
        .map(|(no, line)| (no, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(no, line)| {
            point_from_hex(line)
                .with_context(|| format!("{}:{}: invalid public key", path.display(), no + 1))
        })
        .collect()
}

pub fn write_public_keys(path: &Path, keys: &[G1Affine]) -> Result<()> {
    let mut out = String::new();
    for key in keys {
        out.push_str(&point_to_hex(key));
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("Failed to write key file: {}", path.display()))
}
