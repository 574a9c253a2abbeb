use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use ots_core::{Cluster, Roster};
use ots_threshold::serde_utils::hex_scalar;
use ots_threshold::{Fr, KeyPair};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Private keys of a local cluster, keyed by roster address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyStore {
    #[serde(default)]
    pub keys: Vec<KeyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEntry {
    pub address: String,
    #[serde(with = "hex_scalar")]
    pub secret: Fr,
}

impl KeyStore {
    pub fn from_cluster(roster: &Roster, cluster: &Cluster) -> Result<Self> {
        let keys = roster
            .list
            .iter()
            .map(|server| {
                let keypair = cluster
                    .get(&server.address)
                    .with_context(|| format!("no key for {}", server.address))?;
                Ok(KeyEntry {
                    address: server.address.clone(),
                    secret: *keypair.secret(),
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { keys })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read key store: {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse key store: {}", path.display()))
    }

    /// Write with owner-only permissions; refuses to overwrite
    pub fn save(&self, path: &Path) -> Result<()> {
        if path.exists() {
            bail!(
                "File {} already exists. Remove it first or use a different filename.",
                path.display()
            );
        }
        let body = toml::to_string_pretty(self).context("Failed to encode key store")?;

        let mut f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Failed to create key store: {}", path.display()))?;

        #[cfg(unix)]
        {
            // chmod 600 (rw-------)
            let mut perms = f.metadata()?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        f.write_all(body.as_bytes())?;
        Ok(())
    }

    /// Build the in-process cluster for `roster`.
    ///
    /// Every roster address must have a key. A key whose public half differs
    /// from the roster entry is kept; the key poll reports it, so writes are
    /// dealt to the key the trustee holds.
    pub fn into_cluster(self, roster: &Roster) -> Result<Cluster> {
        let mut cluster = Cluster::new();
        for entry in self.keys {
            let keypair = KeyPair::from_secret(entry.secret);
            match roster.list.iter().find(|s| s.address == entry.address) {
                Some(server) if server.public != keypair.public() => {
                    warn!(address = %entry.address, "key does not match the group file");
                }
                Some(_) => {}
                None => warn!(address = %entry.address, "key for an address outside the group"),
            }
            cluster.insert(entry.address, keypair);
        }

        if let Some(missing) = roster.list.iter().find(|s| cluster.get(&s.address).is_none()) {
            bail!("no key for group member {}", missing.address);
        }
        Ok(cluster)
    }
}
