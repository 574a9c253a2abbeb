use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use ots_config::OtsConfig;
use ots_core::recovery::{open_sealed, recover};
use ots_core::roster::{read_public_keys, write_public_keys};
use ots_core::service::{build_request, publish, record_read};
use ots_core::{Cluster, DecryptService, RootSelection, RoundSettings, Roster};
use ots_ledger::{LedgerClient, LedgerPayload, MemoryLedger, WriteRecord};
use ots_threshold::KeyPair;
use ots_threshold::pvss::verify_enc_share_batch;

use crate::keystore::KeyStore;

/// Generate keys for a local cluster of `count` trustees
pub fn keygen(count: usize, group: &Path, keys: &Path, publics: Option<&Path>) -> Result<()> {
    if count == 0 {
        bail!("a cluster needs at least one trustee");
    }
    if group.exists() {
        bail!("File {} already exists", group.display());
    }

    let (cluster, roster) = Cluster::generate(count);
    KeyStore::from_cluster(&roster, &cluster)?.save(keys)?;
    fs::write(group, roster.to_group_toml()?)
        .with_context(|| format!("Failed to write group file: {}", group.display()))?;
    if let Some(path) = publics {
        write_public_keys(path, &roster.publics())?;
    }

    println!("✅ Wrote {} trustees to {}", count, group.display());
    println!("🔐 Private keys in {}", keys.display());
    Ok(())
}

/// Overrides for the `[round]` config section
#[derive(Debug, Default)]
pub struct RoundOverrides {
    pub root: Option<usize>,
    pub branching: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl RoundOverrides {
    fn apply(&self, config: &OtsConfig) -> RoundSettings {
        let mut settings = RoundSettings::from(&config.round);
        if let Some(root) = self.root {
            settings.root = RootSelection::Fixed(root);
        }
        if self.branching.is_some() {
            settings.branching = self.branching;
        }
        if let Some(ms) = self.timeout_ms {
            settings.timeout = Duration::from_millis(ms);
        }
        settings
    }
}

pub struct RunArgs {
    pub group: PathBuf,
    pub keys: PathBuf,
    pub message: String,
    pub committee: usize,
    pub record_out: Option<PathBuf>,
    pub round: RoundOverrides,
}

/// Write `message` for a fresh reader, read it back through the cluster
/// and return the recovered plaintext
pub async fn run(args: RunArgs, config: &OtsConfig) -> Result<Vec<u8>> {
    let roster = Roster::load_group(&args.group)?;
    let cluster = KeyStore::load(&args.keys)?.into_cluster(&roster)?;
    let service = DecryptService::new(roster, cluster, args.round.apply(config));

    // deal to the keys the trustees hold, not only what the group file says
    let trustees = service.collect_keys().await?;
    for (slot, key) in trustees.iter().enumerate() {
        match service.roster().slot_of(key) {
            Some(listed) if listed == slot => {}
            Some(listed) => warn!(slot, listed, "trustee answered with another member's key"),
            None => warn!(slot, "trustee key differs from the group file"),
        }
    }

    let mut ledger = MemoryLedger::with_random_committee(args.committee).context("ledger setup failed")?;
    let writer = KeyPair::random();
    let reader = KeyPair::random();

    let (write, sealed) = publish(&mut ledger, &writer, &trustees, &reader.public(), args.message.as_bytes())?;
    let read = record_read(&mut ledger, &write, &reader)?;
    let record = write_record(&ledger, &write)?;

    if let Some(path) = &args.record_out {
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(path, json).with_context(|| format!("Failed to write record: {}", path.display()))?;
        info!("write record saved to {}", path.display());
    }

    let request = build_request(&ledger, &write, &read, &reader)?;
    let report = service.decrypt(request).await?;

    info!(
        root = report.root_index,
        usable = report.usable_shares(),
        failures = report.failures.len(),
        "round finished"
    );
    for failure in &report.failures {
        warn!(slot = failure.slot, "trustee refused: {}", failure.error);
    }

    let point = recover(&report, &reader, &record)?;
    Ok(open_sealed(&record, &sealed, &point)?)
}

fn write_record(ledger: &MemoryLedger, write: &ots_ledger::BlockHash) -> Result<WriteRecord> {
    let block = ledger.get_block(write)?;
    Ok(LedgerPayload::decode_write(&block.header.data)?)
}

/// Re-check the encrypted shares of a saved write record and return the
/// slots whose proofs verify
pub fn verify_shares(record: &Path, publics: Option<&Path>) -> Result<Vec<u32>> {
    let contents = fs::read_to_string(record)
        .with_context(|| format!("Failed to read record: {}", record.display()))?;
    let record: WriteRecord = serde_json::from_str(&contents).context("Failed to parse write record")?;
    record.validate()?;
    if !record.verify_writer_signature() {
        bail!("write record is not signed by its writer");
    }

    if let Some(path) = publics {
        let expected = read_public_keys(path)?;
        if expected != record.pub_keys {
            bail!("record trustees differ from {}", path.display());
        }
    }

    Ok(verify_enc_share_batch(
        &record.h,
        &record.pub_keys,
        &record.enc_proofs,
        &record.enc_shares,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "Bana istediginiz kadar gidip gelebilirsiniz.";

    fn cluster_files(dir: &Path, n: usize) -> (PathBuf, PathBuf, PathBuf) {
        let group = dir.join("group.toml");
        let keys = dir.join("keys.toml");
        let publics = dir.join("publics.txt");
        keygen(n, &group, &keys, Some(&publics)).unwrap();
        (group, keys, publics)
    }

    #[tokio::test]
    async fn keygen_then_run_recovers_the_message() {
        let dir = tempfile::tempdir().unwrap();
        let (group, keys, publics) = cluster_files(dir.path(), 7);
        let record_out = dir.path().join("record.json");

        let args = RunArgs {
            group,
            keys,
            message: MESSAGE.into(),
            committee: 4,
            record_out: Some(record_out.clone()),
            round: RoundOverrides {
                root: Some(3),
                branching: Some(2),
                timeout_ms: None,
            },
        };
        let plaintext = run(args, &OtsConfig::default()).await.unwrap();
        assert_eq!(plaintext, MESSAGE.as_bytes());

        let valid = verify_shares(&record_out, Some(&publics)).unwrap();
        assert_eq!(valid, (0..7).collect::<Vec<u32>>());
    }

    #[test]
    fn verify_shares_rejects_foreign_trustees() {
        let dir = tempfile::tempdir().unwrap();
        let (_, _, publics) = cluster_files(dir.path(), 3);

        let other = tempfile::tempdir().unwrap();
        let (group, keys, _) = cluster_files(other.path(), 3);
        let record_out = other.path().join("record.json");
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(run(
            RunArgs {
                group,
                keys,
                message: MESSAGE.into(),
                committee: 2,
                record_out: Some(record_out.clone()),
                round: RoundOverrides::default(),
            },
            &OtsConfig::default(),
        ))
        .unwrap();

        assert!(verify_shares(&record_out, None).is_ok());
        assert!(verify_shares(&record_out, Some(&publics)).is_err());
    }

    #[test]
    fn verify_shares_rejects_an_altered_record() {
        let dir = tempfile::tempdir().unwrap();
        let (group, keys, _) = cluster_files(dir.path(), 4);
        let record_out = dir.path().join("record.json");
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(run(
            RunArgs {
                group,
                keys,
                message: MESSAGE.into(),
                committee: 2,
                record_out: Some(record_out.clone()),
                round: RoundOverrides::default(),
            },
            &OtsConfig::default(),
        ))
        .unwrap();

        let mut record: WriteRecord = serde_json::from_str(&fs::read_to_string(&record_out).unwrap()).unwrap();
        record.hash_enc[0] ^= 1;
        fs::write(&record_out, serde_json::to_string(&record).unwrap()).unwrap();
        let err = verify_shares(&record_out, None).unwrap_err();
        assert!(err.to_string().contains("not signed"));
    }

    #[test]
    fn overrides_win_over_config() {
        let mut config = OtsConfig::default();
        config.round.root = Some(1);
        config.round.branching = Some(3);

        let settings = RoundOverrides::default().apply(&config);
        assert_eq!(settings.root, RootSelection::Fixed(1));
        assert_eq!(settings.branching, Some(3));

        let settings = RoundOverrides {
            root: Some(0),
            branching: Some(1),
            timeout_ms: Some(50),
        }
        .apply(&config);
        assert_eq!(settings.root, RootSelection::Fixed(0));
        assert_eq!(settings.branching, Some(1));
        assert_eq!(settings.timeout, Duration::from_millis(50));
    }

    #[test]
    fn keygen_rejects_empty_cluster() {
        let dir = tempfile::tempdir().unwrap();
        assert!(keygen(0, &dir.path().join("g.toml"), &dir.path().join("k.toml"), None).is_err());
    }
}
