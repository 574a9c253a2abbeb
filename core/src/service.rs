//! Writer and reader entry points tying setup, ledger, round and recovery
//! together.

use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use ots_config::RoundConfig;
use ots_ledger::{BlockHash, LedgerClient, LedgerError, LedgerPayload, ReadRecord};
use ots_threshold::{G1Affine, KeyPair};

use crate::error::{OtsError, RoundError};
use crate::protocol::{Cluster, RoundHandle, RoundReport, start_keypoll, start_round};
use crate::recovery::recover;
use crate::request::{DecryptionRequest, SignedDecryptionRequest};
use crate::roster::Roster;
use crate::setup::{SealedPayload, ThresholdConfig};
use crate::tree::Tree;

const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSelection {
    /// Uniformly random trustee per round
    Random,
    Fixed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSettings {
    pub timeout: Duration,
    /// `None` means a star: every trustee is a child of the root
    pub branching: Option<usize>,
    pub root: RootSelection,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ROUND_TIMEOUT,
            branching: None,
            root: RootSelection::Random,
        }
    }
}

impl From<&RoundConfig> for RoundSettings {
    fn from(cfg: &RoundConfig) -> Self {
        Self {
            timeout: Duration::from_millis(cfg.timeout_ms),
            branching: cfg.branching,
            root: cfg.root.map_or(RootSelection::Random, RootSelection::Fixed),
        }
    }
}

/// Runs decryption rounds over a fixed roster
pub struct DecryptService {
    roster: Roster,
    cluster: Cluster,
    settings: RoundSettings,
}

impl DecryptService {
    pub fn new(roster: Roster, cluster: Cluster, settings: RoundSettings) -> Self {
        Self {
            roster,
            cluster,
            settings,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    fn pick_root(&self) -> usize {
        match self.settings.root {
            RootSelection::Fixed(root) => root,
            RootSelection::Random => rand::thread_rng().gen_range(0..self.roster.len().max(1)),
        }
    }

    pub fn build_tree(&self) -> Result<Tree, RoundError> {
        let root = self.pick_root();
        match self.settings.branching {
            Some(branching) => Tree::with_root(&self.roster, root, branching),
            None => Tree::star(&self.roster, root),
        }
    }

    /// Run one round and wait for the root's report
    pub async fn decrypt(&self, request: SignedDecryptionRequest) -> Result<RoundReport, RoundError> {
        let tree = self.build_tree()?;
        let round = start_round(&self.cluster, &tree, request)?;
        let report = self.await_report(round).await?;
        info!(
            root = report.root_index,
            shares = report.usable_shares(),
            failures = report.failures.len(),
            "round finished"
        );
        Ok(report)
    }

    /// Poll every trustee over the tree for the key it holds; keys in slot
    /// order
    pub async fn collect_keys(&self) -> Result<Vec<G1Affine>, RoundError> {
        let tree = self.build_tree()?;
        let round = start_keypoll(&self.cluster, &tree)?;
        let report = self.await_report(round).await?;
        let n = self.roster.len();
        report.publics(n).ok_or(RoundError::IncompleteKeyPoll {
            got: report.keys.len(),
            n,
        })
    }

    /// Wait for the root under the round timeout; the round's tasks are
    /// aborted when `round` drops
    async fn await_report<R>(&self, mut round: RoundHandle<R>) -> Result<R, RoundError> {
        match tokio::time::timeout(self.settings.timeout, round.report()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.settings.timeout, "round timed out, aborting node tasks");
                Err(RoundError::Timeout(self.settings.timeout))
            }
        }
    }
}

/// Share a fresh secret among `trustees`, seal `plaintext` with it and
/// record the write signed by `writer`. The sealed payload is returned for
/// off-ledger storage.
pub fn publish<L: LedgerClient>(
    ledger: &mut L,
    writer: &KeyPair,
    trustees: &[G1Affine],
    reader: &G1Affine,
    plaintext: &[u8],
) -> Result<(BlockHash, SealedPayload), OtsError> {
    let mut config = ThresholdConfig::setup(trustees, reader)?;
    let sealed = config.seal_payload(plaintext)?;
    let hash = ledger.append_write(config.to_write_record(&sealed, writer))?;
    info!(write = %hash, n = config.n, threshold = config.threshold, "write recorded");
    Ok((hash, sealed))
}

/// Record the reader's read of `write`
pub fn record_read<L: LedgerClient>(ledger: &mut L, write: &BlockHash, reader: &KeyPair) -> Result<BlockHash, LedgerError> {
    ledger.append_read(ReadRecord::new(*write, reader))
}

/// Assemble and sign the decryption request for a recorded read
pub fn build_request<L: LedgerClient>(
    ledger: &L,
    write: &BlockHash,
    read: &BlockHash,
    reader: &KeyPair,
) -> Result<SignedDecryptionRequest, LedgerError> {
    let write_block = ledger.get_block(write)?;
    let read_block = ledger.get_block(read)?;
    let proof = ledger.forward_link_between(write, read)?;
    let request = DecryptionRequest {
        write: write_block.header,
        read: read_block.header,
        proof,
        committee: ledger.committee(),
    };
    Ok(request.sign(reader))
}

/// Reader flow: request, round, unwrap and recover `G * secret`
pub async fn read_secret<L: LedgerClient>(
    service: &DecryptService,
    ledger: &L,
    write: &BlockHash,
    read: &BlockHash,
    reader: &KeyPair,
) -> Result<G1Affine, OtsError> {
    let request = build_request(ledger, write, read, reader)?;
    let record = LedgerPayload::decode_write(&request.request.write.data).map_err(LedgerError::from)?;
    let report = service.decrypt(request).await?;
    Ok(recover(&report, reader, &record)?)
}
