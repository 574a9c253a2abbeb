use std::collections::HashMap;

use tracing::{debug, info};

use ots_threshold::cosi;
use ots_threshold::pvss::verify_enc_share_batch;
use ots_threshold::{G1Affine, KeyPair};

use crate::block::{Block, BlockHash, BlockHeader, ForwardLink};
use crate::error::LedgerError;
use crate::payload::{LedgerPayload, ReadRecord, WriteRecord};

/// What the rest of the system needs from the ledger
pub trait LedgerClient {
    /// Record a write after checking its writer signature and encrypted
    /// shares
    fn append_write(&mut self, write: WriteRecord) -> Result<BlockHash, LedgerError>;

    /// Record a read of an existing write by its designated reader
    fn append_read(&mut self, read: ReadRecord) -> Result<BlockHash, LedgerError>;

    fn get_block(&self, hash: &BlockHash) -> Result<Block, LedgerError>;

    /// Public keys of the committee that signs forward links
    fn committee(&self) -> Vec<G1Affine>;

    /// The forward link on `from` that points at `to`.
    ///
    /// Offset `k` on block `i` points at block `i + k + 1`, so the offset
    /// is `to.index - from.index - 1`.
    fn forward_link_between(
        &self,
        from: &BlockHash,
        to: &BlockHash,
    ) -> Result<ForwardLink, LedgerError> {
        let source = self.get_block(from)?;
        let target = self.get_block(to)?;
        let no_link = LedgerError::NoForwardLink {
            source_index: source.index(),
            target: target.index(),
        };
        let offset = target
            .index()
            .checked_sub(source.index() + 1)
            .ok_or_else(|| no_link.clone())?;
        source
            .forward_link(offset as usize)
            .cloned()
            .ok_or(no_link)
    }
}

/// Single-process skipchain.
///
/// Every appended block receives a forward link from every earlier block,
/// collectively signed by the committee over the new block's hash.
pub struct MemoryLedger {
    committee: Vec<KeyPair>,
    blocks: Vec<Block>,
    by_hash: HashMap<BlockHash, usize>,
}

impl MemoryLedger {
    /// Create a ledger with its genesis block
    pub fn new(committee: Vec<KeyPair>) -> Result<Self, LedgerError> {
        if committee.is_empty() {
            return Err(ots_threshold::ThresholdError::EmptySignerSet.into());
        }
        let mut ledger = Self {
            committee,
            blocks: Vec::new(),
            by_hash: HashMap::new(),
        };
        let genesis = ledger.append(LedgerPayload::Genesis)?;
        info!("ledger created, genesis {}", genesis);
        Ok(ledger)
    }

    /// Ledger signed by `members` freshly generated keys
    pub fn with_random_committee(members: usize) -> Result<Self, LedgerError> {
        Self::new((0..members).map(|_| KeyPair::random()).collect())
    }

    pub fn height(&self) -> usize {
        self.blocks.len()
    }

    fn append(&mut self, payload: LedgerPayload) -> Result<BlockHash, LedgerError> {
        let back_link = self.blocks.last().map(Block::hash).unwrap_or_default();
        let header = BlockHeader {
            index: self.blocks.len() as u64,
            roster: self.committee.iter().map(KeyPair::public).collect(),
            back_link,
            data: payload.encode(),
        };
        let hash = header.hash();

        let signature = cosi::sign(&self.committee, hash.as_bytes())?;
        for block in &mut self.blocks {
            block.forward_links.push(ForwardLink {
                from: block.header.hash(),
                hash,
                signature,
            });
        }

        debug!(index = header.index, kind = payload.kind(), "appended block {}", hash);
        self.by_hash.insert(hash, self.blocks.len());
        self.blocks.push(Block {
            header,
            forward_links: Vec::new(),
        });
        Ok(hash)
    }

    fn block(&self, hash: &BlockHash) -> Result<&Block, LedgerError> {
        self.by_hash
            .get(hash)
            .map(|&i| &self.blocks[i])
            .ok_or(LedgerError::UnknownBlock(*hash))
    }
}

impl LedgerClient for MemoryLedger {
    fn append_write(&mut self, write: WriteRecord) -> Result<BlockHash, LedgerError> {
        write.validate()?;
        if !write.verify_writer_signature() {
            return Err(LedgerError::BadWriterSignature);
        }
        let valid = verify_enc_share_batch(&write.h, &write.pub_keys, &write.enc_proofs, &write.enc_shares)?;
        if valid.len() != write.n() {
            return Err(LedgerError::InvalidShares {
                valid: valid.len(),
                n: write.n(),
            });
        }
        self.append(LedgerPayload::Write(write))
    }

    fn append_read(&mut self, read: ReadRecord) -> Result<BlockHash, LedgerError> {
        let block = self.block(&read.data_id)?;
        let write = match LedgerPayload::decode(&block.header.data)? {
            LedgerPayload::Write(write) => write,
            _ => return Err(LedgerError::NotAWrite(read.data_id)),
        };
        if write.reader != read.reader {
            return Err(LedgerError::AccessDenied(read.data_id));
        }
        if !read.verify_signature() {
            return Err(LedgerError::BadReaderSignature);
        }
        self.append(LedgerPayload::Read(read))
    }

    fn get_block(&self, hash: &BlockHash) -> Result<Block, LedgerError> {
        self.block(hash).cloned()
    }

    fn committee(&self) -> Vec<G1Affine> {
        self.committee.iter().map(KeyPair::public).collect()
    }
}
