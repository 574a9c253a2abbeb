
use ots_ledger::{BlockHash, BlockHeader, ForwardLink, LedgerClient, LedgerPayload, MemoryLedger, ReadRecord};
use ots_threshold::{KeyPair, cosi, point_for_key};

use crate::protocol::Cluster;
use crate::request::{DecryptionRequest, SignedDecryptionRequest};
use crate::roster::Roster;
use crate::service::{build_request, publish, record_read};
use crate::setup::SealedPayload;

/// 44-byte message used across the end-to-end scenarios
pub(crate) const MESSAGE: &[u8] = b"Bana istediginiz kadar gidip gelebilirsiniz.";

pub(crate) struct Fixture {
    pub ledger: MemoryLedger,
    pub cluster: Cluster,
    pub roster: Roster,
    pub reader: KeyPair,
    pub writer: KeyPair,
    pub write: BlockHash,
    pub read: BlockHash,
    pub sealed: SealedPayload,
}

impl Fixture {
    /// `n` trustees, a four-member ledger committee, and a recorded write
    /// and read of [`MESSAGE`]
    pub fn new(n: usize) -> Self {
        let (cluster, roster) = Cluster::generate(n);
        let mut ledger = MemoryLedger::with_random_committee(4).unwrap();
        let reader = KeyPair::random();
        let writer = KeyPair::random();

        let (write, sealed) = publish(&mut ledger, &writer, &roster.publics(), &reader.public(), MESSAGE).unwrap();
        let read = record_read(&mut ledger, &write, &reader).unwrap();

        Self {
            ledger,
            cluster,
            roster,
            reader,
            writer,
            write,
            read,
            sealed,
        }
    }

    pub fn request(&self) -> SignedDecryptionRequest {
        build_request(&self.ledger, &self.write, &self.read, &self.reader).unwrap()
    }

    pub fn write_record(&self) -> ots_ledger::WriteRecord {
        let block = self.ledger.get_block(&self.write).unwrap();
        ots_ledger::LedgerPayload::decode_write(&block.header.data).unwrap()
    }

    /// A request assembled without the ledger: the genuine write record
    /// re-addressed to `attacker`, a read of it, and a forward link signed
    /// by a committee made of the attacker's key alone. With `rebind_h` the
    /// write's `H` is also replaced by the attacker's point.
    pub fn self_signed_request(&self, attacker: &KeyPair, rebind_h: bool) -> SignedDecryptionRequest {
        let mut write = self.write_record();
        write.reader = attacker.public();
        if rebind_h {
            write.h = point_for_key(&attacker.public());
        }

        let committee = vec![attacker.public()];
        let write_header = BlockHeader {
            index: 1,
            roster: committee.clone(),
            back_link: BlockHash::default(),
            data: LedgerPayload::Write(write).encode(),
        };
        let read_header = BlockHeader {
            index: 2,
            roster: committee.clone(),
            back_link: write_header.hash(),
            data: LedgerPayload::Read(ReadRecord::new(write_header.hash(), attacker)).encode(),
        };
        let read_hash = read_header.hash();
        let proof = ForwardLink {
            from: write_header.hash(),
            hash: read_hash,
            signature: cosi::sign(&[attacker.clone()], read_hash.as_bytes()).unwrap(),
        };

        DecryptionRequest {
            write: write_header,
            read: read_header,
            proof,
            committee,
        }
        .sign(attacker)
    }
}
