use ots_ledger::{
    BlockHash, LedgerClient, LedgerError, LedgerPayload, MemoryLedger, ReadRecord, WriteRecord,
};
use ots_threshold::pvss::{enc_shares, random_secret};
use ots_threshold::{KeyPair, cosi, generator, point_for_key};

fn write_for(reader: &KeyPair, trustees: usize) -> WriteRecord {
    let mut rng = rand::thread_rng();
    let keys: Vec<_> = (0..trustees).map(|_| KeyPair::random().public()).collect();
    let h = point_for_key(&reader.public());
    let t = 2 * trustees / 3 + 1;
    let (shares, proofs) = enc_shares(&h, &keys, &random_secret(&mut rng), t, &mut rng).unwrap();
    WriteRecord {
        g: generator(),
        h,
        threshold: t as u32,
        pub_keys: keys,
        enc_shares: shares,
        enc_proofs: proofs,
        hash_enc: [9u8; 32],
        reader: reader.public(),
        writer: reader.public(),
        writer_signature: None,
    }
    .sign(&KeyPair::random())
}

#[test]
fn write_then_read_is_linked() {
    let mut ledger = MemoryLedger::with_random_committee(4).unwrap();
    let reader = KeyPair::random();

    let write = ledger.append_write(write_for(&reader, 5)).unwrap();
    let read = ledger.append_read(ReadRecord::new(write, &reader)).unwrap();
    assert_eq!(ledger.height(), 3);

    let read_block = ledger.get_block(&read).unwrap();
    assert_eq!(read_block.header.back_link, write);

    let link = ledger.forward_link_between(&write, &read).unwrap();
    assert_eq!(link.from, write);
    assert_eq!(link.hash, read_block.hash());
    assert!(cosi::verify(&ledger.committee(), link.hash.as_bytes(), &link.signature).is_ok());
    assert_eq!(read_block.header.roster, ledger.committee());
}

#[test]
fn forward_link_offsets_skip_intermediate_blocks() {
    let mut ledger = MemoryLedger::with_random_committee(3).unwrap();
    let reader = KeyPair::random();

    let write = ledger.append_write(write_for(&reader, 4)).unwrap();
    // unrelated writes in between
    ledger.append_write(write_for(&KeyPair::random(), 4)).unwrap();
    ledger.append_write(write_for(&KeyPair::random(), 4)).unwrap();
    let read = ledger.append_read(ReadRecord::new(write, &reader)).unwrap();

    let write_block = ledger.get_block(&write).unwrap();
    assert_eq!(write_block.forward_links.len(), 3);
    assert_eq!(write_block.forward_link(2).unwrap().hash, read);
    assert!(write_block.forward_link(3).is_none());

    // links only point forward
    assert!(matches!(
        ledger.forward_link_between(&read, &write),
        Err(LedgerError::NoForwardLink { .. })
    ));
}

#[test]
fn read_by_someone_else_is_denied() {
    let mut ledger = MemoryLedger::with_random_committee(3).unwrap();
    let reader = KeyPair::random();
    let intruder = KeyPair::random();

    let write = ledger.append_write(write_for(&reader, 4)).unwrap();
    assert_eq!(
        ledger.append_read(ReadRecord::new(write, &intruder)),
        Err(LedgerError::AccessDenied(write))
    );
}

#[test]
fn forged_read_signature_is_rejected() {
    let mut ledger = MemoryLedger::with_random_committee(3).unwrap();
    let reader = KeyPair::random();
    let write = ledger.append_write(write_for(&reader, 4)).unwrap();

    let mut read = ReadRecord::new(write, &KeyPair::random());
    read.reader = reader.public();
    assert_eq!(ledger.append_read(read), Err(LedgerError::BadReaderSignature));
}

#[test]
fn read_must_point_at_a_write() {
    let mut ledger = MemoryLedger::with_random_committee(3).unwrap();
    let reader = KeyPair::random();
    let write = ledger.append_write(write_for(&reader, 4)).unwrap();
    let read = ledger.append_read(ReadRecord::new(write, &reader)).unwrap();

    assert_eq!(
        ledger.append_read(ReadRecord::new(read, &reader)),
        Err(LedgerError::NotAWrite(read))
    );
    let missing = BlockHash([0xabu8; 32]);
    assert_eq!(
        ledger.append_read(ReadRecord::new(missing, &reader)),
        Err(LedgerError::UnknownBlock(missing))
    );
}

#[test]
fn write_with_bad_shares_is_refused() {
    let mut ledger = MemoryLedger::with_random_committee(3).unwrap();
    let reader = KeyPair::random();

    // re-signed, so only the share check can fail
    let mut write = write_for(&reader, 4);
    write.enc_shares[1].value = write.enc_shares[2].value;
    let write = write.sign(&KeyPair::random());
    assert_eq!(
        ledger.append_write(write),
        Err(LedgerError::InvalidShares { valid: 3, n: 4 })
    );

    let mut write = write_for(&reader, 4);
    write.enc_proofs.pop();
    assert!(matches!(
        ledger.append_write(write),
        Err(LedgerError::InvalidWrite(_))
    ));

    let mut write = write_for(&reader, 4);
    write.h = point_for_key(&KeyPair::random().public());
    assert!(matches!(
        ledger.append_write(write),
        Err(LedgerError::InvalidWrite(_))
    ));
}

#[test]
fn write_must_carry_its_writer_signature() {
    let mut ledger = MemoryLedger::with_random_committee(3).unwrap();
    let reader = KeyPair::random();

    let mut unsigned = write_for(&reader, 4);
    unsigned.writer_signature = None;
    assert_eq!(ledger.append_write(unsigned), Err(LedgerError::BadWriterSignature));

    // hash of the sealed payload swapped after signing
    let mut swapped = write_for(&reader, 4);
    swapped.hash_enc = [1u8; 32];
    assert_eq!(ledger.append_write(swapped), Err(LedgerError::BadWriterSignature));

    // signature lifted onto another key
    let mut stolen = write_for(&reader, 4);
    stolen.writer = KeyPair::random().public();
    assert_eq!(ledger.append_write(stolen), Err(LedgerError::BadWriterSignature));

    assert_eq!(ledger.height(), 1);
}

#[test]
fn stored_payload_decodes_to_the_write() {
    let mut ledger = MemoryLedger::with_random_committee(2).unwrap();
    let reader = KeyPair::random();
    let record = write_for(&reader, 3);
    let hash = ledger.append_write(record.clone()).unwrap();

    let block = ledger.get_block(&hash).unwrap();
    let stored = LedgerPayload::decode_write(&block.header.data).unwrap();
    assert!(stored.verify_writer_signature());
    assert_eq!(stored, record);
}
