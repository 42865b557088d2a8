//! End-to-end recovery tests against segment files on disk.

use blockdex_core::metadata::schema;
use blockdex_core::{CoreError, Location, Network, RecoveryConfig, RecoveryDriver, TailCursor};
use blockdex_testkit::prelude::*;
use proptest::prelude::*;
use std::fs;

fn assert_index_matches_writer(store: &TestBlockStore) {
    let metadata = store.open_metadata().unwrap();

    let mut expected: Vec<_> = store
        .writer
        .index()
        .iter()
        .map(|entry| (entry.hash, entry.location))
        .collect();
    expected.sort_by_key(|(hash, _)| *hash);
    assert_eq!(schema::indexed_blocks(&metadata).unwrap(), expected);

    assert_eq!(
        schema::tail_cursor(&metadata).unwrap(),
        Some(store.writer.tail())
    );
}

#[test]
fn empty_block_directory() {
    let store = TestBlockStore::new(Network::Mainnet, 4096);
    assert_eq!(store.recover().unwrap(), 0);

    let metadata = store.open_metadata().unwrap();
    assert!(schema::indexed_blocks(&metadata).unwrap().is_empty());
    assert_eq!(
        schema::tail_cursor(&metadata).unwrap(),
        Some(TailCursor::new(0, 0))
    );
    assert_eq!(
        schema::version(&metadata).unwrap(),
        Some(schema::METADATA_VERSION)
    );
}

#[test]
fn chain_across_many_segments() {
    let mut store = TestBlockStore::new(Network::Mainnet, 1024);
    store.append_all(&sample_chain(40, 200));
    assert!(store.writer.segment_count() > 5);

    assert_eq!(store.recover().unwrap(), 40);
    assert_index_matches_writer(&store);
}

#[test]
fn record_filling_segment_exactly_rolls_over() {
    let mut store = TestBlockStore::new(Network::Testnet, 4096);
    let first = store.writer.append(&sample_block(1, 10)).unwrap();
    store.writer.sync().unwrap();

    // Size the first segment to end exactly at the first record.
    let seg0 = store.dir.segment_path(0);
    assert_eq!(fs::metadata(&seg0).unwrap().len(), u64::from(first.span));

    let next = sample_block(2, 10);
    let frame = blockdex_core::segment::encode_frame(
        Network::Testnet.magic(),
        &blockdex_codec::encode_block(&next).unwrap(),
    )
    .unwrap();
    write_raw_segment(store.dir.path(), 1, &frame);

    assert_eq!(store.recover().unwrap(), 2);
    let metadata = store.open_metadata().unwrap();
    assert_eq!(
        schema::block_location(&metadata, &next.hash()).unwrap(),
        Some(Location::new(1, 0, frame.len() as u32))
    );
    assert_eq!(
        schema::tail_cursor(&metadata).unwrap(),
        Some(TailCursor::new(1, frame.len() as u32))
    );
}

#[test]
fn second_recovery_is_refused() {
    let mut store = TestBlockStore::new(Network::Mainnet, 4096);
    store.append_all(&sample_chain(3, 0));

    assert_eq!(store.recover().unwrap(), 3);
    assert!(matches!(
        store.recover(),
        Err(CoreError::AlreadyExists { .. })
    ));
    assert_index_matches_writer(&store);
}

#[test]
fn torn_tail_leaves_no_index() {
    let mut store = TestBlockStore::new(Network::Mainnet, 1 << 20);
    store.append_all(&sample_chain(5, 50));

    let seg0 = store.dir.segment_path(0);
    let len = fs::metadata(&seg0).unwrap().len();
    let file = fs::OpenOptions::new().write(true).open(&seg0).unwrap();
    file.set_len(len - 7).unwrap();
    drop(file);

    let err = store.recover().unwrap_err();
    assert!(matches!(err, CoreError::Decode { segment: 0, .. }));

    let metadata = store.open_metadata().unwrap();
    assert!(schema::indexed_blocks(&metadata).unwrap().is_empty());
    assert_eq!(schema::tail_cursor(&metadata).unwrap(), None);
}

#[test]
fn flipped_payload_byte_is_detected() {
    let mut store = TestBlockStore::new(Network::Mainnet, 1 << 20);
    store.append_all(&sample_chain(2, 20));

    let seg0 = store.dir.segment_path(0);
    let mut bytes = fs::read(&seg0).unwrap();
    let last = bytes.len() - 10;
    bytes[last] ^= 0x01;
    fs::write(&seg0, bytes).unwrap();

    assert!(store.recover().unwrap_err().is_corruption());
}

#[test]
fn gap_in_segment_numbers_ends_scan() {
    let mut store = TestBlockStore::new(Network::Mainnet, 4096);
    store.append_all(&[sample_block(1, 0)]);
    write_raw_segment(store.dir.path(), 2, b"never reached");

    assert_eq!(store.recover().unwrap(), 1);
}

#[test]
fn segments_for_other_network_are_rejected() {
    let mut store = TestBlockStore::new(Network::Testnet, 4096);
    store.append_all(&[sample_block(1, 0)]);

    let err = RecoveryDriver::new(RecoveryConfig::default().network(Network::Mainnet))
        .recover(store.dir.path())
        .unwrap_err();
    assert!(matches!(err, CoreError::Decode { .. }));
}

#[test]
fn oversized_payload_is_rejected() {
    let mut store = TestBlockStore::new(Network::Mainnet, 1 << 20);
    store.append_all(&[sample_block(1, 4096)]);

    let err = RecoveryDriver::new(RecoveryConfig::default().max_block_payload(1024))
        .recover(store.dir.path())
        .unwrap_err();
    assert!(matches!(err, CoreError::Decode { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn recovery_rebuilds_writer_index(
        blocks in block_sequence_strategy(24),
        max_segment_size in 256u64..4096,
    ) {
        let mut store = TestBlockStore::new(Network::Mainnet, max_segment_size);
        store.append_all(&blocks);

        prop_assert_eq!(store.recover().unwrap(), blocks.len() as u64);

        let metadata = store.open_metadata().unwrap();
        for entry in store.writer.index() {
            prop_assert_eq!(
                schema::block_location(&metadata, &entry.hash).unwrap(),
                Some(entry.location)
            );
        }
        prop_assert_eq!(
            schema::indexed_blocks(&metadata).unwrap().len(),
            blocks.len()
        );
        prop_assert_eq!(schema::tail_cursor(&metadata).unwrap(), Some(store.writer.tail()));
    }
}
