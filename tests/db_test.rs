use nestdb::util::{decode_u64, encode_u64};
use nestdb::{CompressionType, Db, Options, Slice, TxOptions};
use tempfile::TempDir;

fn open_test_db(dir: &TempDir) -> Db {
    Db::open(dir.path().join("test.db")).unwrap()
}

#[test]
fn test_simple_access() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    for bucket_id in 1..=2 {
        for key_id in 1..=2 {
            db.put(
                &Slice::from(format!("bucket-{bucket_id}")),
                Slice::from(format!("key-{key_id}")),
                Slice::from(format!("value-{key_id}")),
            )
            .unwrap();
        }
    }

    for bucket_id in 1..=2 {
        for key_id in 1..=2 {
            let value = db
                .get(
                    &Slice::from(format!("bucket-{bucket_id}")),
                    &Slice::from(format!("key-{key_id}")),
                )
                .unwrap();
            assert_eq!(value, Some(Slice::from(format!("value-{key_id}"))));
        }
    }

    db.delete(&Slice::from("bucket-1"), &Slice::from("key-1"))
        .unwrap();
    let value = db
        .get(&Slice::from("bucket-1"), &Slice::from("key-1"))
        .unwrap();
    assert_eq!(value, None);
}

#[test]
fn test_get_from_missing_bucket_is_absent() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    let value = db
        .get(&Slice::from("no-such-bucket"), &Slice::from("key"))
        .unwrap();
    assert_eq!(value, None);

    // Deleting in a missing bucket is equally quiet.
    db.delete(&Slice::from("no-such-bucket"), &Slice::from("key"))
        .unwrap();
}

#[test]
fn test_invalid_path_is_not_absorbed() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    let err = db.get(&Slice::from("///"), &Slice::from("key")).unwrap_err();
    assert!(err.is_invalid_path());

    let err = db
        .put(&Slice::from(""), Slice::from("key"), Slice::from("value"))
        .unwrap_err();
    assert!(err.is_invalid_path());
}

#[test]
fn test_transaction() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    db.within_tx(TxOptions::default(), |tx| {
        for bucket_id in 11..=12 {
            let bucket = tx.bucket(&Slice::from(format!("bucket-{bucket_id}")))?;
            for key_id in 11..=12 {
                bucket.put(
                    Slice::from(format!("key-{key_id}")),
                    Slice::from(format!("value-{key_id}")),
                )?;
            }
        }
        Ok(())
    })
    .unwrap();

    db.within_tx(TxOptions { read_only: true }, |tx| {
        for bucket_id in 11..=12 {
            let bucket = tx.bucket(&Slice::from(format!("bucket-{bucket_id}")))?;
            for key_id in 11..=12 {
                let value = bucket.get(&Slice::from(format!("key-{key_id}")))?;
                assert_eq!(value, Some(Slice::from(format!("value-{key_id}"))));
            }
        }
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_rollback_discards_changes() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    let tx = db.begin_tx(TxOptions::default()).unwrap();
    tx.bucket(&Slice::from("bucket"))
        .unwrap()
        .put(Slice::from("key"), Slice::from("value"))
        .unwrap();
    tx.rollback();

    let value = db.get(&Slice::from("bucket"), &Slice::from("key")).unwrap();
    assert_eq!(value, None);
}

#[test]
fn test_failed_operation_rolls_back() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    let err = db
        .within_tx(TxOptions::default(), |tx| {
            let bucket = tx.bucket(&Slice::from("bucket"))?;
            bucket.put(Slice::from("key"), Slice::from("value"))?;
            Err::<(), _>(nestdb::Status::invalid_argument("operation failed"))
        })
        .unwrap_err();
    assert!(err.is_invalid_argument());

    let value = db.get(&Slice::from("bucket"), &Slice::from("key")).unwrap();
    assert_eq!(value, None);
}

#[test]
fn test_commit_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");

    {
        let db = Db::open(&path).unwrap();
        db.put(
            &Slice::from("config/net"),
            Slice::from("port"),
            Slice::from("8080"),
        )
        .unwrap();
    }

    let db = Db::open(&path).unwrap();
    let value = db
        .get(&Slice::from("config/net"), &Slice::from("port"))
        .unwrap();
    assert_eq!(value, Some(Slice::from("8080")));
}

#[test]
fn test_read_only_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");

    {
        let db = Db::open(&path).unwrap();
        db.put(
            &Slice::from("bucket"),
            Slice::from("key"),
            Slice::from("value"),
        )
        .unwrap();
    }

    let db = Db::open_with_options(
        &path,
        Options {
            read_only: true,
            ..Options::default()
        },
    )
    .unwrap();
    assert!(db.is_read_only());

    // Reads work.
    let value = db.get(&Slice::from("bucket"), &Slice::from("key")).unwrap();
    assert_eq!(value, Some(Slice::from("value")));

    // A write transaction is rejected at begin.
    let err = db.begin_tx(TxOptions::default()).unwrap_err();
    assert!(err.is_database_read_only());
}

#[test]
fn test_open_missing_file_read_only_fails() {
    let dir = TempDir::new().unwrap();
    let err = Db::open_with_options(
        dir.path().join("missing.db"),
        Options {
            read_only: true,
            ..Options::default()
        },
    )
    .unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn test_open_creates_containing_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deeply/nested/dir/test.db");
    let db = Db::open(&path).unwrap();
    db.put(&Slice::from("b"), Slice::from("k"), Slice::from("v"))
        .unwrap();
    assert!(path.exists());
}

#[test]
fn test_read_only_tx_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);
    db.put(
        &Slice::from("bucket"),
        Slice::from("key"),
        Slice::from("value"),
    )
    .unwrap();

    db.within_tx(TxOptions { read_only: true }, |tx| {
        assert!(tx.is_read_only());
        let bucket = tx.bucket(&Slice::from("bucket"))?;

        let err = bucket
            .put(Slice::from("key2"), Slice::from("value2"))
            .unwrap_err();
        assert!(err.is_tx_not_writable());

        let err = bucket.delete(&Slice::from("key")).unwrap_err();
        assert!(err.is_tx_not_writable());

        let err = bucket.next_sequence().unwrap_err();
        assert!(err.is_tx_not_writable());

        let err = tx.delete_bucket(&Slice::from("bucket")).unwrap_err();
        assert!(err.is_tx_not_writable());

        Ok(())
    })
    .unwrap();
}

#[test]
fn test_read_only_tx_commit_discards() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    let tx = db.begin_tx(TxOptions { read_only: true }).unwrap();
    tx.commit().unwrap();
}

#[test]
fn test_snapshot_isolation() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);
    db.put(
        &Slice::from("bucket"),
        Slice::from("key"),
        Slice::from("old"),
    )
    .unwrap();

    let reader = db.begin_tx(TxOptions { read_only: true }).unwrap();

    // A writer commits while the reader is open.
    let writer = db.begin_tx(TxOptions::default()).unwrap();
    writer
        .bucket(&Slice::from("bucket"))
        .unwrap()
        .put(Slice::from("key"), Slice::from("new"))
        .unwrap();
    writer.commit().unwrap();

    // The reader still observes its snapshot.
    let value = reader
        .bucket(&Slice::from("bucket"))
        .unwrap()
        .get(&Slice::from("key"))
        .unwrap();
    assert_eq!(value, Some(Slice::from("old")));
    reader.rollback();

    let value = db.get(&Slice::from("bucket"), &Slice::from("key")).unwrap();
    assert_eq!(value, Some(Slice::from("new")));
}

#[test]
fn test_next_sequence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");

    {
        let db = Db::open(&path).unwrap();
        db.within_tx(TxOptions::default(), |tx| {
            let bucket = tx.bucket(&Slice::from("events"))?;
            for expected in 1..=3u64 {
                let sequence = bucket.next_sequence()?;
                assert_eq!(sequence, expected);
                bucket.put(
                    Slice::new(encode_u64(sequence).to_vec()),
                    Slice::from(format!("event-{sequence}")),
                )?;
            }
            Ok(())
        })
        .unwrap();
    }

    // The counter survives a reopen.
    let db = Db::open(&path).unwrap();
    db.within_tx(TxOptions::default(), |tx| {
        let bucket = tx.bucket(&Slice::from("events"))?;
        assert_eq!(bucket.next_sequence()?, 4);

        let value = bucket.get(&Slice::new(encode_u64(2).to_vec()))?;
        assert_eq!(value, Some(Slice::from("event-2")));
        assert_eq!(decode_u64(&encode_u64(2)), 2);
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_compression_is_recorded_in_file() {
    let dir = TempDir::new().unwrap();

    for (name, compression) in [
        ("none.db", CompressionType::None),
        ("snappy.db", CompressionType::Snappy),
        ("lz4.db", CompressionType::Lz4),
    ] {
        let path = dir.path().join(name);
        {
            let db = Db::open_with_options(
                &path,
                Options {
                    compression,
                    ..Options::default()
                },
            )
            .unwrap();
            db.put(
                &Slice::from("bucket"),
                Slice::from("key"),
                Slice::from("value"),
            )
            .unwrap();
        }

        // Reopening with default options must not matter: the file header
        // names the compression.
        let db = Db::open(&path).unwrap();
        let value = db.get(&Slice::from("bucket"), &Slice::from("key")).unwrap();
        assert_eq!(value, Some(Slice::from("value")));
    }
}

#[test]
fn test_corrupt_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    {
        let db = Db::open(&path).unwrap();
        db.put(
            &Slice::from("bucket"),
            Slice::from("key"),
            Slice::from("value"),
        )
        .unwrap();
    }

    // Flip one payload byte.
    let mut raw = std::fs::read(&path).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    std::fs::write(&path, &raw).unwrap();

    let err = Db::open(&path).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_statistics_are_recorded() {
    let dir = TempDir::new().unwrap();
    let db = open_test_db(&dir);

    db.put(
        &Slice::from("bucket"),
        Slice::from("key"),
        Slice::from("value"),
    )
    .unwrap();
    db.get(&Slice::from("bucket"), &Slice::from("key")).unwrap();
    db.delete(&Slice::from("bucket"), &Slice::from("key"))
        .unwrap();

    let stats = db.statistics();
    assert_eq!(stats.num_keys_written(), 1);
    assert_eq!(stats.num_keys_read(), 1);
    assert_eq!(stats.num_keys_deleted(), 1);
    assert!(stats.num_commits() >= 2);
    assert!(stats.num_snapshot_writes() >= 3);
}
