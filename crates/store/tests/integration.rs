use std::collections::HashMap;

use chrono::Utc;
use ordermatch_ledger::CanonicalOrderRow;
use ordermatch_store::{
    FileAttachment, FulfillmentStatus, ReconStore, RecordPatch, StoreError,
};

fn attachment(filename: &str, bytes: &[u8]) -> FileAttachment {
    FileAttachment {
        filename: filename.into(),
        bytes: bytes.to_vec(),
        uploaded_at: Utc::now(),
    }
}

fn asn_patch(filename: &str, bytes: &[u8]) -> RecordPatch {
    RecordPatch {
        asn: Some(attachment(filename, bytes)),
        ..Default::default()
    }
}

fn row(key: &str, model: &str, capacity: &str, grade: &str, qty: u32) -> CanonicalOrderRow {
    CanonicalOrderRow {
        order_key: key.into(),
        model: model.into(),
        capacity: capacity.into(),
        grade: grade.into(),
        quantity: qty,
        extra: HashMap::from([("SUPPLIER".to_string(), "ACME".to_string())]),
    }
}

#[test]
fn upsert_creates_lazily_and_patches_partially() {
    let mut store = ReconStore::open_in_memory().unwrap();

    let created = store
        .upsert("INV100", asn_patch("asn.xlsx", b"asn-bytes"))
        .unwrap()
        .unwrap();
    assert_eq!(created.order_key, "INV100");
    assert_eq!(created.created_at, created.updated_at);
    assert!(created.asn_present());
    assert!(!created.identifier_file_present());
    assert_eq!(created.status(), FulfillmentStatus::AsnOnly);

    // A later patch with only notes preserves the ASN attachment.
    let patched = store
        .upsert(
            "INV100",
            RecordPatch {
                notes: Some("short 2 units".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(patched.notes.as_deref(), Some("short 2 units"));
    assert_eq!(
        patched.asn.as_ref().map(|a| a.filename.as_str()),
        Some("asn.xlsx")
    );
    assert_eq!(patched.created_at, created.created_at);
    assert!(patched.updated_at > created.updated_at);
}

#[test]
fn note_only_upsert_creates_a_record() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store
        .upsert(
            "INV200",
            RecordPatch {
                notes: Some("awaiting carrier docs".into()),
                ..Default::default()
            },
        )
        .unwrap();

    let record = store.get("INV200").unwrap().unwrap();
    assert_eq!(record.status(), FulfillmentStatus::Pending);
    assert!(record.asn.is_none());
    assert_eq!(record.notes.as_deref(), Some("awaiting carrier docs"));
}

#[test]
fn both_files_mean_complete() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("asn.csv", b"a")).unwrap();
    let record = store
        .upsert(
            "INV100",
            RecordPatch {
                identifier_file: Some(attachment("imeis.txt", b"352099001761481")),
                identifier_count: Some(1),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(record.status(), FulfillmentStatus::Complete);
    assert_eq!(record.identifier_count, Some(1));
}

#[test]
fn file_payloads_round_trip_losslessly() {
    let mut store = ReconStore::open_in_memory().unwrap();
    let payload: Vec<u8> = (0..=255).collect();
    store.upsert("INV100", asn_patch("asn.bin.xlsx", &payload)).unwrap();

    let record = store.get("INV100").unwrap().unwrap();
    assert_eq!(record.asn.unwrap().bytes, payload);
}

#[test]
fn reconciled_flag_stamps_and_clears_its_timestamp() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("asn.csv", b"a")).unwrap();

    let reconciled = store
        .upsert(
            "INV100",
            RecordPatch {
                reconciled: Some(true),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert!(reconciled.reconciled);
    let stamp = reconciled.reconciled_at.unwrap();

    // Re-asserting true keeps the original stamp.
    let again = store
        .upsert(
            "INV100",
            RecordPatch {
                reconciled: Some(true),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(again.reconciled_at.unwrap(), stamp);

    let unset = store
        .upsert(
            "INV100",
            RecordPatch {
                reconciled: Some(false),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert!(!unset.reconciled);
    assert!(unset.reconciled_at.is_none());
}

#[test]
fn clear_asn_resets_reconciliation() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("asn.csv", b"a")).unwrap();
    store
        .upsert(
            "INV100",
            RecordPatch {
                reconciled: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(store.clear_asn("INV100").unwrap());

    let record = store.get("INV100").unwrap().unwrap();
    assert!(record.asn.is_none());
    assert!(!record.reconciled);
    assert!(record.reconciled_at.is_none());

    // Nothing left to clear the second time around, and unknown keys report
    // the same.
    assert!(!store.clear_asn("INV999").unwrap());
}

#[test]
fn clear_identifier_file_drops_the_count_too() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store
        .upsert(
            "INV100",
            RecordPatch {
                identifier_file: Some(attachment("imeis.csv", b"x")),
                identifier_count: Some(40),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(store.clear_identifier_file("INV100").unwrap());
    let record = store.get("INV100").unwrap().unwrap();
    assert!(record.identifier_file.is_none());
    assert_eq!(record.identifier_count, None);
}

#[test]
fn clear_all_asn_touches_only_asn_holders() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("a.csv", b"a")).unwrap();
    store.upsert("INV101", asn_patch("b.csv", b"b")).unwrap();
    store
        .upsert(
            "INV102",
            RecordPatch {
                identifier_file: Some(attachment("imeis.txt", b"x")),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(store.clear_all_asn().unwrap(), 2);
    assert_eq!(store.clear_all_asn().unwrap(), 0);

    // Identifier evidence on the third record is untouched.
    let untouched = store.get("INV102").unwrap().unwrap();
    assert!(untouched.identifier_file.is_some());
}

#[test]
fn archive_freezes_and_removes_the_live_record() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("asn.xlsx", b"asn-data")).unwrap();
    store
        .upsert(
            "INV100",
            RecordPatch {
                identifier_file: Some(attachment("imeis.csv", b"imei-data")),
                notes: Some("counted twice".into()),
                ..Default::default()
            },
        )
        .unwrap();

    let rows = vec![
        row("INV100", "IPHONE 12", "64GB", "A", 3),
        row("INV100", "IPHONE 12", "64GB", "B", 2),
    ];
    let archived = store.archive("INV100", &rows, 5, 1, None).unwrap();

    assert!(store.get("INV100").unwrap().is_none());
    let fetched = store.get_archived("INV100").unwrap().unwrap();
    assert_eq!(fetched, archived);
    assert_eq!(fetched.total_quantity, Some(5));
    assert_eq!(fetched.distinct_model_count, Some(1));
    assert_eq!(fetched.asn_filename.as_deref(), Some("asn.xlsx"));
    assert_eq!(fetched.asn_bytes.as_deref(), Some(b"asn-data".as_slice()));
    assert_eq!(fetched.identifier_filename.as_deref(), Some("imeis.csv"));
    // Notes fall back to the live record's notes when none are passed.
    assert_eq!(fetched.notes.as_deref(), Some("counted twice"));

    let snapshot = fetched.snapshot_rows().unwrap();
    assert_eq!(snapshot, rows);
    assert_eq!(
        snapshot[0].extra.get("SUPPLIER").map(String::as_str),
        Some("ACME")
    );
}

#[test]
fn archive_without_live_record_keeps_empty_file_fields() {
    let mut store = ReconStore::open_in_memory().unwrap();
    let rows = vec![row("INV300", "IPHONE 13", "128GB", "A", 4)];
    let archived = store
        .archive("INV300", &rows, 4, 1, Some("ledger only"))
        .unwrap();

    assert!(archived.asn_filename.is_none());
    assert!(archived.asn_bytes.is_none());
    assert!(archived.identifier_filename.is_none());
    assert_eq!(archived.notes.as_deref(), Some("ledger only"));
}

#[test]
fn archive_with_nothing_to_snapshot_is_not_found() {
    let mut store = ReconStore::open_in_memory().unwrap();
    let err = store.archive("INV404", &[], 0, 0, None).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(key) if key == "INV404"));
}

#[test]
fn archive_never_overwrites_an_existing_archive() {
    let mut store = ReconStore::open_in_memory().unwrap();
    let rows = vec![row("INV100", "IPHONE 12", "64GB", "A", 3)];
    store.archive("INV100", &rows, 3, 1, None).unwrap();

    // A fresh live record for the same key (re-upload after archive is
    // allowed) ...
    store.upsert("INV100", asn_patch("asn2.csv", b"2")).unwrap();

    // ... but a second archive fails, and the failed transaction leaves the
    // live record in place.
    assert!(store.archive("INV100", &rows, 3, 1, None).is_err());
    assert!(store.get("INV100").unwrap().is_some());
    assert_eq!(
        store.get_archived("INV100").unwrap().unwrap().total_quantity,
        Some(3)
    );
}

#[test]
fn delete_archived_and_delete_live() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("a.csv", b"a")).unwrap();
    store.upsert("INV101", asn_patch("b.csv", b"b")).unwrap();
    store
        .archive("INV100", &[row("INV100", "IPHONE 12", "64GB", "A", 1)], 1, 1, None)
        .unwrap();

    assert!(store.delete_archived("INV100").unwrap());
    assert!(!store.delete_archived("INV100").unwrap());
    assert!(store.get_archived("INV100").unwrap().is_none());

    assert!(store.delete("INV101").unwrap());
    assert!(!store.delete("INV101").unwrap());
}

#[test]
fn listings_are_newest_first() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("a.csv", b"a")).unwrap();
    store.upsert("INV101", asn_patch("b.csv", b"b")).unwrap();
    store.upsert("INV102", asn_patch("c.csv", b"c")).unwrap();

    let keys: Vec<String> = store
        .list_all()
        .unwrap()
        .into_iter()
        .map(|r| r.order_key)
        .collect();
    assert_eq!(keys, vec!["INV102", "INV101", "INV100"]);

    store
        .archive("INV100", &[row("INV100", "IPHONE 12", "64GB", "A", 1)], 1, 1, None)
        .unwrap();
    store
        .archive("INV101", &[row("INV101", "IPHONE 12", "64GB", "A", 1)], 1, 1, None)
        .unwrap();
    let archived_keys: Vec<String> = store
        .list_archived()
        .unwrap()
        .into_iter()
        .map(|a| a.order_key)
        .collect();
    assert_eq!(archived_keys, vec!["INV101", "INV100"]);
}

#[test]
fn order_statistics_counts() {
    let mut store = ReconStore::open_in_memory().unwrap();
    store.upsert("INV100", asn_patch("a.csv", b"a")).unwrap();
    store.upsert("INV101", asn_patch("b.csv", b"b")).unwrap();
    store
        .upsert(
            "INV102",
            RecordPatch {
                identifier_file: Some(attachment("i.txt", b"x")),
                ..Default::default()
            },
        )
        .unwrap();

    let stats = store.order_statistics().unwrap();
    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.with_asn, 2);
    assert_eq!(stats.with_identifier_file, 1);
    assert_eq!(stats.pending, 1);
}

#[test]
fn unconfigured_store_degrades_to_empty_reads_and_noop_writes() {
    let mut store = ReconStore::unconfigured();
    assert!(!store.is_configured());

    assert!(store.upsert("INV100", asn_patch("a.csv", b"a")).unwrap().is_none());
    assert!(store.get("INV100").unwrap().is_none());
    assert!(store.list_all().unwrap().is_empty());
    assert!(store.list_archived().unwrap().is_empty());
    assert!(store.get_archived("INV100").unwrap().is_none());
    assert!(!store.clear_asn("INV100").unwrap());
    assert!(!store.clear_identifier_file("INV100").unwrap());
    assert_eq!(store.clear_all_asn().unwrap(), 0);
    assert_eq!(store.order_statistics().unwrap(), Default::default());

    // Operations that exist only to write do surface the condition.
    assert!(matches!(
        store.archive("INV100", &[], 0, 0, None),
        Err(StoreError::Persistence(_))
    ));
    assert!(matches!(store.delete("INV100"), Err(StoreError::Persistence(_))));
    assert!(matches!(
        store.delete_archived("INV100"),
        Err(StoreError::Persistence(_))
    ));
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.db");

    {
        let mut store = ReconStore::open(&path).unwrap();
        store.upsert("INV100", asn_patch("asn.xlsx", b"payload")).unwrap();
    }

    let store = ReconStore::open(&path).unwrap();
    let record = store.get("INV100").unwrap().unwrap();
    assert_eq!(record.asn.unwrap().bytes, b"payload");
}
