use sample_vault_core::hasher::FileInfo;
use sample_vault_core::storage::{Added, Catalog, Repository, Stored};
use sample_vault_core::{Error, Vault};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

const EICAR: &[u8] = b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";
const EICAR_SHA256: &str = "275a021bbfb6489e54d471899f7db9d1663fc695ec2fe2a2c4538aabf651fd0f";

fn sample(name: &str, content: &str) -> FileInfo {
    FileInfo::from_bytes(name, content.as_bytes())
}

#[test]
fn test_add_sample_twice_is_duplicate() {
    let catalog = Catalog::open_in_memory().unwrap();
    let info = FileInfo::from_bytes("eicar.com", EICAR);
    assert_eq!(info.sha256, EICAR_SHA256);

    assert!(matches!(
        catalog.add_sample(&info, None).unwrap(),
        Added::Created(_)
    ));
    assert_eq!(
        catalog.add_sample(&info, Some("mal")).unwrap(),
        Added::DuplicateDigest
    );
    assert_eq!(catalog.count().unwrap(), 1);

    // The duplicate insert must not have attached its tags.
    let stored = catalog.get_by_sha256(EICAR_SHA256).unwrap().unwrap();
    assert!(stored.tags.is_empty());
}

#[test]
fn test_get_by_sha256_roundtrips_fields() {
    let catalog = Catalog::open_in_memory().unwrap();
    let info = FileInfo::from_bytes("eicar.com", EICAR);
    catalog.add_sample(&info, Some("Mal, test")).unwrap();

    let stored = catalog.get_by_sha256(EICAR_SHA256).unwrap().unwrap();
    assert_eq!(stored.name, "eicar.com");
    assert_eq!(stored.size, 68);
    assert_eq!(stored.md5, "44d88612fea8a8f36de82e1278abb02f");
    assert_eq!(stored.sha1, "3395856ce81f2b7382dee72602f798b642f14140");
    assert_eq!(stored.crc32, info.crc32);
    assert_eq!(stored.ssdeep.as_deref(), Some(info.ssdeep.as_str()));
    assert_eq!(stored.tags, vec!["mal", "test"]);
    assert_eq!(stored.parent, None);

    assert!(catalog.get_by_sha256(&"0".repeat(64)).unwrap().is_none());
}

#[test]
fn test_find_by_each_key() {
    let catalog = Catalog::open_in_memory().unwrap();
    let a = sample("dropper.exe", "first sample");
    let b = sample("payload.dll", "second sample");
    catalog.add_sample(&a, Some("mal")).unwrap();
    catalog.add_sample(&b, None).unwrap();

    assert_eq!(catalog.find("md5", &a.md5).unwrap()[0].sha256, a.sha256);
    assert_eq!(catalog.find("sha1", &b.sha1).unwrap()[0].sha256, b.sha256);
    assert_eq!(
        catalog.find("sha256", &a.sha256.to_uppercase()).unwrap().len(),
        1
    );
    assert_eq!(catalog.find("sha512", &b.sha512).unwrap().len(), 1);
    assert_eq!(
        catalog.find("crc32", &a.crc32.to_lowercase()).unwrap().len(),
        1
    );
    assert_eq!(catalog.find("tag", "MAL").unwrap().len(), 1);
    assert_eq!(catalog.find("name", "payload").unwrap().len(), 1);
    assert_eq!(catalog.find("name", "*.exe").unwrap().len(), 1);
    assert_eq!(catalog.find("all", "").unwrap().len(), 2);
}

#[test]
fn test_find_name_treats_like_metacharacters_literally() {
    let catalog = Catalog::open_in_memory().unwrap();
    catalog.add_sample(&sample("a_b.exe", "one"), None).unwrap();
    catalog.add_sample(&sample("axb.exe", "two"), None).unwrap();
    catalog.add_sample(&sample("100%.exe", "three"), None).unwrap();
    catalog.add_sample(&sample("1000.exe", "four"), None).unwrap();

    let names = |value: &str| -> Vec<String> {
        catalog
            .find("name", value)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect()
    };
    assert_eq!(names("a_b"), vec!["a_b.exe"]);
    assert_eq!(names("100%"), vec!["100%.exe"]);
    assert_eq!(names("a_*"), vec!["a_b.exe"]);
    assert_eq!(names("*.exe").len(), 4);
}

#[test]
fn test_find_ssdeep_substring_is_literal() {
    let catalog = Catalog::open_in_memory().unwrap();
    let info = sample("a.bin", "some sample content");
    catalog.add_sample(&info, None).unwrap();

    let block = info.ssdeep.split(':').next().unwrap();
    assert_eq!(catalog.find("ssdeep", &info.ssdeep).unwrap().len(), 1);
    assert!(catalog
        .find("ssdeep", &format!("{}_", block))
        .unwrap()
        .is_empty());
}

#[test]
fn test_find_unknown_key_or_empty_value_matches_nothing() {
    let catalog = Catalog::open_in_memory().unwrap();
    catalog.add_sample(&sample("a.bin", "aaa"), None).unwrap();

    assert!(catalog.find("color", "blue").unwrap().is_empty());
    assert!(catalog.find("name", "").unwrap().is_empty());
    assert!(catalog.find("tag", "  ").unwrap().is_empty());
}

#[test]
fn test_find_by_hash_rejects_bad_length() {
    let catalog = Catalog::open_in_memory().unwrap();
    let err = catalog.find_by_hash("abc123").unwrap_err();
    assert!(matches!(err, Error::InvalidHashFormat(_)));

    let err = catalog.find_by_hash(&"z".repeat(64)).unwrap_err();
    assert!(matches!(err, Error::InvalidHashFormat(_)));
}

#[test]
fn test_find_by_hash_any_family() {
    let catalog = Catalog::open_in_memory().unwrap();
    let info = FileInfo::from_bytes("eicar.com", EICAR);
    catalog.add_sample(&info, None).unwrap();

    for hash in [&info.md5, &info.sha1, &info.sha256, &info.sha512] {
        let found = catalog.find_by_hash(hash).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sha256, EICAR_SHA256);
    }
}

#[test]
fn test_list_latest_newest_first() {
    let catalog = Catalog::open_in_memory().unwrap();
    for i in 0..4 {
        catalog
            .add_sample(&sample(&format!("s{}.bin", i), &format!("content {}", i)), None)
            .unwrap();
    }

    let latest = catalog.list_latest(3).unwrap();
    assert_eq!(latest.len(), 3);
    assert_eq!(latest[0].name, "s3.bin");
    assert_eq!(latest[2].name, "s1.bin");
    assert!(catalog.list_latest(0).unwrap().is_empty());
}

#[test]
fn test_add_tags_is_idempotent() {
    let catalog = Catalog::open_in_memory().unwrap();
    let info = FileInfo::from_bytes("eicar.com", EICAR);
    catalog.add_sample(&info, None).unwrap();

    catalog.add_tags(EICAR_SHA256, "mal,test").unwrap();
    catalog.add_tags(EICAR_SHA256, "mal").unwrap();

    let stored = catalog.get_by_sha256(EICAR_SHA256).unwrap().unwrap();
    assert_eq!(stored.tags, vec!["mal", "test"]);

    let tags = catalog.list_tags().unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().all(|t| t.count == 1));
}

#[test]
fn test_tags_shared_between_samples() {
    let catalog = Catalog::open_in_memory().unwrap();
    let a = sample("a.bin", "aaaa");
    let b = sample("b.bin", "bbbb");
    catalog.add_sample(&a, Some("mal")).unwrap();
    catalog.add_sample(&b, Some("mal,packed")).unwrap();

    let tags = catalog.list_tags().unwrap();
    assert_eq!(tags[0].tag, "mal");
    assert_eq!(tags[0].count, 2);
    assert_eq!(tags[1].tag, "packed");
    assert_eq!(tags[1].count, 1);
}

#[test]
fn test_delete_tag_prunes_unused() {
    let catalog = Catalog::open_in_memory().unwrap();
    let info = sample("a.bin", "aaaa");
    catalog.add_sample(&info, Some("mal,packed")).unwrap();

    assert!(catalog.delete_tag(&info.sha256, "packed").unwrap());
    assert!(!catalog.delete_tag(&info.sha256, "packed").unwrap());

    let tags = catalog.list_tags().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].tag, "mal");
}

#[test]
fn test_add_tags_to_unknown_sample() {
    let catalog = Catalog::open_in_memory().unwrap();
    let err = catalog.add_tags(&"a".repeat(64), "mal").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_parent_links_and_children() {
    let catalog = Catalog::open_in_memory().unwrap();
    let parent = sample("archive.zip", "parent");
    let child = sample("dropped.exe", "child");
    catalog.add_sample(&parent, None).unwrap();
    catalog.add_sample(&child, None).unwrap();

    catalog.add_parent(&child.sha256, &parent.sha256).unwrap();
    let stored = catalog.get_by_sha256(&child.sha256).unwrap().unwrap();
    assert_eq!(stored.parent.as_deref(), Some(parent.sha256.as_str()));

    let children = catalog.children(&parent.sha256).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].sha256, child.sha256);

    catalog.delete_parent(&child.sha256).unwrap();
    let stored = catalog.get_by_sha256(&child.sha256).unwrap().unwrap();
    assert_eq!(stored.parent, None);
}

#[test]
fn test_parent_cycles_rejected() {
    let catalog = Catalog::open_in_memory().unwrap();
    let a = sample("a", "aaaa");
    let b = sample("b", "bbbb");
    let c = sample("c", "cccc");
    for info in [&a, &b, &c] {
        catalog.add_sample(info, None).unwrap();
    }

    catalog.add_parent(&b.sha256, &a.sha256).unwrap();
    catalog.add_parent(&c.sha256, &b.sha256).unwrap();

    let err = catalog.add_parent(&a.sha256, &c.sha256).unwrap_err();
    assert!(matches!(err, Error::CatalogConstraint(_)));
    let err = catalog.add_parent(&a.sha256, &a.sha256).unwrap_err();
    assert!(matches!(err, Error::CatalogConstraint(_)));
}

#[test]
fn test_parent_must_be_cataloged() {
    let catalog = Catalog::open_in_memory().unwrap();
    let child = sample("child", "child");
    catalog.add_sample(&child, None).unwrap();

    let err = catalog.add_parent(&child.sha256, &"b".repeat(64)).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_delete_clears_child_parent() {
    let catalog = Catalog::open_in_memory().unwrap();
    let parent = sample("p", "parent");
    let child = sample("c", "child");
    let Added::Created(parent_id) = catalog.add_sample(&parent, None).unwrap() else {
        panic!("expected a new row");
    };
    catalog.add_sample(&child, Some("mal")).unwrap();
    catalog.add_parent(&child.sha256, &parent.sha256).unwrap();

    catalog.delete(parent_id).unwrap();
    assert!(catalog.get_by_sha256(&parent.sha256).unwrap().is_none());
    let stored = catalog.get_by_sha256(&child.sha256).unwrap().unwrap();
    assert_eq!(stored.parent, None);

    assert!(matches!(catalog.delete(parent_id), Err(Error::NotFound(_))));
}

#[test]
fn test_catalog_persists_on_disk() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let info = FileInfo::from_bytes("eicar.com", EICAR);
    {
        let catalog = Catalog::open(&db_path).unwrap();
        catalog.add_sample(&info, Some("mal")).unwrap();
    }

    let catalog = Catalog::open(&db_path).unwrap();
    let stored = catalog.get_by_sha256(EICAR_SHA256).unwrap().unwrap();
    assert_eq!(stored.tags, vec!["mal"]);
}

#[test]
fn test_ingest_twice_stores_once() {
    let dir = tempdir().unwrap();
    let vault = Vault::new(
        Repository::new(dir.path().join("repo")),
        Catalog::open_in_memory().unwrap(),
    );
    let source = dir.path().join("eicar.com");
    fs::write(&source, EICAR).unwrap();
    let info = FileInfo::from_path(&source).unwrap();

    let first = vault.ingest_file(&info, &source, None).unwrap();
    assert!(first.is_new());
    assert!(matches!(first.bytes, Stored::Written(_)));

    let second = vault.ingest_file(&info, &source, None).unwrap();
    assert!(!second.is_new());
    assert!(matches!(second.bytes, Stored::AlreadyStored(_)));
    assert_eq!(first.path(), second.path());

    assert_eq!(vault.catalog.count().unwrap(), 1);
    assert_eq!(fs::read(first.path()).unwrap(), EICAR);
    assert!(first
        .path()
        .ends_with(format!("2/7/5/a/{}", EICAR_SHA256)));
}

#[test]
fn test_ingest_repairs_orphaned_bytes() {
    let dir = tempdir().unwrap();
    let vault = Vault::new(
        Repository::new(dir.path().join("repo")),
        Catalog::open_in_memory().unwrap(),
    );
    let info = FileInfo::from_bytes("eicar.com", EICAR);

    // Bytes present without a row, as after a crash between the two writes.
    vault.repository.store(EICAR_SHA256, EICAR).unwrap();

    let ingest = vault.ingest_bytes(&info, EICAR, Some("mal")).unwrap();
    assert!(ingest.is_new());
    assert!(matches!(ingest.bytes, Stored::AlreadyStored(_)));
    assert!(vault.catalog.get_by_sha256(EICAR_SHA256).unwrap().is_some());
}

#[test]
fn test_retrieve_missing_creates_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("repo");
    let repository = Repository::new(&root);

    let err = repository.retrieve(EICAR_SHA256).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!root.exists());
}

#[test]
fn test_concurrent_ingest_same_digest() {
    let dir = tempdir().unwrap();
    let vault = Arc::new(Vault::new(
        Repository::new(dir.path().join("repo")),
        Catalog::open(dir.path().join("catalog.db")).unwrap(),
    ));
    let info = FileInfo::from_bytes("eicar.com", EICAR);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let vault = Arc::clone(&vault);
            let info = info.clone();
            thread::spawn(move || vault.ingest_bytes(&info, EICAR, Some("mal")).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // One writer and one row, possibly from different threads.
    let written = results
        .iter()
        .filter(|i| matches!(i.bytes, Stored::Written(_)))
        .count();
    let created = results.iter().filter(|i| i.is_new()).count();
    let duplicates = results
        .iter()
        .filter(|i| i.row == Added::DuplicateDigest)
        .count();
    assert_eq!(written, 1);
    assert_eq!(created, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(vault.catalog.count().unwrap(), 1);
    assert_eq!(fs::read(results[0].path()).unwrap(), EICAR);
}

#[test]
fn test_catalog_delete_keeps_stored_bytes() {
    let dir = tempdir().unwrap();
    let vault = Vault::new(
        Repository::new(dir.path().join("repo")),
        Catalog::open_in_memory().unwrap(),
    );
    let info = FileInfo::from_bytes("eicar.com", EICAR);
    let ingest = vault.ingest_bytes(&info, EICAR, Some("mal,test")).unwrap();
    let Added::Created(id) = ingest.row else {
        panic!("expected a new row");
    };

    vault.catalog.delete(id).unwrap();

    assert!(vault.catalog.get_by_sha256(EICAR_SHA256).unwrap().is_none());
    assert!(vault.catalog.list_tags().unwrap().is_empty());
    assert_eq!(vault.repository.retrieve(EICAR_SHA256).unwrap(), ingest.path());
}

#[cfg(unix)]
#[test]
fn test_vault_open_restricts_repository_root() {
    use sample_vault_core::AppConfig;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = dir.path().join("vault");
    let config = AppConfig {
        repository_root: root.clone(),
        ..Default::default()
    };
    Vault::open(&config).unwrap();

    let mode = fs::metadata(&root).unwrap().permissions().mode();
    assert_eq!(mode & 0o007, 0);
    assert!(root.join("catalog.db").is_file());
}
