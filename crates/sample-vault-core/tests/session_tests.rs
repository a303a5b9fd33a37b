use sample_vault_core::hasher::FileInfo;
use sample_vault_core::session::{FetchError, Fetcher};
use sample_vault_core::storage::{Catalog, Repository};
use sample_vault_core::{Error, Session, Vault};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const EICAR: &[u8] = b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

fn setup() -> (TempDir, Vault) {
    let dir = tempdir().unwrap();
    let vault = Vault::new(
        Repository::new(dir.path().join("repo")),
        Catalog::open_in_memory().unwrap(),
    );
    (dir, vault)
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

struct StaticFetcher(Vec<u8>);

impl Fetcher for StaticFetcher {
    fn fetch(&self, _url: &str, _use_tor: bool) -> Result<Vec<u8>, FetchError> {
        Ok(self.0.clone())
    }
}

struct FailingFetcher;

impl Fetcher for FailingFetcher {
    fn fetch(&self, url: &str, _use_tor: bool) -> Result<Vec<u8>, FetchError> {
        Err(format!("connection refused: {}", url).into())
    }
}

#[test]
fn test_new_session_is_closed() {
    let session = Session::new();
    assert!(!session.is_open());
    assert!(matches!(session.require_open(), Err(Error::SessionRequired)));
    assert!(session.find_results().is_empty());
}

#[test]
fn test_open_uncataloged_file() {
    let (dir, vault) = setup();
    let path = write_file(dir.path(), "eicar.com", EICAR);

    let mut session = Session::new();
    let snapshot = session.open(&vault, &path).unwrap();
    assert_eq!(snapshot.file.name, "eicar.com");
    assert_eq!(snapshot.file.size, 68);
    assert!(!snapshot.is_stored());
    assert!(snapshot.tags.is_empty());
}

#[test]
fn test_open_replaces_previous_session() {
    let (dir, vault) = setup();
    let a = write_file(dir.path(), "a.bin", b"first");
    let b = write_file(dir.path(), "b.bin", b"second");

    let mut session = Session::new();
    session.open(&vault, &a).unwrap();
    session.open(&vault, &b).unwrap();

    let current = session.current().unwrap();
    assert_eq!(current.path, b);
    assert_eq!(current.file.name, "b.bin");
}

#[test]
fn test_open_missing_file_keeps_session() {
    let (dir, vault) = setup();
    let a = write_file(dir.path(), "a.bin", b"first");

    let mut session = Session::new();
    session.open(&vault, &a).unwrap();
    let err = session
        .open(&vault, &dir.path().join("missing.bin"))
        .unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert_eq!(session.current().unwrap().path, a);
}

#[test]
fn test_open_cataloged_file_carries_tags() {
    let (dir, vault) = setup();
    let path = write_file(dir.path(), "eicar.com", EICAR);
    let info = FileInfo::from_path(&path).unwrap();
    vault.ingest_file(&info, &path, Some("mal,test")).unwrap();

    let mut session = Session::new();
    let snapshot = session.open_hash(&vault, &info.md5).unwrap();
    assert!(snapshot.is_stored());
    assert_eq!(snapshot.tags, vec!["mal", "test"]);
    assert_eq!(snapshot.file.name, "eicar.com");
    assert!(snapshot.path.starts_with(vault.repository.root()));
}

#[test]
fn test_open_hash_validation_and_missing() {
    let (_dir, vault) = setup();
    let mut session = Session::new();

    let err = session.open_hash(&vault, "not-a-hash").unwrap_err();
    assert!(matches!(err, Error::InvalidHashFormat(_)));

    let err = session.open_hash(&vault, &"a".repeat(64)).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!session.is_open());
}

#[test]
fn test_open_hash_with_missing_bytes() {
    let (_dir, vault) = setup();
    let info = FileInfo::from_bytes("eicar.com", EICAR);
    vault.catalog.add_sample(&info, None).unwrap();

    let mut session = Session::new();
    let err = session.open_hash(&vault, &info.sha256).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_find_cache_bounds() {
    let (dir, vault) = setup();
    let mut session = Session::new();

    assert!(matches!(
        session.open_from_find_cache(&vault, 1),
        Err(Error::Index(_))
    ));

    for (name, content) in [("a.bin", b"aaaa"), ("b.bin", b"bbbb")] {
        let path = write_file(dir.path(), name, content);
        let info = FileInfo::from_path(&path).unwrap();
        vault.ingest_file(&info, &path, None).unwrap();
    }
    session.record_find_results(vault.catalog.find("all", "").unwrap());

    assert_eq!(
        session.open_from_find_cache(&vault, 2).unwrap().file.name,
        "b.bin"
    );
    assert!(matches!(
        session.open_from_find_cache(&vault, 0),
        Err(Error::Index(_))
    ));
    assert!(matches!(
        session.open_from_find_cache(&vault, 3),
        Err(Error::Index(_))
    ));
    assert_eq!(session.current().unwrap().file.name, "b.bin");
}

#[test]
fn test_close_is_idempotent_and_keeps_find_cache() {
    let (dir, vault) = setup();
    let path = write_file(dir.path(), "a.bin", b"aaaa");
    let info = FileInfo::from_path(&path).unwrap();
    vault.ingest_file(&info, &path, None).unwrap();

    let mut session = Session::new();
    session.open(&vault, &path).unwrap();
    session.record_find_results(vault.catalog.find("all", "").unwrap());

    session.close();
    session.close();
    assert!(!session.is_open());
    assert_eq!(session.find_results().len(), 1);
    assert!(session.open_from_find_cache(&vault, 1).is_ok());
}

#[test]
fn test_refresh_picks_up_catalog_changes() {
    let (dir, vault) = setup();
    let mut session = Session::new();
    assert!(matches!(session.refresh(&vault), Err(Error::SessionRequired)));

    let path = write_file(dir.path(), "eicar.com", EICAR);
    session.open(&vault, &path).unwrap();
    let info = FileInfo::from_path(&path).unwrap();
    vault.ingest_file(&info, &path, None).unwrap();
    vault.catalog.add_tags(&info.sha256, "mal").unwrap();

    assert!(session.current().unwrap().tags.is_empty());
    let snapshot = session.refresh(&vault).unwrap();
    assert!(snapshot.is_stored());
    assert_eq!(snapshot.tags, vec!["mal"]);
}

#[test]
fn test_open_url_uses_scratch_file() {
    let (_dir, vault) = setup();
    let mut session = Session::new();

    let fetcher = StaticFetcher(EICAR.to_vec());
    let scratch = session
        .open_url(&vault, &fetcher, "http://example.test/files/eicar.com", false)
        .unwrap()
        .path
        .clone();
    assert!(scratch.is_file());
    assert_eq!(session.current().unwrap().file.name, "eicar.com");
    assert_eq!(session.current().unwrap().file.size, 68);

    session.close();
    assert!(!scratch.exists());
}

#[test]
fn test_open_url_failure_keeps_session() {
    let (dir, vault) = setup();
    let path = write_file(dir.path(), "a.bin", b"aaaa");
    let mut session = Session::new();
    session.open(&vault, &path).unwrap();

    let err = session
        .open_url(&vault, &FailingFetcher, "http://example.test/x", true)
        .unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert_eq!(session.current().unwrap().path, path);
}
