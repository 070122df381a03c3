#![cfg(feature = "watch")]

use std::fs;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use ts_catalog_manager::{CatalogHandle, CatalogWatcher, Resolve as _, load_from_config};
use ts_catalog_toml::CatalogConfig;

const CATALOG_A: &str = r#"<TS language="es"><context><name>doc</name><message><source>title</source><translation>Documento</translation></message></context></TS>"#;
const CATALOG_B: &str = r#"<TS language="es"><context><name>doc</name><message><source>title</source><translation>Documentos</translation></message></context></TS>"#;

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    false
}

#[test]
fn watcher_reloads_changed_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("giswater_es.ts");
    fs::write(&path, CATALOG_A).unwrap();

    let handle = CatalogHandle::load(path.clone()).unwrap();
    let watcher = CatalogWatcher::with_debounce(&handle, Duration::from_millis(20)).unwrap();
    assert_eq!(watcher.path(), path.as_path());

    fs::write(&path, CATALOG_B).unwrap();

    assert!(wait_for(|| handle.resolve_or("doc", "title", "?") == "Documentos"));
    assert!(handle.revision() >= 2);
}

#[test]
fn watcher_survives_a_broken_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("giswater_es.ts");
    fs::write(&path, CATALOG_A).unwrap();

    let handle = CatalogHandle::load(path.clone()).unwrap();
    let _watcher = CatalogWatcher::with_debounce(&handle, Duration::from_millis(20)).unwrap();

    fs::write(&path, "<TS language=\"es\"><context>").unwrap();
    thread::sleep(Duration::from_millis(300));

    assert_eq!(handle.revision(), 1);
    assert_eq!(handle.resolve_or("doc", "title", "?"), "Documento");

    fs::write(&path, CATALOG_B).unwrap();

    assert!(wait_for(|| handle.resolve_or("doc", "title", "?") == "Documentos"));
    assert!(handle.revision() >= 2);
}

#[test]
fn watch_key_in_config_reloads_changes() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("i18n.toml"),
        "language = \"es\"\ncatalog_dir = \"i18n\"\nfile_prefix = \"giswater\"\nwatch = true\n",
    )
    .unwrap();
    fs::create_dir(temp_dir.path().join("i18n")).unwrap();
    let path = temp_dir.path().join("i18n").join("giswater_es.ts");
    fs::write(&path, CATALOG_A).unwrap();

    let config = CatalogConfig::from_manifest_dir(temp_dir.path()).unwrap();
    let catalog = load_from_config(&config, Some(temp_dir.path())).unwrap();
    assert!(catalog.is_watching());

    fs::write(&path, CATALOG_B).unwrap();

    assert!(wait_for(|| catalog.resolve_or("doc", "title", "?") == "Documentos"));
    assert!(catalog.revision() >= 2);
}

#[test]
fn dropping_the_watcher_stops_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("giswater_es.ts");
    fs::write(&path, CATALOG_A).unwrap();

    let handle = CatalogHandle::load(path.clone()).unwrap();
    drop(CatalogWatcher::start(&handle).unwrap());

    fs::write(&path, CATALOG_B).unwrap();
    thread::sleep(Duration::from_millis(400));

    assert_eq!(handle.revision(), 1);
    assert_eq!(handle.resolve_or("doc", "title", "?"), "Documento");
}
