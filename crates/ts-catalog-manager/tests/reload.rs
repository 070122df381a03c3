use rstest::rstest;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tempfile::TempDir;
use ts_catalog::DuplicatePolicy;
use ts_catalog_manager::{
    CatalogError, CatalogHandle, CatalogSource, LoadError, Resolve as _, current, load,
    load_from_config, refresh, reload, resolve,
};
use ts_catalog_toml::CatalogConfig;

fn catalog(version: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.0" language="es">
	<context>
		<name>doc</name>
		<message>
			<source>title</source>
			<translation>Documento {version}</translation>
		</message>
		<message>
			<source>tab_arc</source>
			<translation>Arco {version}</translation>
		</message>
	</context>
</TS>
"#
    )
    .into_bytes()
}

#[test]
fn free_functions_drive_the_handle() {
    let handle = load(catalog("A")).unwrap();

    assert_eq!(
        resolve(&handle, "doc", "title", "?").unwrap().text,
        "Documento A"
    );
    assert_eq!(reload(&handle, catalog("B")).unwrap(), 2);
    assert_eq!(current(&handle).revision(), 2);
    assert_eq!(refresh(&handle).unwrap(), 3);
    assert_eq!(handle.resolve_or("doc", "tab_arc", "?"), "Arco B");
}

#[rstest]
#[case::malformed(b"<TS language=\"es\"><context><name>doc</name>".to_vec())]
#[case::wrong_root(b"<catalog language=\"es\"/>".to_vec())]
#[case::bad_language(b"<TS language=\"not a tag!\"/>".to_vec())]
fn failed_reload_keeps_the_old_revision(#[case] broken: Vec<u8>) {
    let handle = load(catalog("A")).unwrap();

    assert!(reload(&handle, broken).is_err());
    assert_eq!(handle.revision(), 1);
    assert_eq!(handle.resolve_or("doc", "title", "?"), "Documento A");
}

#[test]
fn refresh_rereads_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("giswater_es.ts");
    fs::write(&path, catalog("A")).unwrap();

    let handle = CatalogHandle::load(path.clone()).unwrap();
    fs::write(&path, catalog("B")).unwrap();

    assert_eq!(handle.refresh().unwrap(), 2);
    assert_eq!(handle.resolve_or("doc", "title", "?"), "Documento B");
    assert_eq!(handle.source(), CatalogSource::Path(path));
}

#[test]
fn refresh_of_a_deleted_file_keeps_the_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("giswater_es.ts");
    fs::write(&path, catalog("A")).unwrap();

    let handle = CatalogHandle::load(path.clone()).unwrap();
    fs::remove_file(&path).unwrap();

    assert!(matches!(handle.refresh(), Err(CatalogError::Read { .. })));
    assert_eq!(handle.revision(), 1);
    assert_eq!(handle.resolve_or("doc", "title", "?"), "Documento A");
}

#[test]
fn readers_never_observe_a_mixed_catalog() {
    let handle = load(catalog("0")).unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut observed = 0usize;
                loop {
                    let snapshot = handle.current();
                    let title = snapshot.resolve("doc", "title", "?").unwrap().text;
                    let tab = snapshot.resolve("doc", "tab_arc", "?").unwrap().text;

                    let version = title.strip_prefix("Documento ").unwrap();
                    assert_eq!(tab, format!("Arco {version}"));
                    assert!(handle.resolve("doc", "title", "?").unwrap().found);
                    observed += 1;

                    if stop.load(Ordering::Relaxed) {
                        break observed;
                    }
                }
            })
        })
        .collect();

    for version in 1..=50 {
        reload(&handle, catalog(&version.to_string())).unwrap();
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(handle.revision(), 51);
    assert_eq!(handle.resolve_or("doc", "title", "?"), "Documento 50");
}

#[test]
fn concurrent_reloads_are_serialized() {
    let handle = load(catalog("0")).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let handle = handle.clone();
            thread::spawn(move || {
                for round in 0..10 {
                    reload(&handle, catalog(&format!("{writer}-{round}"))).unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(handle.revision(), 41);
}

fn config_dir(policy: &str, files: &[(&str, Vec<u8>)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("i18n.toml"),
        format!(
            "language = \"es_ES\"\ncatalog_dir = \"i18n\"\nfile_prefix = \"giswater\"\nduplicate_policy = \"{policy}\"\n"
        ),
    )
    .unwrap();
    fs::create_dir(temp_dir.path().join("i18n")).unwrap();
    for (name, content) in files {
        fs::write(temp_dir.path().join("i18n").join(name), content).unwrap();
    }
    temp_dir
}

#[test]
fn config_falls_back_to_the_primary_language() {
    let temp_dir = config_dir("first-wins", &[("giswater_es.ts", catalog("A"))]);
    let config = CatalogConfig::from_manifest_dir(temp_dir.path()).unwrap();

    let handle = load_from_config(&config, Some(temp_dir.path())).unwrap();

    assert!(!handle.is_watching());
    assert_eq!(handle.options().duplicate_policy, DuplicatePolicy::FirstWins);
    assert_eq!(
        handle.source(),
        CatalogSource::Path(temp_dir.path().join("i18n").join("giswater_es.ts"))
    );
    assert_eq!(handle.resolve_or("doc", "title", "?"), "Documento A");
}

#[test]
fn config_without_a_matching_catalog_fails() {
    let temp_dir = config_dir("last-wins", &[("giswater_ca.ts", catalog("A"))]);
    let config = CatalogConfig::from_manifest_dir(temp_dir.path()).unwrap();

    assert!(matches!(
        load_from_config(&config, Some(temp_dir.path())),
        Err(LoadError::Config(_))
    ));
}
