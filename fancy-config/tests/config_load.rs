use fancy_config::{CollisionMode, FancyConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: "0.1"
server:
  host: "0.0.0.0"
  port: 8080
extractor:
  allowed_host: "${FANCY_TEST_HOST}"
  timeout_secs: 20
bulk:
  collision: overwrite
search:
  max_pages: 3
logging:
  format: json
  stderr: false
  "#;
    let p = write_yaml(&tmp, "fancy.yaml", file_yaml);

    temp_env::with_var("FANCY_TEST_HOST", Some("blog.naver.com"), || {
        let config = FancyConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load system config");

        assert_eq!(config.version.as_deref(), Some("0.1"));
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.extractor.allowed_host, "blog.naver.com");
        assert_eq!(config.extractor.timeout_secs, 20);
        assert_eq!(config.extractor.frame_id, "mainFrame");
        assert_eq!(config.bulk.collision, CollisionMode::Overwrite);
        assert_eq!(config.bulk.archive_name, "extracted_texts.zip");
        assert_eq!(config.search.max_pages, 3);
        assert_eq!(config.logging.format, "json");
        assert!(!config.logging.stderr);
    });
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "fancy.yaml", "server:\n  port: 8080\n");

    temp_env::with_vars(
        [
            ("FANCY_SERVER__PORT", Some("9090")),
            ("FANCY_EXTRACTOR__CONTAINER_LANG", Some("en-US")),
        ],
        || {
            let config = FancyConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load with env");

            assert_eq!(config.server.port, 9090);
            assert_eq!(config.extractor.container_lang, "en-US");
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.yaml");

    let config = FancyConfigLoader::new()
        .with_optional_file(&missing)
        .load()
        .expect("defaults");

    assert_eq!(config.server.port, 5000);
    assert_eq!(config.extractor.allowed_host, "naver.com");
    assert_eq!(
        config.extractor.container_classes,
        "se-viewer se-theme-default"
    );
    assert_eq!(config.bulk.collision, CollisionMode::Disambiguate);
    assert_eq!(config.search.default_order, "sim");
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.yaml");

    let result = FancyConfigLoader::new().with_file(&missing).load();
    assert!(result.is_err());
}
