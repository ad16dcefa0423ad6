use person_api::config::{AppConfig, ConfigError};
use person_api::runtime_config::{RuntimeConfig, DEFAULT_STACK_SIZE, STACK_SIZE_VAR};
use std::io::Write;
use tempfile::NamedTempFile;

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_full_config_file() {
    let file = yaml_file(
        "bind_addr: \"127.0.0.1:9000\"\nknown_person_ids: [10, 20]\nvalidate_responses: false\nmax_body_bytes: 2048\n",
    );
    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.bind_addr, "127.0.0.1:9000");
    assert_eq!(config.known_person_ids, vec![10, 20]);
    assert!(!config.validate_responses);
    assert_eq!(config.max_body_bytes, 2048);
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = yaml_file("");
    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = AppConfig::load_or_default(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_no_path_means_defaults() {
    assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
}

#[test]
fn test_invalid_yaml_names_the_file() {
    let file = yaml_file("known_person_ids: not-a-list\n");
    let err = AppConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Yaml { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

// The only test in this binary that touches the environment.
#[test]
fn test_stack_size_from_env() {
    std::env::set_var(STACK_SIZE_VAR, "0x8000");
    assert_eq!(RuntimeConfig::from_env().stack_size, 0x8000);

    std::env::set_var(STACK_SIZE_VAR, "garbage");
    assert_eq!(RuntimeConfig::from_env().stack_size, DEFAULT_STACK_SIZE);

    std::env::remove_var(STACK_SIZE_VAR);
    assert_eq!(RuntimeConfig::from_env().stack_size, DEFAULT_STACK_SIZE);
}
