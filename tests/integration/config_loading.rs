//! Integration tests for configuration loading and service construction

use crate::integration::test_utils::{diff_fields, with_env_vars};
use gameconf_server::api::{DiffResponse, GameConfService};
use gameconf_server::config::ConfigLoader;
use gameconf_server::error::RequestError;
use gameconf_server::mount::{Eligibility, Version};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_layout(temp: &TempDir, config: &str) -> PathBuf {
    let content = temp.path().join("content");
    fs::create_dir_all(content.join("1.10")).unwrap();
    fs::create_dir_all(content.join("thirdparty")).unwrap();
    fs::write(content.join("1.10").join("core.games.txt"), "versioned").unwrap();
    fs::write(content.join("thirdparty").join("core.games.txt"), "fallback").unwrap();

    let path = temp.path().join("config.toml");
    fs::write(&path, config).unwrap();
    path
}

const FULL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080
workdir = "content"

[attribution]
source = "https://example.org/gameconf"

[diff]
min_version = "1.6"
max_version = "1.12"

[[mounts]]
name = "1.10"
path = "1.10"
version = "1.10"

[[mounts]]
name = "thirdparty"
path = "thirdparty"

[logging]
level = "debug"
"#;

#[test]
fn test_load_full_config() {
    let temp = TempDir::new().unwrap();
    let path = write_layout(&temp, FULL_CONFIG);

    let config = with_env_vars(&[], || ConfigLoader::load_from_file(&path)).unwrap();

    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert_eq!(config.attribution.source, "https://example.org/gameconf");
    assert_eq!(config.diff.prefix, "gamedata/");
    assert_eq!(config.diff.min_version, Some(Version::new(vec![1, 6])));
    assert_eq!(config.fetch.extension, "txt");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.mounts.len(), 2);
    assert_eq!(
        config.mounts[0].eligibility(),
        Eligibility::VersionPrefix(Version::new(vec![1, 10]))
    );
    assert_eq!(config.mounts[1].eligibility(), Eligibility::Always);
    assert_eq!(
        config.mount_root(&config.mounts[1]),
        temp.path().join("content").join("thirdparty")
    );
}

#[test]
fn test_defaults_fill_optional_sections() {
    let temp = TempDir::new().unwrap();
    let path = write_layout(
        &temp,
        r#"
[attribution]
source = "ops@example.org"

[[mounts]]
name = "thirdparty"
path = "content/thirdparty"
"#,
    );

    let config = with_env_vars(&[], || ConfigLoader::load_from_file(&path)).unwrap();
    assert_eq!(config.bind_address(), "0.0.0.0:19795");
    assert!(!config.server.warm_cache);
    assert!(config.diff.min_version.is_none());
    assert!(config.logging.enabled);
}

#[test]
fn test_environment_overrides_file() {
    let temp = TempDir::new().unwrap();
    let path = write_layout(&temp, FULL_CONFIG);

    let config = with_env_vars(
        &[
            ("GAMECONF__SERVER__PORT", "9000"),
            ("GAMECONF__ATTRIBUTION__SOURCE", "override"),
        ],
        || ConfigLoader::load_from_file(&path),
    )
    .unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.attribution.source, "override");
}

#[test]
fn test_startup_misconfiguration_is_fatal() {
    let temp = TempDir::new().unwrap();

    let missing_attribution = write_layout(
        &temp,
        r#"
[[mounts]]
name = "thirdparty"
path = "content/thirdparty"
"#,
    );
    let err = with_env_vars(&[], || ConfigLoader::load_from_file(&missing_attribution))
        .unwrap_err();
    assert!(err.to_string().contains("attribution.source is required"));

    let missing_dir = write_layout(
        &temp,
        r#"
[attribution]
source = "ops@example.org"

[[mounts]]
name = "thirdparty"
path = "content/does-not-exist"
"#,
    );
    let err = with_env_vars(&[], || ConfigLoader::load_from_file(&missing_dir)).unwrap_err();
    assert!(err.to_string().contains("directory does not exist"));

    let no_mounts = write_layout(&temp, "[attribution]\nsource = \"ops@example.org\"\n");
    assert!(with_env_vars(&[], || ConfigLoader::load_from_file(&no_mounts)).is_err());

    let bad_version = write_layout(
        &temp,
        r#"
[attribution]
source = "ops@example.org"

[[mounts]]
name = "thirdparty"
path = "content/thirdparty"
version = "1.x"
"#,
    );
    assert!(with_env_vars(&[], || ConfigLoader::load_from_file(&bad_version)).is_err());

    let absent = temp.path().join("absent.toml");
    assert!(with_env_vars(&[], || ConfigLoader::load_from_file(&absent)).is_err());
}

#[test]
fn test_service_from_config_applies_settings() {
    let temp = TempDir::new().unwrap();
    let path = write_layout(&temp, FULL_CONFIG);
    let config = with_env_vars(&[], || ConfigLoader::load_from_file(&path)).unwrap();
    let service = GameConfService::from_config(&config).unwrap();

    let names: Vec<&str> = service.registry().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["1.10", "thirdparty"]);

    let response = service.diff(&diff_fields("1.10.2", &[("gamedata/core.games.txt", "x")]));
    let DiffResponse::Changed(changes) = response else {
        panic!("expected change-set");
    };
    assert_eq!(changes["core.games.txt"].location, "1.10/core.games.txt");

    assert_eq!(
        service.diff(&diff_fields("1.5", &[("gamedata/core.games.txt", "x")])),
        DiffResponse::Errors(RequestError::UnsupportedVersion)
    );
    assert_eq!(
        service.diff(&diff_fields("1.12.0", &[("gamedata/core.games.txt", "x")])),
        DiffResponse::Errors(RequestError::UnsupportedVersion)
    );
}

#[test]
fn test_demo_config_loads_and_mounts() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("config.toml");
    let config = with_env_vars(&[], || ConfigLoader::load_from_file(&path)).unwrap();

    let service = GameConfService::from_config(&config).unwrap();
    let names: Vec<_> = service.registry().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["1.11", "1.10", "thirdparty"]);
    assert_eq!(service.warm(), 3);
}
