use std::collections::HashMap;

use tempfile::TempDir;

use super::*;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.host, DEFAULT_HOST);
    assert_eq!(config.server.port, DEFAULT_PORT);
    assert_eq!(config.coze.api_url, DEFAULT_COZE_API_URL);
    assert!(config.coze.stream);
    assert_eq!(config.upload.field_name, "file");
    assert_eq!(config.upload.max_file_size, Some(10 * 1024 * 1024));
    assert!(!config.coze.has_credentials());
}

#[test]
fn test_parse_partial_yaml_keeps_defaults() {
    let yaml = r#"
server:
  port: 8080
coze:
  bot_id: "7350000000000"
  stream: false
upload:
  max_file_size: ~
"#;
    let config = parse_config(yaml).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, DEFAULT_HOST);
    assert_eq!(config.coze.bot_id.as_deref(), Some("7350000000000"));
    assert!(!config.coze.stream);
    assert_eq!(config.coze.api_url, DEFAULT_COZE_API_URL);
    assert_eq!(config.upload.max_file_size, None);
    assert_eq!(config.upload.field_name, "file");
}

#[test]
fn test_parse_empty_yaml() {
    assert_eq!(parse_config("   \n").unwrap(), Config::default());
}

#[test]
fn test_parse_invalid_yaml() {
    let err = parse_config("server: 42").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn test_load_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "coze:\n  api_key: pat_xxx\n  bot_id: bot_1\n").unwrap();

    let config = load_config(&path).unwrap();
    let creds = config.coze.credentials().unwrap();
    assert_eq!(creds.api_key, "pat_xxx");
    assert_eq!(creds.bot_id, "bot_1");
}

#[test]
fn test_load_config_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = load_config(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_explicit_config_path_wins() {
    let path = resolve_config_path(env_of(&[(CONFIG_PATH_ENV, "/etc/coze/proxy.yaml")]));
    assert_eq!(path, Some(std::path::PathBuf::from("/etc/coze/proxy.yaml")));
}

#[test]
fn test_env_overrides() {
    let mut config = Config::default();
    config
        .apply_env_overrides(env_of(&[
            (ENV_API_KEY, "pat_env"),
            (ENV_BOT_ID, "bot_env"),
            (ENV_API_URL, "http://127.0.0.1:9/chat"),
            (ENV_STREAM, "false"),
            (ENV_HOST, "0.0.0.0"),
            (ENV_PORT, "8999"),
            (ENV_CORS, "off"),
            (ENV_MAX_FILE_SIZE, "2048"),
            (ENV_REQUEST_TIMEOUT, "30"),
            (ENV_LOG_JSON, "1"),
        ]))
        .unwrap();

    assert_eq!(config.coze.api_key.as_deref(), Some("pat_env"));
    assert_eq!(config.coze.bot_id.as_deref(), Some("bot_env"));
    assert_eq!(config.coze.api_url, "http://127.0.0.1:9/chat");
    assert!(!config.coze.stream);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8999);
    assert!(!config.server.cors);
    assert_eq!(config.upload.max_file_size, Some(2048));
    assert_eq!(config.coze.request_timeout_secs, Some(30));
    assert!(config.logging.json);
}

#[test]
fn test_zero_max_file_size_means_unlimited() {
    let mut config = Config::default();
    config
        .apply_env_overrides(env_of(&[(ENV_MAX_FILE_SIZE, "0")]))
        .unwrap();
    assert_eq!(config.upload.max_file_size, None);
}

#[test]
fn test_zero_in_yaml_means_unlimited() {
    let config = parse_config("upload:\n  max_file_size: 0\n").unwrap();
    assert_eq!(config.upload.max_file_size, None);

    let config = parse_config("upload:\n  max_file_size: 2048\n").unwrap();
    assert_eq!(config.upload.max_file_size, Some(2048));
}

#[test]
fn test_zero_timeout_in_yaml_means_none() {
    let config = parse_config("coze:\n  request_timeout_secs: 0\n").unwrap();
    assert_eq!(config.coze.request_timeout_secs, None);

    let config = parse_config("coze:\n  request_timeout_secs: 15\n").unwrap();
    assert_eq!(config.coze.request_timeout_secs, Some(15));
}

#[test]
fn test_normalize_clears_zero_values() {
    let mut config = Config::default();
    config.upload.max_file_size = Some(0);
    config.coze.request_timeout_secs = Some(0);
    config.normalize();
    assert_eq!(config.upload.max_file_size, None);
    assert_eq!(config.coze.request_timeout_secs, None);
}

#[test]
fn test_invalid_env_values_rejected() {
    let mut config = Config::default();
    let err = config
        .apply_env_overrides(env_of(&[(ENV_PORT, "eighty")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { key, .. } if key == ENV_PORT));

    let err = config
        .apply_env_overrides(env_of(&[(ENV_STREAM, "maybe")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { key, .. } if key == ENV_STREAM));
}

#[test]
fn test_missing_credentials_is_not_a_startup_error() {
    let mut config = Config::default();
    config
        .apply_env_overrides(env_of(&[(ENV_PORT, "3001")]))
        .unwrap();
    assert!(config.coze.credentials().is_err());
}

#[test]
fn test_blank_credentials_count_as_missing() {
    let mut config = Config::default();
    config.coze.api_key = Some("pat".into());
    config.coze.bot_id = Some("   ".into());
    let err = config.coze.credentials().unwrap_err();
    assert!(err.to_string().contains("COZE_BOT_ID"));

    config.coze.api_key = Some(String::new());
    let err = config.coze.credentials().unwrap_err();
    assert!(err.to_string().contains("COZE_API_KEY"));
}

#[test]
fn test_credentials_debug_redacts_key() {
    let mut config = Config::default();
    config.coze.api_key = Some("pat_secret".into());
    config.coze.bot_id = Some("bot".into());
    let debug = format!("{:?}", config.coze.credentials().unwrap());
    assert!(!debug.contains("pat_secret"));
}
