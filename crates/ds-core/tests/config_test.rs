use ds_core::config::Config;

#[test]
fn default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.general.log_level, "info");
    assert_eq!(cfg.docker.executable, "docker");
    assert_eq!(cfg.docker.container_prefix, "dockshell-");
    assert!(cfg.docker.temp_dir.is_none());
    assert_eq!(cfg.shell.program, "/bin/bash");
    assert_eq!(cfg.shell.term, "dumb");
    assert_eq!(cfg.shell.timeout_secs, 30);
    assert_eq!(cfg.shell.continuation_prompt, "> ");
    assert_eq!(cfg.shell.ready_pattern, "[#$] ");
    assert_eq!(cfg.shell.max_sessions, 16);
    assert!(cfg
        .shell
        .neutralize_hooks
        .iter()
        .any(|h| h.contains("changeps1")));
    cfg.validate().expect("defaults validate");
}

#[test]
fn config_roundtrip() {
    let cfg = Config::default();
    let toml_str = cfg.to_toml().expect("serialize to toml");
    assert!(toml_str.contains("dockshell-"));

    let parsed: Config = toml::from_str(&toml_str).expect("parse toml back");
    assert_eq!(parsed.docker.executable, cfg.docker.executable);
    assert_eq!(parsed.shell.timeout_secs, cfg.shell.timeout_secs);
    assert_eq!(parsed.shell.neutralize_hooks, cfg.shell.neutralize_hooks);
    parsed.validate().expect("config validates");
}

#[test]
fn config_partial_toml() {
    let partial = r#"
[docker]
executable = "/usr/local/bin/podman"

[shell]
timeout_secs = 5
"#;
    let cfg: Config = toml::from_str(partial).expect("parse partial");
    assert_eq!(cfg.docker.executable, "/usr/local/bin/podman");
    assert_eq!(cfg.shell.timeout_secs, 5);
    // defaults should fill in the rest
    assert_eq!(cfg.docker.container_prefix, "dockshell-");
    assert_eq!(cfg.shell.program, "/bin/bash");
    cfg.validate().expect("config validates");
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[general]\nlog_level = \"debug\"\n[docker]\ncontainer_prefix = \"ci-\"\n",
    )
    .expect("write config");

    let cfg = Config::load_from(&path).expect("load config");
    assert_eq!(cfg.general.log_level, "debug");
    assert_eq!(cfg.docker.container_prefix, "ci-");
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Config::load_from(dir.path().join("nope.toml")).expect_err("missing file");
    assert!(err.to_string().starts_with("io:"));
}

#[test]
fn zero_timeout_fails_validation() {
    let mut cfg = Config::default();
    cfg.shell.timeout_secs = 0;
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("timeout_secs"));
}

#[test]
fn invalid_ready_pattern_fails_validation() {
    let mut cfg = Config::default();
    cfg.shell.ready_pattern = "[unterminated".into();
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("ready_pattern"));
}

#[test]
fn empty_executable_fails_validation() {
    let mut cfg = Config::default();
    cfg.docker.executable = "  ".into();
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("docker.executable"));
}

#[test]
fn zero_max_sessions_fails_validation() {
    let mut cfg = Config::default();
    cfg.shell.max_sessions = 0;
    assert!(cfg.validate().is_err());
}
