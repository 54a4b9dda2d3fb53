//! Integration tests for CLI parsing, configuration loading and command routing

use crate::integration::test_utils::{spawn_oracle_server, EnvGuard, ServerMode};
use clap::Parser;
use prefix_probe::cli::{Cli, Commands, RunContext, EXIT_INCOMPLETE};
use prefix_probe::config::ConfigLoader;
use prefix_probe::discovery::ErrorPolicy;
use tempfile::TempDir;

fn context_from(args: &[&str], config_toml: Option<&str>) -> (Cli, RunContext, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut cli = Cli::try_parse_from(args).unwrap();
    if let Some(contents) = config_toml {
        let path = temp_dir.path().join("probe.toml");
        std::fs::write(&path, contents).unwrap();
        cli.config = Some(path);
    }
    let context = RunContext::load(cli.config.as_deref())
        .unwrap()
        .with_color(false);
    (cli, context, temp_dir)
}

#[test]
fn test_parse_run_flags() {
    let cli = Cli::try_parse_from([
        "prefix-probe",
        "run",
        "--url",
        "http://target.test/item",
        "--workers",
        "16",
        "--root",
        "flag{",
        "--error-policy",
        "requeue",
        "--max-attempts",
        "5",
        "--format",
        "json",
    ])
    .unwrap();

    match cli.command {
        Commands::Run { search, url } => {
            assert_eq!(url.as_deref(), Some("http://target.test/item"));
            assert_eq!(search.workers, Some(16));
            assert_eq!(search.root.as_deref(), Some("flag{"));
            assert_eq!(search.max_attempts, 5);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_demo_requires_a_secret() {
    assert!(Cli::try_parse_from(["prefix-probe", "demo"]).is_err());
    assert!(Cli::try_parse_from(["prefix-probe", "--quiet", "--verbose", "config"]).is_err());
}

#[tokio::test]
async fn test_demo_uses_config_file_and_flag_overrides() {
    let temp_home = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[
        ("XDG_CONFIG_HOME", temp_home.path().to_str()),
        ("PREFIX_PROBE__DISCOVERY__WORKERS", None),
    ]);

    let (cli, context, _dir) = context_from(
        &[
            "prefix-probe",
            "demo",
            "--secret",
            "cafe",
            "--secret",
            "face",
            "--workers",
            "3",
            "--format",
            "json",
        ],
        Some("[discovery]\nworkers = 9\n\n[discovery.alphabet]\npreset = \"hex\"\n"),
    );
    assert_eq!(context.config().discovery.workers, 9);

    let output = context.execute(&cli.command).await.unwrap();
    assert_eq!(output.exit_code, 0);
    let json: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(json["secrets"], serde_json::json!(["cafe", "face"]));
    assert_eq!(json["stats"]["workers"], 3);
}

#[test]
fn test_environment_overrides_config_file() {
    let temp_home = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[
        ("XDG_CONFIG_HOME", temp_home.path().to_str()),
        ("PREFIX_PROBE__DISCOVERY__ROOT", Some("ab")),
    ]);

    let config_path = temp_home.path().join("probe.toml");
    std::fs::write(&config_path, "[discovery]\nroot = \"zz\"\n").unwrap();
    let config = ConfigLoader::load_from_file(&config_path).unwrap();

    assert_eq!(config.discovery.root, "ab");
}

#[tokio::test]
async fn test_run_against_http_oracle_reports_unresolved() {
    let temp_home = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[("XDG_CONFIG_HOME", temp_home.path().to_str())]);
    let server = spawn_oracle_server(&["ok"], ServerMode::Broken).await;

    let config = format!(
        "[oracle]\nurl = \"{}\"\nparam = \"q\"\n\n[oracle.pass_rule]\nkind = \"body_lacks\"\ntext = \"Article not found!\"\n",
        server.url
    );
    let (cli, context, _dir) = context_from(
        &["prefix-probe", "run", "--alphabet", "ko", "--error-policy", "abort"],
        Some(&config),
    );

    let output = context.execute(&cli.command).await.unwrap();
    assert_eq!(output.exit_code, EXIT_INCOMPLETE);
    assert!(output.text.contains("Discovery aborted"));
    assert!(output.text.contains("[oracle, 1 attempt(s)]"));
}

#[tokio::test]
async fn test_check_command_encodes_the_candidate() {
    let temp_home = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[("XDG_CONFIG_HOME", temp_home.path().to_str())]);
    let server = spawn_oracle_server(&["50%_off"], ServerMode::Body).await;

    let config = format!(
        "[oracle]\nurl = \"{}\"\n\n[oracle.pass_rule]\nkind = \"body_contains\"\ntext = \"Welcome\"\n",
        server.url
    );
    let (cli, context, _dir) = context_from(&["prefix-probe", "check", "50%"], Some(&config));
    let output = context.execute(&cli.command).await.unwrap();
    assert_eq!(output.text, "FAIL - \"50\\\\%\"");

    let (cli, context, _dir) =
        context_from(&["prefix-probe", "check", "--open", "50%"], Some(&config));
    let output = context.execute(&cli.command).await.unwrap();
    assert_eq!(output.text, "PASS - \"50\\\\%%\"");
}

#[test]
fn test_config_error_policy_from_toml() {
    let temp_home = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[("XDG_CONFIG_HOME", temp_home.path().to_str())]);
    let (_cli, context, _dir) = context_from(
        &["prefix-probe", "config"],
        Some("[discovery.error_policy]\nkind = \"abort\"\n"),
    );
    assert_eq!(context.config().discovery.error_policy, ErrorPolicy::Abort);
}
