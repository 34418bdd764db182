#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use std::io::Write;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_toml_uses_defaults() {
    let toml_str = r#"
spec_dir = "tests/integration"
"#;
    let config: HarnessConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.spec_dir, PathBuf::from("tests/integration"));
    assert_eq!(config.before_dir, "before");
    assert_eq!(config.after_dir, "after");
    assert_eq!(config.temp_dir, PathBuf::from("tmp"));
    assert!(config.include_hidden_files);
    assert!(config.ignore.is_empty());
    assert!(config.subject.is_none());
}

#[test]
fn test_parse_full_toml() {
    let toml_str = r#"
name = "coffee-suite"
spec_dir = "specs"
before_dir = "input"
after_dir = "golden"
temp_dir = "scratch"
include_hidden_files = false

[[ignore]]
type = "glob"
pattern = "*.lock"

[[ignore]]
type = "regex"
pattern = "\\.cache/"

[subject]
name = "CoffeeMaker"
executable = "target/debug/coffeemaker"
default_args = ["--no-milk"]

[subject.environment]
COFFEE_MAKER_FILE = "Coffeemakerfile.toml"

[[subject.redactions]]
type = "path"
path = "/var/cache/brew"
placeholder = "$CACHE"

[[subject.redactions]]
type = "user_path"
path = ".brew/config"

[[subject.redactions]]
type = "pattern"
pattern = "\\d{2}:\\d{2}:\\d{2}"
replacement = "<TIME>"
"#;
    let config: HarnessConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.name, "coffee-suite");
    assert_eq!(config.before_dir, "input");
    assert!(!config.include_hidden_files);
    assert_eq!(config.ignore.len(), 2);

    let subject_config = config.subject.as_ref().unwrap();
    assert_eq!(subject_config.name, "CoffeeMaker");
    assert_eq!(subject_config.default_args, vec!["--no-milk"]);
    assert_eq!(subject_config.redactions.len(), 3);

    let subject = config.subject().unwrap().unwrap();
    assert_eq!(subject.name(), "CoffeeMaker");
    assert_eq!(subject.executable(), "target/debug/coffeemaker");
}

#[test]
fn test_parse_json() {
    let json_str = r#"{
        "spec_dir": "specs",
        "subject": { "name": "brew" }
    }"#;
    let config: HarnessConfig = serde_json::from_str(json_str).unwrap();
    assert_eq!(config.spec_dir, PathBuf::from("specs"));
    assert_eq!(config.subject.unwrap().name, "brew");
}

#[test]
fn test_unknown_fields_are_rejected() {
    let toml_str = r#"
spec_dir = "specs"
spec_dirs = "typo"
"#;
    assert!(toml::from_str::<HarnessConfig>(toml_str).is_err());
}

#[test]
fn test_load_picks_format_by_extension() {
    let mut toml_file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    writeln!(toml_file, "spec_dir = \"specs\"").unwrap();
    toml_file.flush().unwrap();
    let config = HarnessConfig::load(toml_file.path()).unwrap();
    assert_eq!(config.spec_dir, PathBuf::from("specs"));

    let mut json_file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    writeln!(json_file, "{{\"spec_dir\": \"specs\"}}").unwrap();
    json_file.flush().unwrap();
    let config = HarnessConfig::load(json_file.path()).unwrap();
    assert_eq!(config.spec_dir, PathBuf::from("specs"));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let result = HarnessConfig::load(Path::new("/no/such/config.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_pattern_config_compiles() {
    let glob = PatternConfig::Glob {
        pattern: "*.lock".to_string(),
    };
    let regex = PatternConfig::Regex {
        pattern: r"\.cache/".to_string(),
    };
    assert!(glob.compile().is_ok());
    assert!(regex.compile().is_ok());

    let bad = PatternConfig::Regex {
        pattern: "(oops".to_string(),
    };
    assert!(bad.compile().is_err());
}

#[test]
fn test_invalid_redaction_regex_is_rejected() {
    let toml_str = r#"
spec_dir = "specs"

[subject]
name = "brew"

[[subject.redactions]]
type = "pattern"
pattern = "(unclosed"
replacement = "x"
"#;
    let config: HarnessConfig = toml::from_str(toml_str).unwrap();
    assert!(matches!(config.subject(), Err(ConfigError::Regex(_))));
}

#[test]
fn test_empty_subject_name_is_rejected() {
    let config: HarnessConfig = toml::from_str(
        r#"
spec_dir = "specs"

[subject]
name = ""
"#,
    )
    .unwrap();
    assert!(matches!(config.subject(), Err(ConfigError::Validation(_))));
}

#[test]
fn test_context_builds_from_config() {
    let dir = TempDir::new().unwrap();
    let spec_dir = dir.path().join("specs");
    std::fs::create_dir_all(&spec_dir).unwrap();

    let config = HarnessConfig {
        name: String::new(),
        spec_dir: spec_dir.clone(),
        before_dir: "input".to_string(),
        after_dir: "golden".to_string(),
        temp_dir: dir.path().join("scratch"),
        include_hidden_files: false,
        ignore: vec![PatternConfig::Glob {
            pattern: "*.lock".to_string(),
        }],
        subject: None,
    };

    let context = config.context().unwrap();
    assert_eq!(context.before_dir(), Path::new("input"));
    assert_eq!(context.after_dir(), Path::new("golden"));
    assert!(!context.include_hidden_files());
    // Hidden policy is off, so matching a dotfile needs a literal dot; the
    // plain ignore still applies to visible paths.
    assert!(context.is_ignored(Path::new("Cargo.lock")));
}

#[test]
fn test_context_rejects_missing_spec_dir() {
    let config: HarnessConfig = toml::from_str("spec_dir = \"/no/such/dir\"").unwrap();
    assert!(matches!(
        config.context(),
        Err(ConfigError::MissingSpecDir(_))
    ));
}
