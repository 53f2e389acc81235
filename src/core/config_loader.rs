//! # Config Loader
//!
//! Turns configuration bytes into a `CommandConfig` document. The format is picked
//! from the file extension: YAML (the default), TOML or JSON. Structural validation
//! beyond what serde enforces happens in the tree builder; both report `ConfigError`.

use crate::models::{CommandConfig, FlagKind};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Everything that can go wrong between reading a configuration and freezing the tree.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error while reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Command name '{0}' is invalid: names must be non-empty and contain no whitespace.")]
    InvalidName(String),
    #[error("Command '{command}': step {step} of `run` has an empty `execute`.")]
    EmptyExecute { command: String, step: usize },
    #[error("Command '{0}' is declared more than once.")]
    DuplicateCommand(String),
    #[error("Alias '{alias}' of command '{command}' collides with a sibling command.")]
    AliasConflict { command: String, alias: String },
    #[error("Command '{0}' has no `run`, no registered handler and no subcommands.")]
    UnboundCommand(String),
    #[error("Flag '{flag}' on command '{command}': default {value} is not a valid {kind}.")]
    InvalidFlagDefault {
        command: String,
        flag: String,
        value: String,
        kind: FlagKind,
    },
    #[error("Flag '{flag}' on command '{command}' conflicts with {other}.")]
    FlagConflict {
        command: String,
        flag: String,
        other: String,
    },
    #[error("'{name}' is reserved and cannot be used as a flag on command '{command}'.")]
    ReservedFlag { command: String, name: String },
}

/// The serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension. Anything unknown is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => Self::Toml,
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parses configuration bytes into the root command document.
pub fn parse_document(bytes: &[u8], format: ConfigFormat) -> Result<CommandConfig, ConfigError> {
    let document = match format {
        ConfigFormat::Yaml => serde_yaml::from_slice(bytes)?,
        ConfigFormat::Json => serde_json::from_slice(bytes)?,
        ConfigFormat::Toml => toml::from_str(std::str::from_utf8(bytes)?)?,
    };
    Ok(document)
}

/// Reads and parses a configuration file.
pub fn load_document(path: &Path) -> Result<CommandConfig, ConfigError> {
    log::debug!("Loading command tree from '{}'", path.display());
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&bytes, ConfigFormat::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlagDefault, RunConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_yaml_document_with_both_run_forms() {
        let yaml = r#"
name: tool
description: A tool
commands:
  - name: hello
    run: echo hi
  - name: deploy
    flags:
      - name: env
        type: string
        default: staging
        description: Target environment
    run:
      - heading: Building
        setup: export X=1
        execute: make build
      - execute: make deploy
"#;
        let doc = parse_document(yaml.as_bytes(), ConfigFormat::Yaml).unwrap();
        assert_eq!(doc.name, "tool");
        assert_eq!(doc.commands.len(), 2);
        assert_eq!(
            doc.commands[0].run,
            Some(RunConfig::Simple("echo hi".to_string()))
        );
        match &doc.commands[1].run {
            Some(RunConfig::Steps(steps)) => {
                assert_eq!(steps.len(), 2);
                assert_eq!(steps[0].heading.as_deref(), Some("Building"));
                assert_eq!(steps[1].setup, None);
                assert_eq!(steps[1].execute, "make deploy");
            }
            other => panic!("Expected steps, got {:?}", other),
        }
        assert_eq!(
            doc.commands[1].flags[0].default,
            Some(FlagDefault::Text("staging".to_string()))
        );
    }

    #[test]
    fn test_step_without_execute_is_rejected() {
        let yaml = r#"
name: tool
run:
  - heading: Missing the command
"#;
        assert!(parse_document(yaml.as_bytes(), ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_step_with_unknown_key_is_rejected() {
        let yaml = r#"
name: tool
run:
  - exec: echo typo
"#;
        assert!(parse_document(yaml.as_bytes(), ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_step_with_non_text_value_is_rejected() {
        let yaml = r#"
name: tool
run:
  - execute:
      nested: mapping
"#;
        assert!(parse_document(yaml.as_bytes(), ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_run_of_wrong_shape_is_rejected() {
        let yaml = r#"
name: tool
run:
  key: value
"#;
        assert!(parse_document(yaml.as_bytes(), ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_unknown_command_field_is_rejected() {
        let yaml = "name: tool\nruns: echo typo\n";
        let err = parse_document(yaml.as_bytes(), ConfigFormat::Yaml).unwrap_err();
        assert!(
            err.to_string().contains("unknown field `runs`"),
            "Error message was: {}",
            err
        );
    }

    #[test]
    fn test_parse_toml_document() {
        let toml_str = r#"
name = "tool"

[[commands]]
name = "build"

[[commands.run]]
heading = "Compile"
execute = "cargo build"
"#;
        let doc = parse_document(toml_str.as_bytes(), ConfigFormat::Toml).unwrap();
        assert_eq!(doc.commands[0].name, "build");
        assert!(matches!(&doc.commands[0].run, Some(RunConfig::Steps(s)) if s.len() == 1));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("cli.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("cli.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("cli.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("cli")), ConfigFormat::Yaml);
    }

    #[test]
    fn test_load_document_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"name": "tool", "run": "echo hi"}"#)
            .unwrap();
        file.flush().unwrap();

        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.name, "tool");
    }

    #[test]
    fn test_load_document_missing_file() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        drop(file);

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
