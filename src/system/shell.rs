// src/system/shell.rs

use crate::constants::{DEFAULT_SHELL, SHELL_ENV_VAR};
use std::{env, path::PathBuf};

/// Picks the interpreter for generated scripts.
///
/// The `shell` field of the configuration wins, then `CLIFF_SHELL`, then `/bin/sh`.
/// A leading `~` is expanded to the home directory.
pub fn resolve_shell(configured: Option<&str>, env_override: Option<String>) -> PathBuf {
    let chosen = configured
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| env_override.filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());

    let expanded = shellexpand::tilde(chosen.trim()).into_owned();
    log::debug!("Using shell '{}'", expanded);
    PathBuf::from(expanded)
}

/// `resolve_shell` with the override read from the environment.
pub fn shell_for(configured: Option<&str>) -> PathBuf {
    resolve_shell(configured, env::var(SHELL_ENV_VAR).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shell() {
        assert_eq!(resolve_shell(None, None), PathBuf::from(DEFAULT_SHELL));
    }

    #[test]
    fn test_configured_shell_beats_environment() {
        let shell = resolve_shell(Some("/bin/bash"), Some("/bin/zsh".to_string()));
        assert_eq!(shell, PathBuf::from("/bin/bash"));
    }

    #[test]
    fn test_environment_used_when_not_configured() {
        let shell = resolve_shell(None, Some("/bin/zsh".to_string()));
        assert_eq!(shell, PathBuf::from("/bin/zsh"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        assert_eq!(
            resolve_shell(Some("  "), Some(String::new())),
            PathBuf::from(DEFAULT_SHELL)
        );
    }

    #[test]
    fn test_tilde_is_expanded() {
        let shell = resolve_shell(Some("~/bin/myshell"), None);
        assert!(!shell.to_string_lossy().starts_with('~'));
        assert!(shell.ends_with("bin/myshell"));
    }
}
