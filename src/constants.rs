// src/constants.rs

/// The configuration file read from the working directory when `CLIFF_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILENAME: &str = "cli.yml";

/// Environment variable pointing at the configuration file.
pub const CONFIG_ENV_VAR: &str = "CLIFF_CONFIG";

/// Environment variable listing extra configuration files (colon-separated) to mount
/// as subcommands of the root.
pub const MOUNTS_ENV_VAR: &str = "CLIFF_MOUNTS";

/// Environment variable overriding the interpreter for generated scripts.
pub const SHELL_ENV_VAR: &str = "CLIFF_SHELL";

/// The interpreter used when neither the configuration nor the environment names one.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Prefix of the temporary script files handed to the shell.
pub const SCRIPT_FILE_PREFIX: &str = "cliff-";

/// The persistent flag every root command receives.
pub const VERBOSE_FLAG: &str = "verbose";
pub const VERBOSE_SHORT: char = 'v';

/// Clap id of the positional arguments collected by every command.
pub const ARGS_ID: &str = "args";

/// Placeholder expanded to all positional arguments.
pub const GENERIC_ARGS_TOKEN: &str = "args...";

/// Flag names that clash with clap's own arguments or the positional slot.
pub const RESERVED_FLAG_NAMES: &[&str] = &["help", "version", ARGS_ID];

/// Short letters taken by `-h/--help` and `-V/--version`.
pub const RESERVED_SHORTS: &[char] = &['h', 'V'];
