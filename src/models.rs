// src/models.rs

use crate::core::invocation::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// --- CONFIGURATION DOCUMENT MODELS ---
// These are what the tool author writes in `cli.yml` (or its TOML/JSON twin).

/// One command definition as it appears in the configuration document.
/// The same shape is used recursively for `commands`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub flags: Vec<FlagConfig>,
    #[serde(default)]
    pub run: Option<RunConfig>,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
    /// Root only. Enables `--version`.
    #[serde(default)]
    pub version: Option<String>,
    /// Root only. Interpreter used for generated scripts.
    #[serde(default)]
    pub shell: Option<String>,
}

/// The polymorphic `run` field: a bare command or a list of steps.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RunConfig {
    Simple(String),
    Steps(Vec<FragmentConfig>),
}

/// One step of a `run` sequence.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FragmentConfig {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub setup: Option<String>,
    pub execute: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FlagConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FlagKind,
    #[serde(default)]
    pub default: Option<FlagDefault>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short: Option<char>,
    /// Persistent flags are inherited by every descendant command.
    #[serde(default)]
    pub persistent: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    #[default]
    String,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "integer")]
    Int,
    Float,
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        };
        f.write_str(name)
    }
}

/// A flag default exactly as written in the document. It is coerced to the
/// declared `FlagKind` when the tree is built.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FlagDefault {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FlagDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "'{}'", s),
        }
    }
}

// --- RUNTIME MODELS ---
// Produced once by the tree builder and never mutated afterwards.

/// One `{heading, setup, execute}` unit of shell text. Empty `heading` and
/// `setup` contribute no output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub heading: String,
    pub setup: String,
    pub execute: String,
}

impl Fragment {
    /// A fragment with only a command, as produced by the `run: "..."` shorthand.
    pub fn execute_only(execute: impl Into<String>) -> Self {
        Self {
            execute: execute.into(),
            ..Default::default()
        }
    }
}

/// The current value of a flag. `Display` is the text substituted for `flags["name"]`.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl FlagValue {
    /// The value a flag of this kind has when no default is declared.
    pub fn zero(kind: FlagKind) -> Self {
        match kind {
            FlagKind::String => Self::Text(String::new()),
            FlagKind::Bool => Self::Bool(false),
            FlagKind::Int => Self::Int(0),
            FlagKind::Float => Self::Float(0.0),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A declared flag after validation, with its default already coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    pub name: String,
    pub kind: FlagKind,
    pub default: FlagValue,
    pub description: String,
    pub short: Option<char>,
    pub persistent: bool,
}

/// An externally registered command implementation.
pub type Handler = Arc<dyn Fn(&Invocation<'_>) -> anyhow::Result<()> + Send + Sync>;

/// What happens when a command is invoked.
#[derive(Clone)]
pub enum Action {
    /// Assemble these fragments into a script and run it.
    Script(Vec<Fragment>),
    /// Call a registered handler.
    Handler(Handler),
    /// No behaviour of its own; invoking it shows help for its subcommands.
    Group,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(fragments) => f.debug_tuple("Script").field(fragments).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Group => f.write_str("Group"),
        }
    }
}

/// One node of the command tree.
#[derive(Debug, Clone)]
pub struct CommandNode {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub flags: Vec<FlagSpec>,
    pub action: Action,
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    /// Finds a direct child by name or alias. When siblings share a name the
    /// last declared one wins, matching the name index.
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children
            .iter()
            .rev()
            .find(|c| c.name == name || c.aliases.iter().any(|a| a == name))
    }

    /// Finds a flag declared directly on this command.
    pub fn flag(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|f| f.name == name)
    }

    /// The inline script of this command, if it has one.
    pub fn fragments(&self) -> Option<&[Fragment]> {
        match &self.action {
            Action::Script(fragments) => Some(fragments),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.action, Action::Group)
    }
}
