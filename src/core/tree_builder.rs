//! # Command Tree Builder
//!
//! Compiles a `CommandConfig` document into a frozen `CommandTree`:
//!
//! 1. Mounted documents are attached as children of the root.
//! 2. Every command is compiled (name check, flag defaults coerced, `run` normalized
//!    into fragments) and registered in the name index.
//! 3. The root receives the persistent `verbose` flag.
//! 4. Flag scopes are validated (no shadowing of inherited flags, no short clashes).
//! 5. Registered handlers are bound by name.
//! 6. Leaves left without any behaviour are rejected.
//!
//! The handler registry lives in the `TreeBuilder`; once `build` returns there is no
//! way to mutate the tree.

use crate::{
    constants::{RESERVED_FLAG_NAMES, RESERVED_SHORTS, VERBOSE_FLAG, VERBOSE_SHORT},
    core::{
        config_loader::{self, ConfigError, ConfigFormat},
        interpolator,
        invocation::Invocation,
    },
    models::{
        Action, CommandConfig, CommandNode, FlagConfig, FlagDefault, FlagKind, FlagSpec,
        FlagValue, Fragment, Handler, RunConfig,
    },
};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

/// What to do when two commands share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail the build with `ConfigError::DuplicateCommand`.
    #[default]
    Reject,
    /// Keep both nodes; the later one replaces the earlier in the name index.
    Overwrite,
}

/// Collects handlers and options, then compiles a configuration into a `CommandTree`.
#[derive(Default)]
pub struct TreeBuilder {
    handlers: HashMap<String, Handler>,
    mounts: Vec<CommandConfig>,
    duplicate_policy: DuplicatePolicy,
}

impl fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handler_names: Vec<&String> = self.handlers.keys().collect();
        handler_names.sort();
        f.debug_struct("TreeBuilder")
            .field("handlers", &handler_names)
            .field("mounts", &self.mounts.len())
            .field("duplicate_policy", &self.duplicate_policy)
            .finish()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the implementation of the command called `name`.
    /// Registering the same name twice keeps the last handler.
    pub fn handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Attaches a separately loaded document as a subcommand of the root.
    /// A document named like the root itself is skipped.
    pub fn mount(mut self, config: CommandConfig) -> Self {
        self.mounts.push(config);
        self
    }

    /// Parses configuration bytes and builds the tree.
    pub fn build_from_slice(
        self,
        bytes: &[u8],
        format: ConfigFormat,
    ) -> Result<CommandTree, ConfigError> {
        let document = config_loader::parse_document(bytes, format)?;
        self.build(document)
    }

    /// Builds and freezes the tree.
    pub fn build(self, mut document: CommandConfig) -> Result<CommandTree, ConfigError> {
        for mount in self.mounts {
            if mount.name == document.name {
                log::debug!(
                    "Skipping mounted command '{}': it has the root's name.",
                    mount.name
                );
                continue;
            }
            document.commands.push(mount);
        }

        let version = document.version.take();
        let shell = document.shell.take();

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        let mut path = Vec::new();
        let mut root = compile_node(
            &document,
            &mut path,
            &mut index,
            self.duplicate_policy,
        )?;

        if root.flag(VERBOSE_FLAG).is_none() {
            root.flags.push(verbose_flag());
        }

        validate_flag_scopes(&root, &[])?;

        for (name, handler) in self.handlers {
            let node = index
                .get(&name)
                .and_then(|path| node_at_mut(&mut root, path));
            match node {
                Some(node) => {
                    if matches!(node.action, Action::Script(_)) {
                        log::debug!(
                            "Handler for '{}' takes precedence over its inline `run`.",
                            name
                        );
                    }
                    node.action = Action::Handler(handler);
                }
                None => log::warn!(
                    "A handler was registered for '{}', but no such command exists.",
                    name
                ),
            }
        }

        ensure_bound(&root)?;
        warn_on_undeclared_flag_references(&root, &[]);

        log::debug!("Command tree built: {} command(s) indexed.", index.len());
        Ok(CommandTree {
            root,
            index,
            version,
            shell,
        })
    }
}

/// Parses configuration bytes into a tree with no handlers and default options.
pub fn build(bytes: &[u8], format: ConfigFormat) -> Result<CommandTree, ConfigError> {
    TreeBuilder::new().build_from_slice(bytes, format)
}

/// The frozen command tree: a root node plus a name index into it.
#[derive(Debug)]
pub struct CommandTree {
    root: CommandNode,
    index: HashMap<String, Vec<usize>>,
    version: Option<String>,
    shell: Option<String>,
}

impl CommandTree {
    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// Finds a command anywhere in the tree by its unique name.
    pub fn find(&self, name: &str) -> Option<&CommandNode> {
        self.lineage(name)?.last().copied()
    }

    /// The chain of nodes from the root down to the command called `name`.
    pub fn lineage(&self, name: &str) -> Option<Vec<&CommandNode>> {
        let path = self.index.get(name)?;
        let mut lineage = Vec::with_capacity(path.len() + 1);
        let mut current = &self.root;
        lineage.push(current);
        for &i in path {
            current = current.children.get(i)?;
            lineage.push(current);
        }
        Some(lineage)
    }

    /// Number of names in the index.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The interpreter requested by the configuration, if any.
    pub fn shell(&self) -> Option<&str> {
        self.shell.as_deref()
    }
}

// --- Compilation ---

fn compile_node(
    config: &CommandConfig,
    path: &mut Vec<usize>,
    index: &mut HashMap<String, Vec<usize>>,
    policy: DuplicatePolicy,
) -> Result<CommandNode, ConfigError> {
    let name = config.name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidName(config.name.clone()));
    }

    if !path.is_empty() && (config.version.is_some() || config.shell.is_some()) {
        log::warn!(
            "Command '{}' sets `version` or `shell`; only the root's values are used.",
            name
        );
    }

    if index.contains_key(name) {
        match policy {
            DuplicatePolicy::Reject => return Err(ConfigError::DuplicateCommand(name.to_string())),
            DuplicatePolicy::Overwrite => log::warn!(
                "Command '{}' is declared more than once; the last declaration wins.",
                name
            ),
        }
    }
    index.insert(name.to_string(), path.clone());

    let mut seen_flags = HashSet::new();
    let mut flags = Vec::with_capacity(config.flags.len());
    for flag_config in &config.flags {
        if !seen_flags.insert(flag_config.name.as_str()) {
            return Err(ConfigError::FlagConflict {
                command: name.to_string(),
                flag: flag_config.name.clone(),
                other: "another flag with the same name".to_string(),
            });
        }
        flags.push(compile_flag(name, flag_config)?);
    }

    let action = match &config.run {
        Some(run) => Action::Script(normalize_run(name, run)?),
        None => Action::Group,
    };

    check_sibling_aliases(&config.commands)?;

    let mut children = Vec::with_capacity(config.commands.len());
    for (i, child_config) in config.commands.iter().enumerate() {
        path.push(i);
        let child = compile_node(child_config, path, index, policy);
        path.pop();
        children.push(child?);
    }

    Ok(CommandNode {
        name: name.to_string(),
        description: config.description.clone().unwrap_or_default(),
        aliases: config.aliases.clone(),
        flags,
        action,
        children,
    })
}

/// Turns either form of `run` into the single internal representation.
fn normalize_run(command: &str, run: &RunConfig) -> Result<Vec<Fragment>, ConfigError> {
    let fragments = match run {
        RunConfig::Simple(execute) => vec![Fragment::execute_only(execute.clone())],
        RunConfig::Steps(steps) => steps
            .iter()
            .map(|step| Fragment {
                heading: step.heading.clone().unwrap_or_default(),
                setup: step.setup.clone().unwrap_or_default(),
                execute: step.execute.clone(),
            })
            .collect(),
    };

    if let Some(step) = fragments.iter().position(|f| f.execute.trim().is_empty()) {
        return Err(ConfigError::EmptyExecute {
            command: command.to_string(),
            step: step + 1,
        });
    }
    Ok(fragments)
}

fn compile_flag(command: &str, config: &FlagConfig) -> Result<FlagSpec, ConfigError> {
    let name = config.name.trim();
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::FlagConflict {
            command: command.to_string(),
            flag: config.name.clone(),
            other: "the rules for flag names (non-empty, no spaces, no leading '-')".to_string(),
        });
    }
    if RESERVED_FLAG_NAMES.contains(&name) {
        return Err(ConfigError::ReservedFlag {
            command: command.to_string(),
            name: name.to_string(),
        });
    }
    if let Some(short) = config.short.filter(|s| RESERVED_SHORTS.contains(s)) {
        return Err(ConfigError::ReservedFlag {
            command: command.to_string(),
            name: format!("-{}", short),
        });
    }

    let default = match &config.default {
        Some(value) => coerce_default(config.kind, value).ok_or_else(|| {
            ConfigError::InvalidFlagDefault {
                command: command.to_string(),
                flag: name.to_string(),
                value: value.to_string(),
                kind: config.kind,
            }
        })?,
        None => FlagValue::zero(config.kind),
    };

    Ok(FlagSpec {
        name: name.to_string(),
        kind: config.kind,
        default,
        description: config.description.clone().unwrap_or_default(),
        short: config.short,
        persistent: config.persistent,
    })
}

/// Converts a written default to the declared type. Text is parsed; numbers and
/// booleans must already match (an int is accepted where a float is expected).
fn coerce_default(kind: FlagKind, value: &FlagDefault) -> Option<FlagValue> {
    match (kind, value) {
        (FlagKind::String, FlagDefault::Text(s)) => Some(FlagValue::Text(s.clone())),
        (FlagKind::String, other) => Some(FlagValue::Text(match other {
            FlagDefault::Bool(b) => b.to_string(),
            FlagDefault::Int(i) => i.to_string(),
            FlagDefault::Float(x) => x.to_string(),
            FlagDefault::Text(s) => s.clone(),
        })),
        (FlagKind::Bool, FlagDefault::Bool(b)) => Some(FlagValue::Bool(*b)),
        (FlagKind::Bool, FlagDefault::Text(s)) => s.trim().parse().ok().map(FlagValue::Bool),
        (FlagKind::Int, FlagDefault::Int(i)) => Some(FlagValue::Int(*i)),
        (FlagKind::Int, FlagDefault::Text(s)) => s.trim().parse().ok().map(FlagValue::Int),
        (FlagKind::Float, FlagDefault::Float(x)) => Some(FlagValue::Float(*x)),
        (FlagKind::Float, FlagDefault::Int(i)) => Some(FlagValue::Float(*i as f64)),
        (FlagKind::Float, FlagDefault::Text(s)) => s.trim().parse().ok().map(FlagValue::Float),
        _ => None,
    }
}

fn verbose_flag() -> FlagSpec {
    FlagSpec {
        name: VERBOSE_FLAG.to_string(),
        kind: FlagKind::Bool,
        default: FlagValue::Bool(false),
        description: t!("cli.help.verbose").to_string(),
        short: Some(VERBOSE_SHORT),
        persistent: true,
    }
}

// --- Validation ---

/// Aliases must not collide with sibling names or other sibling aliases.
fn check_sibling_aliases(siblings: &[CommandConfig]) -> Result<(), ConfigError> {
    let names: HashSet<&str> = siblings.iter().map(|c| c.name.trim()).collect();
    let mut seen_aliases = HashSet::new();
    for sibling in siblings {
        for alias in &sibling.aliases {
            if names.contains(alias.as_str()) || !seen_aliases.insert(alias.as_str()) {
                return Err(ConfigError::AliasConflict {
                    command: sibling.name.clone(),
                    alias: alias.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Walks the tree carrying the inherited persistent flags. A command may not
/// redeclare an inherited flag nor reuse an inherited short letter.
fn validate_flag_scopes(node: &CommandNode, inherited: &[&FlagSpec]) -> Result<(), ConfigError> {
    let mut shorts: HashMap<char, &str> = inherited
        .iter()
        .filter_map(|f| f.short.map(|s| (s, f.name.as_str())))
        .collect();

    for flag in &node.flags {
        if let Some(parent_flag) = inherited.iter().find(|f| f.name == flag.name) {
            return Err(ConfigError::FlagConflict {
                command: node.name.clone(),
                flag: flag.name.clone(),
                other: format!("the inherited persistent flag '--{}'", parent_flag.name),
            });
        }
        let Some(short) = flag.short else {
            continue;
        };
        if let Some(owner) = shorts.insert(short, flag.name.as_str()) {
            return Err(ConfigError::FlagConflict {
                command: node.name.clone(),
                flag: flag.name.clone(),
                other: format!("'--{}', which already uses '-{}'", owner, short),
            });
        }
    }

    let mut scope: Vec<&FlagSpec> = inherited.to_vec();
    scope.extend(node.flags.iter().filter(|f| f.persistent));
    for child in &node.children {
        validate_flag_scopes(child, &scope)?;
    }
    Ok(())
}

/// Rejects leaves that have neither a script nor a handler.
fn ensure_bound(node: &CommandNode) -> Result<(), ConfigError> {
    if node.is_group() && node.children.is_empty() {
        return Err(ConfigError::UnboundCommand(node.name.clone()));
    }
    node.children.iter().try_for_each(ensure_bound)
}

/// Scripts referencing flags that are not in scope will fail when invoked; say so early.
fn warn_on_undeclared_flag_references(node: &CommandNode, inherited: &[&str]) {
    let mut scope: Vec<&str> = inherited.to_vec();
    scope.extend(node.flags.iter().map(|f| f.name.as_str()));

    for fragment in node.fragments().unwrap_or_default() {
        for text in [&fragment.heading, &fragment.setup, &fragment.execute] {
            for flag in interpolator::referenced_flags(text) {
                if !scope.contains(&flag) {
                    log::warn!(
                        "Command '{}' references undeclared flag '{}'; running it will fail.",
                        node.name,
                        flag
                    );
                }
            }
        }
    }

    let mut inherited_by_children: Vec<&str> = inherited.to_vec();
    inherited_by_children.extend(
        node.flags
            .iter()
            .filter(|f| f.persistent)
            .map(|f| f.name.as_str()),
    );
    for child in &node.children {
        warn_on_undeclared_flag_references(child, &inherited_by_children);
    }
}

fn node_at_mut<'a>(root: &'a mut CommandNode, path: &[usize]) -> Option<&'a mut CommandNode> {
    let mut current = root;
    for &i in path {
        current = current.children.get_mut(i)?;
    }
    Some(current)
}
