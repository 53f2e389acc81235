// src/core/invocation.rs

use crate::{
    constants::VERBOSE_FLAG,
    core::interpolator::FlagLookup,
    models::{CommandNode, FlagSpec, FlagValue},
};
use std::collections::BTreeMap;

/// Everything one run of a command needs: the node, its positional arguments and
/// the values of every flag in scope. Built fresh for each invocation and handed
/// to handlers by reference; the command tree itself is never touched.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    command: &'a CommandNode,
    args: Vec<String>,
    flags: BTreeMap<String, FlagValue>,
}

impl<'a> Invocation<'a> {
    pub fn new(
        command: &'a CommandNode,
        args: Vec<String>,
        flags: BTreeMap<String, FlagValue>,
    ) -> Self {
        Self {
            command,
            args,
            flags,
        }
    }

    /// An invocation where every in-scope flag holds its default value.
    /// `lineage` runs from the root down to the invoked command.
    pub fn with_defaults(lineage: &[&'a CommandNode], args: Vec<String>) -> Option<Self> {
        let command = *lineage.last()?;
        let flags = scoped_flags(lineage)
            .into_iter()
            .map(|spec| (spec.name.clone(), spec.default.clone()))
            .collect();
        Some(Self::new(command, args, flags))
    }

    pub fn command(&self) -> &'a CommandNode {
        self.command
    }

    pub fn name(&self) -> &str {
        &self.command.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Looks up a flag declared on the command or inherited from a persistent
    /// flag of one of its ancestors.
    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    /// The flag rendered as text, as it would be substituted into a script.
    pub fn flag_string(&self, name: &str) -> Option<String> {
        self.flag(name).map(ToString::to_string)
    }

    /// `false` when the flag is absent or not a boolean.
    pub fn flag_bool(&self, name: &str) -> bool {
        self.flag(name).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    pub fn flag_int(&self, name: &str) -> Option<i64> {
        self.flag(name).and_then(FlagValue::as_int)
    }

    pub fn flag_float(&self, name: &str) -> Option<f64> {
        self.flag(name).and_then(FlagValue::as_float)
    }

    pub fn flags(&self) -> &BTreeMap<String, FlagValue> {
        &self.flags
    }

    pub fn is_verbose(&self) -> bool {
        self.flag_bool(VERBOSE_FLAG)
    }
}

impl FlagLookup for Invocation<'_> {
    fn lookup_flag(&self, name: &str) -> Option<&FlagValue> {
        self.flag(name)
    }
}

/// The flags visible to the last command of `lineage`: persistent flags of its
/// ancestors (outermost first) followed by its own flags.
pub fn scoped_flags<'a>(lineage: &[&'a CommandNode]) -> Vec<&'a FlagSpec> {
    let Some((command, ancestors)) = lineage.split_last() else {
        return Vec::new();
    };
    ancestors
        .iter()
        .flat_map(|node| node.flags.iter().filter(|f| f.persistent))
        .chain(command.flags.iter())
        .collect()
}
