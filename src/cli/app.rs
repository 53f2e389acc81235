// src/cli/app.rs

use crate::{
    constants::ARGS_ID,
    core::tree_builder::CommandTree,
    models::{CommandNode, FlagKind, FlagSpec, FlagValue},
};
use clap::{
    Arg, ArgAction, Command,
    builder::{Styles, styling::AnsiColor},
    value_parser,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Yellow.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Green.on_default())
}

/// Builds the clap command mirroring the tree. Help and usage text come from clap.
pub fn build_command(tree: &CommandTree) -> Command {
    let mut command = node_command(tree.root()).styles(styles());
    if let Some(version) = tree.version() {
        command = command.version(version.to_string());
    }
    command
}

fn node_command(node: &CommandNode) -> Command {
    let mut command = Command::new(node.name.clone())
        .disable_help_subcommand(true)
        .visible_aliases(node.aliases.clone());
    if !node.description.is_empty() {
        command = command.about(node.description.clone());
    }

    for flag in &node.flags {
        command = command.arg(flag_arg(flag));
    }

    if !node.is_group() {
        command = command.arg(
            Arg::new(ARGS_ID)
                .value_name("ARGS")
                .num_args(0..)
                .action(ArgAction::Append),
        );
        if !node.children.is_empty() {
            command = command.args_conflicts_with_subcommands(true);
        }
    }

    // Siblings sharing a name can only survive the tree builder under the
    // overwrite policy; the last one is the one that gets dispatched.
    let children = &node.children;
    for (i, child) in children.iter().enumerate() {
        let shadowed = children
            .get(i + 1..)
            .unwrap_or_default()
            .iter()
            .any(|later| later.name == child.name);
        if !shadowed {
            command = command.subcommand(node_command(child));
        }
    }

    command
}

fn flag_arg(flag: &FlagSpec) -> Arg {
    let mut arg = Arg::new(flag.name.clone())
        .long(flag.name.clone())
        .global(flag.persistent);
    if !flag.description.is_empty() {
        arg = arg.help(flag.description.clone());
    }
    if let Some(short) = flag.short {
        arg = arg.short(short);
    }

    match flag.kind {
        FlagKind::Bool if flag.default == FlagValue::Bool(false) => {
            arg.action(ArgAction::SetTrue)
        }
        // `--flag` alone means true; `--flag=false` turns a default-on flag off.
        FlagKind::Bool => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_parser(value_parser!(bool)),
        FlagKind::Int => arg
            .action(ArgAction::Set)
            .value_name("INT")
            .value_parser(value_parser!(i64)),
        FlagKind::Float => arg
            .action(ArgAction::Set)
            .value_name("FLOAT")
            .value_parser(value_parser!(f64)),
        FlagKind::String => arg.action(ArgAction::Set).value_name("VALUE"),
    }
}
