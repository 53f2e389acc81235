//! # Fragment Assembler
//!
//! Renders a command's ordered fragments into the body of a shell script. Every
//! fragment goes through the interpolator; in verbose mode progress banners are
//! interleaved so the user sees each heading and the exact command before it runs.

use crate::core::{
    color::{self, Banner},
    interpolator::{self, FlagLookup, TemplateError},
};
use crate::models::Fragment;

/// How the script should be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleOptions {
    pub verbose: bool,
    pub colors: bool,
}

impl AssembleOptions {
    /// Options for a terminal run: colours follow `colored`'s detection
    /// (`NO_COLOR`, `CLICOLOR_FORCE`, tty).
    pub fn for_terminal(verbose: bool) -> Self {
        Self {
            verbose,
            colors: colored::control::SHOULD_COLORIZE.should_colorize(),
        }
    }
}

/// Assembles the script text for `fragments`, in declaration order.
///
/// Per fragment: the setup line (when non-empty), then in verbose mode a heading
/// banner (when non-empty) and a banner echoing the command, then the command.
/// A final "Finished!" banner closes a verbose script.
pub fn assemble<L>(
    fragments: &[Fragment],
    args: &[String],
    flags: &L,
    options: AssembleOptions,
) -> Result<String, TemplateError>
where
    L: FlagLookup + ?Sized,
{
    let mut script = String::with_capacity(fragments.len() * 64);

    for fragment in fragments {
        let heading = interpolator::substitute(&fragment.heading, args, flags)?;
        let setup = interpolator::substitute(&fragment.setup, args, flags)?;
        let execute = interpolator::substitute(&fragment.execute, args, flags)?;

        if !setup.is_empty() {
            script.push_str(&setup);
            script.push('\n');
        }
        if options.verbose {
            if !heading.is_empty() {
                script.push_str(&color::banner_line(Banner::Heading, &heading, options.colors));
            }
            script.push_str(&color::banner_line(Banner::Command, &execute, options.colors));
        }
        script.push_str(&execute);
        script.push('\n');
    }

    if options.verbose {
        script.push_str(&color::banner_line(
            Banner::Finished,
            t!("banner.finished"),
            options.colors,
        ));
    }

    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlagValue;
    use std::collections::HashMap;

    fn step_fragment() -> Fragment {
        Fragment {
            heading: "Step".to_string(),
            setup: "export X=1".to_string(),
            execute: "echo $X".to_string(),
        }
    }

    fn verbose(colors: bool) -> AssembleOptions {
        AssembleOptions {
            verbose: true,
            colors,
        }
    }

    #[test]
    fn test_verbose_script_order() {
        let flags: HashMap<String, FlagValue> = HashMap::new();
        let script = assemble(&[step_fragment()], &[], &flags, verbose(true)).unwrap();
        let lines: Vec<&str> = script.lines().collect();

        assert_eq!(lines.len(), 5, "Script was:\n{}", script);
        assert_eq!(lines[0], "export X=1");
        assert!(lines[1].starts_with("printf ") && lines[1].contains("Step"));
        assert!(lines[2].starts_with("printf ") && lines[2].contains("echo $X"));
        assert_eq!(lines[3], "echo $X");
        assert!(lines[4].starts_with("printf ") && lines[4].contains(t!("banner.finished")));
    }

    #[test]
    fn test_quiet_script_has_no_banners() {
        let flags: HashMap<String, FlagValue> = HashMap::new();
        let options = AssembleOptions::default();
        let script = assemble(&[step_fragment()], &[], &flags, options).unwrap();
        assert_eq!(script, "export X=1\necho $X\n");
    }

    #[test]
    fn test_empty_heading_and_setup_contribute_nothing() {
        let flags: HashMap<String, FlagValue> = HashMap::new();
        let fragments = [Fragment::execute_only("make")];
        let script = assemble(&fragments, &[], &flags, verbose(false)).unwrap();
        assert_eq!(
            script,
            format!(
                "printf '==> %s\\n' 'make'\nmake\nprintf '\\n%s\\n' '{}'\n",
                t!("banner.finished")
            )
        );
    }

    #[test]
    fn test_zero_fragments() {
        let flags: HashMap<String, FlagValue> = HashMap::new();
        let quiet = assemble(&[], &[], &flags, AssembleOptions::default()).unwrap();
        assert_eq!(quiet, "");

        let loud = assemble(&[], &[], &flags, verbose(false)).unwrap();
        assert_eq!(loud.lines().count(), 1);
        assert!(loud.contains(t!("banner.finished")));
    }

    #[test]
    fn test_fragments_keep_declaration_order_and_substitute() {
        let mut flags = HashMap::new();
        flags.insert("env".to_string(), FlagValue::Text("prod".to_string()));
        let fragments = [
            Fragment {
                heading: "Build args[0]".to_string(),
                setup: String::new(),
                execute: "make args[0]".to_string(),
            },
            Fragment::execute_only(r#"deploy --env flags["env"]"#),
        ];
        let args = vec!["api".to_string()];
        let script = assemble(&fragments, &args, &flags, verbose(false)).unwrap();
        let lines: Vec<&str> = script.lines().collect();
        let finished = format!("printf '\\n%s\\n' '{}'", t!("banner.finished"));

        assert_eq!(
            lines,
            vec![
                "printf '\\n%s...\\n' 'Build api'",
                "printf '==> %s\\n' 'make api'",
                "make api",
                "printf '==> %s\\n' 'deploy --env prod'",
                "deploy --env prod",
                finished.as_str(),
            ]
        );
    }

    #[test]
    fn test_unknown_flag_aborts_assembly() {
        let flags: HashMap<String, FlagValue> = HashMap::new();
        let fragments = [
            Fragment::execute_only("echo fine"),
            Fragment::execute_only(r#"echo flags["nope"]"#),
        ];
        let result = assemble(&fragments, &[], &flags, AssembleOptions::default());
        assert_eq!(result, Err(TemplateError::UnknownFlag("nope".to_string())));
    }
}
