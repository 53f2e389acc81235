// src/core/color.rs

use crate::core::commons::shell_quote;

/// The progress banners interleaved with commands in verbose mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    /// `\n<green>Heading...` before a step.
    Heading,
    /// `<blue>==> <bold>command` right before the command runs.
    Command,
    /// `\n<green>Finished!` after the last step.
    Finished,
}

const GREEN: &str = "\\033[0;32m";
const BLUE: &str = "\\033[0;34m";
const BOLD: &str = "\\033[0;1m";
const RESET: &str = "\\033[m";

/// Returns the `printf` format string for a banner. The escapes are interpreted by
/// `printf` inside the generated script, not by Rust.
fn format_string(banner: Banner, colors: bool) -> String {
    match (banner, colors) {
        (Banner::Heading, true) => format!("\\n{GREEN}%s...{RESET}\\n"),
        (Banner::Heading, false) => "\\n%s...\\n".to_string(),
        (Banner::Command, true) => format!("{BLUE}==> {RESET}{BOLD}%s{RESET}\\n"),
        (Banner::Command, false) => "==> %s\\n".to_string(),
        (Banner::Finished, true) => format!("\\n{GREEN}%s{RESET}\\n"),
        (Banner::Finished, false) => "\\n%s\\n".to_string(),
    }
}

/// Renders one banner as a complete script line. The text is passed as a quoted
/// `printf` argument so it is printed literally, never expanded by the shell.
pub fn banner_line(banner: Banner, text: &str, colors: bool) -> String {
    format!(
        "printf {} {}\n",
        shell_quote(&format_string(banner, colors)),
        shell_quote(text)
    )
}
