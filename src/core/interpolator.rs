// src/core/interpolator.rs

use crate::{constants::GENERIC_ARGS_TOKEN, models::FlagValue};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

lazy_static! {
    // `flags["name"]`, where the name is the shortest run of characters up to `"]`.
    static ref FLAG_TOKEN_RE: Regex =
        Regex::new(r#"flags\["(.+?)"\]"#).expect("flag token pattern is valid");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Invalid flag \"{0}\" used in command")]
    UnknownFlag(String),
}

/// Anything that can answer "what is the current value of flag `name`?".
pub trait FlagLookup {
    fn lookup_flag(&self, name: &str) -> Option<&FlagValue>;
}

impl FlagLookup for HashMap<String, FlagValue> {
    fn lookup_flag(&self, name: &str) -> Option<&FlagValue> {
        self.get(name)
    }
}

impl FlagLookup for BTreeMap<String, FlagValue> {
    fn lookup_flag(&self, name: &str) -> Option<&FlagValue> {
        self.get(name)
    }
}

/// Expands `args...`, `args[i]` and `flags["name"]` placeholders in one fragment.
///
/// Order is fixed:
/// 1. The first `args...` becomes all arguments joined by spaces (only the first).
/// 2. Every `args[i]` with `i < args.len()` becomes the i-th argument. Higher
///    indices are left untouched.
/// 3. Every `flags["name"]` becomes the flag's rendered value. A single unknown
///    name fails the whole fragment.
pub fn substitute<L>(template: &str, args: &[String], flags: &L) -> Result<String, TemplateError>
where
    L: FlagLookup + ?Sized,
{
    let mut content = template.replacen(GENERIC_ARGS_TOKEN, &args.join(" "), 1);
    for (i, arg) in args.iter().enumerate() {
        content = content.replace(&format!("args[{}]", i), arg);
    }
    expand_flags(&content, flags)
}

/// Replaces flag tokens in a single left-to-right pass, so an inserted value is
/// never scanned again.
fn expand_flags<L>(content: &str, flags: &L) -> Result<String, TemplateError>
where
    L: FlagLookup + ?Sized,
{
    let mut expanded = String::with_capacity(content.len());
    let mut last_end = 0;

    for captures in FLAG_TOKEN_RE.captures_iter(content) {
        let (Some(full_match), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value = flags
            .lookup_flag(name.as_str())
            .ok_or_else(|| TemplateError::UnknownFlag(name.as_str().to_string()))?;

        expanded.push_str(content.get(last_end..full_match.start()).unwrap_or_default());
        expanded.push_str(&value.to_string());
        last_end = full_match.end();
    }
    expanded.push_str(content.get(last_end..).unwrap_or_default());

    Ok(expanded)
}

/// Lists the flag names referenced by a fragment, in order of appearance.
pub fn referenced_flags(template: &str) -> Vec<&str> {
    FLAG_TOKEN_RE
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}
