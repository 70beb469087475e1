//! Query string tokenizer.
//!
//! A query is a comma-separated list of `key<operator>value` groups,
//! e.g. `name:john,role.name=admin`. Each entity kind supplies a
//! [`Grammar`]: a regular expression with three capture groups (key,
//! operator, value) that recognizes one group terminated by `,`. The
//! operator alternation lists longer literals first so that `:=` and
//! `:~` win over `:`.
//!
//! Values cannot contain `,`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::search::criterion::Criterion;

/// Group separator. Appended to every input so the last group is
/// terminated.
pub const SEPARATOR: char = ',';

/// Grammar for account and user searches.
pub const USER_OPERATION_PATTERN: &str = r"([A-Za-z0-9_.]+?)(:~|:|=)(.+?),";

/// Grammar for application searches.
pub const APPLICATION_OPERATION_PATTERN: &str = r"([A-Za-z0-9_.]+?)(:=|:~|:|=|<|>)(.+?),";

lazy_static! {
    pub static ref USER_GRAMMAR: Grammar =
        Grammar::new(USER_OPERATION_PATTERN).expect("user operation pattern is valid");
    pub static ref APPLICATION_GRAMMAR: Grammar = Grammar::new(APPLICATION_OPERATION_PATTERN)
        .expect("application operation pattern is valid");
}

/// Compiled token grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    pattern: Regex,
}

impl Grammar {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

/// Split `raw` into criteria, in order.
///
/// Every criterion gets the same `or` flag: one query combines either
/// entirely with AND or entirely with OR. Text the grammar does not
/// recognize is skipped.
pub fn parse(raw: &str, grammar: &Grammar, or: bool) -> Vec<Criterion> {
    let input = format!("{raw}{SEPARATOR}");
    grammar
        .pattern
        .captures_iter(&input)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str();
            let operator = caps.get(2)?.as_str();
            let value = caps.get(3)?.as_str();
            Some(Criterion::new(key, operator, value, or))
        })
        .collect()
}
