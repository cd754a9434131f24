// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors are turned into miette diagnostics. Unknown keys carry a
//! Jaro-Winkler "did you mean" suggestion and, when the offending file is
//! known, a labelled span into it.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(toolvault::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), expected))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        expected: Vec<String>,
        #[label("not a recognized key here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(toolvault::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(toolvault::config::missing_key),
        help("add `{key} = <value>` to toolvault.toml")
    )]
    MissingKey { key: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(toolvault::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(toolvault::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, expected: &[String]) -> String {
    let valid = expected.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid}"),
        None => format!("valid keys: {valid}"),
    }
}

/// Raw text of a TOML file that fed the figment, kept for span lookup.
#[derive(Debug, Clone)]
pub struct TomlSource {
    pub name: String,
    pub content: String,
}

impl TomlSource {
    pub fn inline(content: &str) -> Self {
        Self {
            name: "<inline>".to_string(),
            content: content.to_string(),
        }
    }

    /// Read whichever of `paths` exist. Relative paths are resolved against
    /// the working directory, matching how figment records them.
    pub fn read_all<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Vec<Self> {
        paths
            .into_iter()
            .filter_map(|path| {
                let content = std::fs::read_to_string(path).ok()?;
                let absolute = if path.is_relative() {
                    std::env::current_dir()
                        .map(|d| d.join(path))
                        .unwrap_or_else(|_| path.to_path_buf())
                } else {
                    path.to_path_buf()
                };
                Some(Self {
                    name: absolute.display().to_string(),
                    content,
                })
            })
            .collect()
    }
}

impl ConfigError {
    /// Convert every error carried by a `figment::Error`.
    pub fn from_figment(err: figment::Error, sources: &[TomlSource]) -> Vec<Self> {
        use figment::error::Kind;

        err.into_iter()
            .map(|error| {
                let path: Vec<String> = error.path.iter().map(ToString::to_string).collect();
                match &error.kind {
                    Kind::UnknownField(field, expected) => {
                        let (src, span) = locate(&error, &path, field, sources).unzip();
                        ConfigError::UnknownKey {
                            key: field.clone(),
                            suggestion: suggest_key(field, *expected),
                            expected: expected.iter().map(ToString::to_string).collect(),
                            span,
                            src,
                        }
                    }
                    Kind::MissingField(field) => ConfigError::MissingKey {
                        key: dotted(&path, field),
                    },
                    Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                    },
                    _ => ConfigError::Other(error.to_string()),
                }
            })
            .collect()
    }
}

fn dotted(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

fn locate(
    error: &figment::Error,
    table: &[String],
    field: &str,
    sources: &[TomlSource],
) -> Option<(NamedSource<String>, SourceSpan)> {
    let origin = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => Some(path.display().to_string()),
        _ => None,
    };
    // Inline strings carry no file path; fall back to the single source.
    let source = match origin {
        Some(name) => sources.iter().find(|s| s.name == name)?,
        None if sources.len() == 1 => &sources[0],
        None => return None,
    };
    let offset = find_key_offset(&source.content, table, field)?;
    Some((
        NamedSource::new(&source.name, source.content.clone()),
        SourceSpan::new(offset.into(), field.len()),
    ))
}

/// Byte offset of `field` as a key inside the TOML table named by `table`
/// (`[]` is the root table). Array-of-tables headers count as their table.
pub fn find_key_offset(content: &str, table: &[String], field: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            continue;
        }
        if current != wanted {
            continue;
        }
        let Some((key, _)) = trimmed.split_once('=') else {
            continue;
        };
        if key.trim() == field {
            let indent = line.len() - line.trim_start().len();
            return Some(start + indent);
        }
    }
    None
}

/// The closest of `candidates` to `unknown`, if similar enough.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, candidates: &[S]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(unknown, c.as_ref()), c.as_ref()))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        out.clear();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    eprintln!("{} configuration error(s)", errors.len());
}
