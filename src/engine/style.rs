//! Style table and formatter
//!
//! Producers mark up their fragments with short pseudo-tags (`<h1>`, `<time>`,
//! `<pre>`, ...). The viewer swaps every known tag for an inline-styled
//! wrapper so the renderer only ever has to understand `span`/`pre` with a
//! `style` attribute.
//!
//! This is literal substitution, not a markup parser: nested or unbalanced
//! tags are replaced one marker at a time and are never repaired.

use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tag that produces a block wrapper instead of an inline one
const BLOCK_TAG: &str = "pre";

/// One compiled tag substitution
#[derive(Debug, Clone)]
struct StyleRule {
    style: String,
    open: Regex,
    close: Regex,
    open_replacement: String,
    close_replacement: &'static str,
}

impl StyleRule {
    fn compile(tag: &str, style: &str) -> Option<Self> {
        let escaped = regex::escape(tag);
        let open = Regex::new(&format!("(?i)<{}>", escaped)).ok()?;
        let close = Regex::new(&format!("(?i)</{}>", escaped)).ok()?;

        // Double quotes would terminate the style attribute early
        let attr = style.replace('"', "'");
        let (open_replacement, close_replacement) = if tag == BLOCK_TAG {
            (format!("<pre style=\"{}\">", attr), "</pre>")
        } else {
            (format!("<span style=\"{}\">", attr), "</span>")
        };

        Some(Self {
            style: style.to_string(),
            open,
            close,
            open_replacement,
            close_replacement,
        })
    }

    fn apply(&self, text: &str) -> String {
        let opened = self
            .open
            .replace_all(text, NoExpand(&self.open_replacement));
        self.close
            .replace_all(&opened, NoExpand(self.close_replacement))
            .into_owned()
    }
}

/// Mapping from markup tag name (case-insensitive) to an inline style string
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    rules: BTreeMap<String, StyleRule>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(tag, style)` pairs; later duplicates overwrite
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = Self::new();
        for (tag, style) in pairs {
            table.insert(tag.as_ref(), style.as_ref());
        }
        table
    }

    /// Insert or replace the style for a tag
    pub fn insert(&mut self, tag: &str, style: &str) {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return;
        }

        match StyleRule::compile(&tag, style) {
            Some(rule) => {
                self.rules.insert(tag, rule);
            }
            None => tracing::warn!("Ignoring style for unusable tag {:?}", tag),
        }
    }

    /// Style string for a tag, if configured
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.rules
            .get(&tag.trim().to_lowercase())
            .map(|rule| rule.style.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate `(tag, style)` pairs in tag order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules
            .iter()
            .map(|(tag, rule)| (tag.as_str(), rule.style.as_str()))
    }

    /// Replace every configured tag marker in `raw` with its styled wrapper
    ///
    /// Unknown tags pass through untouched. Total over arbitrary input.
    pub fn format(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for rule in self.rules.values() {
            text = rule.apply(&text);
        }
        text
    }
}

/// Applies the current style table to incoming channel text
///
/// Holds the table behind an `Arc` so a reloaded table can be swapped in
/// without touching text that was already appended.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    styles: Arc<StyleTable>,
}

impl Formatter {
    pub fn new(styles: Arc<StyleTable>) -> Self {
        Self { styles }
    }

    pub fn format(&self, raw: &str) -> String {
        self.styles.format(raw)
    }

    pub fn styles(&self) -> &Arc<StyleTable> {
        &self.styles
    }

    /// Swap in a new table; affects only text formatted afterwards
    pub fn set_styles(&mut self, styles: Arc<StyleTable>) {
        self.styles = styles;
    }
}
