//! Ordered route tables with first-match-wins processing.
//!
//! A router holds one table of templates per key, in registration order.
//! [`Router::process`] splits text into delimiter-separated chunks and hands
//! each chunk to the first template that matches across all tables;
//! [`Router::say`] runs the other direction, sampling a template per key and
//! rendering a value into it.
//!
//! Routers are immutable once built: a roster builds one from configuration
//! and shares it with every character behind an `Arc`.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use tracing::trace;

use charactery_types::error::TemplateError;

use super::template::Template;

/// Default chunk delimiter.
pub const DEFAULT_DELIMITER: char = '|';

/// One key's ordered template list.
#[derive(Debug, Clone)]
struct RouteTable {
    key: String,
    templates: Vec<Template>,
}

/// Bidirectional pattern router over ordered route tables.
#[derive(Debug, Clone)]
pub struct Router {
    delimiter: char,
    tables: Vec<RouteTable>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create an empty router splitting on [`DEFAULT_DELIMITER`].
    pub fn new() -> Self {
        Self::with_delimiter(DEFAULT_DELIMITER)
    }

    /// Create an empty router splitting on the given delimiter.
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            tables: Vec::new(),
        }
    }

    /// Register templates for a key, appending to the key's table.
    ///
    /// Specs are lowercased before registration; a spec already present in
    /// the table is skipped. A malformed spec fails the whole call, so
    /// configuration mistakes surface before any message is processed.
    pub fn add<I, S>(mut self, key: &str, specs: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = match self.tables.iter().position(|t| t.key == key) {
            Some(index) => index,
            None => {
                self.tables.push(RouteTable {
                    key: key.to_string(),
                    templates: Vec::new(),
                });
                self.tables.len() - 1
            }
        };

        let table = &mut self.tables[index];
        for spec in specs {
            let lowered = spec.as_ref().to_lowercase();
            if table.templates.iter().any(|t| t.spec() == lowered) {
                continue;
            }
            table.templates.push(Template::parse(&lowered)?);
        }

        Ok(self)
    }

    /// Extract `(key, value)` pairs from free-form text.
    ///
    /// The text is split on the delimiter and each chunk is trimmed and
    /// evaluated independently: the first matching template wins, scanning
    /// tables in registration order and templates in registration order
    /// within each table. Captures from later chunks overwrite earlier
    /// values under the same name, keeping the earlier position. Returns
    /// `None` when no chunk matched anything.
    pub fn process(&self, text: &str) -> Option<Vec<(String, String)>> {
        let mut merged: Option<Vec<(String, String)>> = None;

        for chunk in text.split(self.delimiter).map(str::trim) {
            let mut captures = None;
            'tables: for table in &self.tables {
                for template in &table.templates {
                    if let Some(found) = template.matches(chunk) {
                        trace!(key = %table.key, spec = template.spec(), "chunk matched");
                        captures = Some(found);
                        break 'tables;
                    }
                }
            }

            let Some(captures) = captures else { continue };
            let out = merged.get_or_insert_with(Vec::new);
            for (key, value) in captures {
                if let Some(entry) = out.iter_mut().find(|(existing, _)| *existing == key) {
                    entry.1 = value;
                } else {
                    out.push((key, value));
                }
            }
        }

        merged
    }

    /// Phrase `(key, value)` pairs back into routed text.
    ///
    /// For each key with a table, one template is sampled uniformly at
    /// random and rendered with the value bound to the capture named after
    /// the key. Keys without a table and templates whose captures are not
    /// named after the key are skipped silently. Fragments join with the
    /// delimiter padded by single spaces; `None` when nothing rendered.
    pub fn say(&self, values: &[(&str, &str)]) -> Option<String> {
        let mut rng = rand::thread_rng();
        let mut parts: Vec<String> = Vec::new();

        for &(key, value) in values {
            let Some(table) = self.tables.iter().find(|t| t.key == key) else {
                continue;
            };
            let Some(template) = table.templates.choose(&mut rng) else {
                continue;
            };
            let mut single = HashMap::with_capacity(1);
            single.insert(key.to_string(), value.to_string());
            if let Some(rendered) = template.render(&single) {
                parts.push(rendered);
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(&format!(" {} ", self.delimiter)))
        }
    }

    /// Registered keys, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.key.as_str())
    }

    /// Number of templates registered for a key.
    pub fn template_count(&self, key: &str) -> usize {
        self.tables
            .iter()
            .find(|t| t.key == key)
            .map_or(0, |t| t.templates.len())
    }

    /// The chunk delimiter this router splits on.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }
}
