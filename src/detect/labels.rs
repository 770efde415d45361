//! Class label table for the detection model
//!
//! The model reports per-class scores by index; the label resource maps each
//! index to a digit glyph, one glyph per line. A missing or malformed resource
//! leaves the detector in a degraded mode that reports no detections rather
//! than failing.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

/// Maps class indices to digit glyphs.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    glyphs: Vec<char>,
}

impl LabelTable {
    /// The standard ten-digit table, used when no resource is configured.
    pub fn digits() -> Self {
        Self {
            glyphs: ('0'..='9').collect(),
        }
    }

    /// An empty table. The decoder treats this as zero classes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a table from a newline-delimited resource (line index = class id).
    ///
    /// Fails on unreadable files or lines that are not a single glyph; callers
    /// that want degraded mode should use [`LabelTable::load_or_empty`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read label resource: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Malformed label resource: {:?}", path))
    }

    /// Load a table, falling back to an empty one on any error.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(e) => {
                warn!("Label resource unavailable, detector degraded to zero classes: {e:#}");
                Self::empty()
            }
        }
    }

    /// Parse newline-delimited glyphs. Every line must hold exactly one
    /// character after trimming.
    pub fn parse(content: &str) -> Result<Self> {
        let mut glyphs = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => glyphs.push(c),
                _ => anyhow::bail!("line {} is not a single glyph: {:?}", i + 1, line),
            }
        }
        Ok(Self { glyphs })
    }

    /// Glyph for a class index, if the index is known.
    pub fn glyph(&self, class_id: usize) -> Option<char> {
        self.glyphs.get(class_id).copied()
    }

    /// Number of known classes
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the table holds no classes (degraded mode)
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}
