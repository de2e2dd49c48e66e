//! Debian control file (DCF) reader.
//!
//! A file holds one or more blocks separated by two or more newlines. Each
//! block is a list of `key: value` lines; lines indented with whitespace
//! continue the value of the previous field.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DcfError;
use crate::types::FieldMap;

static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static FIELD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^\s:]+)\s*:\s*(.*)$").unwrap());

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(contents: &str) -> String {
    contents.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split `contents` into blocks and parse each one lazily.
///
/// A malformed block yields an `Err` item; iteration continues with the
/// next block.
pub fn parse_blocks(contents: &str) -> DcfBlocks<'_> {
    DcfBlocks {
        chunks: BLOCK_SEPARATOR.split(contents),
    }
}

/// Iterator over the blocks of a DCF document, in source order.
pub struct DcfBlocks<'a> {
    chunks: regex::Split<'static, 'a>,
}

impl<'a> Iterator for DcfBlocks<'a> {
    type Item = Result<FieldMap, DcfError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Skip chunks with nothing in them (leading/trailing separators)
        loop {
            let chunk = self.chunks.next()?;
            if chunk.trim().is_empty() {
                continue;
            }
            return Some(parse_block(chunk));
        }
    }
}

/// Parse a single block into a field map.
pub fn parse_block(block: &str) -> Result<FieldMap, DcfError> {
    let mut fields = FieldMap::new();
    let mut current: Option<(String, String)> = None;

    for (index, line) in block.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            let Some((_, value)) = current.as_mut() else {
                return Err(DcfError {
                    line: index + 1,
                    content: line.to_string(),
                });
            };
            let continued = line.trim();
            value.push('\n');
            if continued != "." {
                value.push_str(continued);
            }
            continue;
        }

        if let Some((key, value)) = current.take() {
            fields.insert(key, value);
        }

        let captures = FIELD_LINE.captures(line).ok_or_else(|| DcfError {
            line: index + 1,
            content: line.to_string(),
        })?;
        current = Some((
            captures[1].to_string(),
            captures[2].trim_end().to_string(),
        ));
    }

    if let Some((key, value)) = current {
        fields.insert(key, value);
    }

    Ok(fields)
}
