//! Text-level replacement of legacy subsections.
//!
//! The document is never re-serialized as a whole: only the body of each
//! `bump:` marker is replaced, every other byte is copied through.
//!
//! Region invariant: the body replaced for a marker line of indentation `n`
//! is exactly the maximal run of following lines whose indentation is
//! strictly greater than `n`. The first line with indentation `<= n` (blank
//! lines count as indentation 0) ends the region and is copied verbatim.

use log::warn;
use serde_yaml::Mapping;

use crate::utils::error::{MigrateError, MigrateResult};

/// Token identifying a marker line
pub const MARKER: &str = "bump:";

/// Extra indentation of a replacement body relative to its marker
pub const BODY_INDENT: usize = 2;

/// Serialize a migrated subsection, keys in insertion order
pub fn render_bump(bump: &Mapping) -> MigrateResult<String> {
    Ok(serde_yaml::to_string(bump)?)
}

/// Leading spaces of a line
pub fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Whether `line` opens a subsection to replace
pub fn is_marker(line: &str) -> bool {
    line.contains(MARKER) && !line.starts_with('#')
}

/// Replace the body of every marker line with the next rendered subsection
pub fn splice_bumps(source: &str, replacements: &[String]) -> MigrateResult<String> {
    let mut output = String::with_capacity(source.len());
    let mut pending = replacements.iter();
    let mut target: Option<usize> = None;

    for (number, line) in source.split_inclusive('\n').enumerate() {
        let indent = indentation(line);

        if is_marker(line) {
            let replacement = pending.next().ok_or_else(|| {
                MigrateError::precondition(format!(
                    "line {} looks like a `{}` subsection but only {} subsection(s) were parsed",
                    number + 1,
                    MARKER,
                    replacements.len()
                ))
            })?;

            output.push_str(line);
            if !line.ends_with('\n') {
                output.push('\n');
            }
            let pad = " ".repeat(indent + BODY_INDENT);
            for body_line in replacement.split_inclusive('\n') {
                output.push_str(&pad);
                output.push_str(body_line);
            }
            target = Some(indent);
            continue;
        }

        if target.is_some_and(|target| indent <= target) {
            target = None;
        }
        if target.is_none() {
            output.push_str(line);
        }
    }

    let unused = pending.count();
    if unused > 0 {
        warn!("{} parsed subsection(s) had no `{}` line and were left untouched", unused, MARKER);
    }

    Ok(output)
}
