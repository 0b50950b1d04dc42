use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

use crate::utils::error::{MigrateError, MigrateResult};

/// Key of the legacy subsection
pub const BUMP_KEY: &str = "bump";

/// Canonical form written for every date-time scalar
pub const CANONICAL_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%SZ";

// YAML 1.1 timestamp with a time part; date-only values are left alone.
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})",
        r"(?:[Tt]|[ \t]+)(\d{1,2}):(\d{2}):(\d{2})(?:\.\d*)?",
        r"(?:[ \t]*(Z|[-+]\d{1,2}(?::?\d{2})?))?$",
    ))
    .expect("timestamp pattern is valid")
});

/// Parse YAML text into a document tree
pub fn parse_document(text: &str) -> MigrateResult<Value> {
    // libyaml yields no document at all for comment-only input
    let has_content = text.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    if !has_content {
        return Ok(Value::Null);
    }
    let mut doc: Value = serde_yaml::from_str(text).map_err(|e| MigrateError::Parse(e.to_string()))?;
    // `<<: *anchor` entries become ordinary keys
    doc.apply_merge().map_err(|e| MigrateError::Parse(e.to_string()))?;
    Ok(doc)
}

/// Rewrite every date-time scalar of the tree to its canonical string form.
///
/// Walks depth first and mutates mappings and sequences in place. Mapping
/// keys are not touched. Returns the number of rewritten scalars.
pub fn normalize_dates(value: &mut Value) -> usize {
    match value {
        Value::Mapping(map) => map.values_mut().map(normalize_dates).sum(),
        Value::Sequence(seq) => seq.iter_mut().map(normalize_dates).sum(),
        Value::Tagged(tagged) => normalize_dates(&mut tagged.value),
        Value::String(s) => match canonical_timestamp(s) {
            Some(canonical) => {
                debug!("Normalized timestamp {} -> {}", s, canonical);
                *s = canonical;
                1
            }
            None => 0,
        },
        _ => 0,
    }
}

/// Canonical UTC form of a YAML timestamp, or `None` if `s` is not one
pub fn canonical_timestamp(s: &str) -> Option<String> {
    let caps = TIMESTAMP_RE.captures(s)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, num(2)?, num(3)?)?;
    let time = NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6)?)?;
    let local = NaiveDateTime::new(date, time);

    let offset = match caps.get(7).map(|m| m.as_str()) {
        None | Some("Z") => 0,
        Some(tz) => offset_seconds(tz)?,
    };
    let utc = local.checked_sub_signed(Duration::seconds(offset))?;
    Some(utc.format(CANONICAL_TIMESTAMP).to_string())
}

// "+05", "-0530" or "+05:30" as signed seconds east of UTC
fn offset_seconds(tz: &str) -> Option<i64> {
    let sign = if tz.starts_with('-') { -1 } else { 1 };
    let digits: String = tz[1..].chars().filter(|c| *c != ':').collect();
    let (hours, minutes) = if digits.len() > 2 {
        digits.split_at(digits.len() - 2)
    } else {
        (digits.as_str(), "0")
    };
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Collect every value stored under a `bump` key, in document order.
///
/// The walk does not descend into a located subsection.
pub fn find_bumps(doc: &Value) -> Vec<&Value> {
    let mut bumps = Vec::new();
    collect_bumps(doc, &mut bumps);
    bumps
}

fn collect_bumps<'a>(value: &'a Value, bumps: &mut Vec<&'a Value>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                if key.as_str() == Some(BUMP_KEY) {
                    bumps.push(child);
                } else {
                    collect_bumps(child, bumps);
                }
            }
        }
        Value::Sequence(seq) => {
            for child in seq {
                collect_bumps(child, bumps);
            }
        }
        Value::Tagged(tagged) => collect_bumps(&tagged.value, bumps),
        _ => {}
    }
}
