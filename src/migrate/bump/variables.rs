use serde_yaml::{Mapping, Value};

use super::{NewBump, RuleContext};
use crate::utils::error::{MigrateError, MigrateResult};

const VARIANCE_PROFILES: [&str; 2] = ["stddev", "var_rhflt"];

const NICAS_PROFILES: [&str; 4] = ["rh", "rv", "min_lev", "max_lev"];

fn record(variables: &str, variable: &Value) -> Mapping {
    let mut record = Mapping::new();
    record.insert(Value::from(variables), Value::Sequence(vec![variable.clone()]));
    record
}

/// One `{variables, value}` or `{variables, profile}` record per variable.
///
/// A single-element list is a constant value; any other length is a
/// vertical profile.
pub fn profile_records(key: &str, per_variable: &Mapping) -> MigrateResult<Vec<Value>> {
    per_variable
        .iter()
        .map(|(variable, values)| {
            let values = values.as_sequence().ok_or_else(|| {
                MigrateError::precondition(format!("`{}` values must be lists", key))
            })?;
            let mut entry = record("variables", variable);
            match values.as_slice() {
                [value] => entry.insert(Value::from("value"), value.clone()),
                _ => entry.insert(Value::from("profile"), Value::Sequence(values.clone())),
            };
            Ok(Value::Mapping(entry))
        })
        .collect()
}

fn expand_profiles(
    ctx: &RuleContext<'_>,
    new_bump: &mut NewBump,
    section: &'static str,
    keys: &[&str],
) -> MigrateResult<bool> {
    let mut applied = false;
    for key in keys {
        if let Some(per_variable) = ctx.mapping(key)? {
            new_bump.set(section, key, Value::Sequence(profile_records(key, per_variable)?));
            applied = true;
        }
    }
    Ok(applied)
}

pub(super) fn variance_profiles(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    expand_profiles(ctx, new_bump, "variance", &VARIANCE_PROFILES)
}

pub(super) fn nicas_profiles(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    expand_profiles(ctx, new_bump, "nicas", &NICAS_PROFILES)
}

pub(super) fn interp_types(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    let Some(per_variable) = ctx.mapping("nicas_interp_type")? else {
        return Ok(false);
    };

    let records = per_variable
        .iter()
        .map(|(variable, interp)| {
            let mut entry = record("variables", variable);
            entry.insert(Value::from("type"), interp.clone());
            Value::Mapping(entry)
        })
        .collect();
    new_bump.set("nicas", "interp_type", Value::Sequence(records));
    Ok(true)
}

/// `"row-column"` keyed weights into explicit row/column records
pub(super) fn localization_weights(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    let Some(weights) = ctx.mapping("loc_wgt")? else {
        return Ok(false);
    };

    let mut records = Vec::with_capacity(weights.len());
    for (pair, weight) in weights {
        let (row, column) = split_pair(pair)?;
        let mut entry = record("row variables", &Value::from(row));
        entry.insert(Value::from("column variables"), Value::Sequence(vec![Value::from(column)]));
        entry.insert(Value::from("value"), weight.clone());
        records.push(Value::Mapping(entry));
    }
    new_bump.set("nicas", "loc_wgt", Value::Sequence(records));
    Ok(true)
}

fn split_pair(pair: &Value) -> MigrateResult<(&str, &str)> {
    let mut parts = pair.as_str().unwrap_or_default().split('-');
    match (parts.next(), parts.next()) {
        (Some(row), Some(column)) => Ok((row, column)),
        _ => Err(MigrateError::precondition(format!(
            "`loc_wgt` key {:?} is not of the form row-column",
            pair
        ))),
    }
}
