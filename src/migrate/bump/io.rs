use serde_yaml::{Mapping, Value};

use super::{element, NewBump, RuleContext};
use crate::utils::error::MigrateResult;

/// Zip `io_keys`/`io_values` into alias records
pub(super) fn alias(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    let Some(keys) = ctx.sequence("io_keys")? else {
        return Ok(false);
    };
    let values = ctx.required_sequence("io_values", "io_keys")?;

    let mut aliases = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        let mut record = Mapping::new();
        record.insert(Value::from("in code"), key.clone());
        record.insert(Value::from("in file"), element(values, i, "io_values")?.clone());
        aliases.push(Value::Mapping(record));
    }

    new_bump.set("io", "alias", Value::Sequence(aliases));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::MigrateError;

    fn run(yaml: &str) -> MigrateResult<Mapping> {
        let legacy: Mapping = serde_yaml::from_str(yaml).unwrap();
        let ctx = RuleContext::new(&legacy, &[]);
        let mut new_bump = NewBump::new();
        alias(&ctx, &mut new_bump)?;
        Ok(new_bump.section("io").clone())
    }

    #[test]
    fn test_alias_records() {
        let io = run("io_keys: [air_temperature, surface_pressure]\nio_values: [T, ps]\n").unwrap();
        let aliases = io.get("alias").and_then(Value::as_sequence).unwrap();

        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[1]["in code"].as_str(), Some("surface_pressure"));
        assert_eq!(aliases[1]["in file"].as_str(), Some("ps"));
    }

    #[test]
    fn test_short_values_is_a_precondition_violation() {
        let err = run("io_keys: [a, b]\nio_values: [x]\n").unwrap_err();
        assert!(matches!(err, MigrateError::Precondition(_)));
    }

    #[test]
    fn test_missing_values_is_a_precondition_violation() {
        let err = run("io_keys: [a]\n").unwrap_err();
        assert!(matches!(err, MigrateError::Precondition(msg) if msg.contains("io_values")));
    }
}
