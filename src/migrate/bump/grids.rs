use serde_yaml::{Mapping, Value};

use super::sections::copy_grid;
use super::{element, NewBump, RuleContext};
use crate::utils::error::{MigrateError, MigrateResult};

fn grid_mapping(grid: &Value, index: usize) -> MigrateResult<&Mapping> {
    grid.as_mapping()
        .ok_or_else(|| MigrateError::precondition(format!("`grids` entry {} is not a mapping", index + 1)))
}

/// Each grid only keeps what the generic pass knows about
pub(super) fn copy_grids(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    let Some(grids) = ctx.sequence("grids")? else {
        return Ok(false);
    };

    let new_grids = grids
        .iter()
        .enumerate()
        .map(|(i, grid)| grid_mapping(grid, i).map(|grid| Value::Mapping(copy_grid(grid))))
        .collect::<MigrateResult<Vec<_>>>()?;
    new_bump.set_top("grids", Value::Sequence(new_grids));
    Ok(true)
}

/// Variable list of the first grid that declares one
fn grid_variables<'a>(ctx: &RuleContext<'a>) -> MigrateResult<Option<&'a [Value]>> {
    let Some(grids) = ctx.sequence("grids")? else {
        return Ok(None);
    };
    for (i, grid) in grids.iter().enumerate() {
        if let Some(variables) = grid_mapping(grid, i)?.get("variables") {
            return variables
                .as_sequence()
                .map(|seq| Some(seq.as_slice()))
                .ok_or_else(|| MigrateError::precondition("grid `variables` must be a list"));
        }
    }
    Ok(None)
}

/// Build the explicit dirac point list from the parallel `*dir` arrays.
///
/// `ivdir` is 1-based into the first grid's variables, or into the
/// caller-supplied variable names when no grid declares any.
pub(super) fn dirac_points(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    let Some(ndir) = ctx.get("ndir") else {
        return Ok(false);
    };
    let ndir = ndir
        .as_u64()
        .ok_or_else(|| MigrateError::precondition("`ndir` must be a non-negative integer"))?;
    let londir = ctx.required_sequence("londir", "ndir")?;
    let latdir = ctx.required_sequence("latdir", "ndir")?;
    let levdir = ctx.required_sequence("levdir", "ndir")?;
    let ivdir = ctx.required_sequence("ivdir", "ndir")?;
    let from_grid = grid_variables(ctx)?;

    let mut points = Vec::new();
    for i in 0..ndir as usize {
        let iv = element(ivdir, i, "ivdir")?
            .as_u64()
            .filter(|iv| *iv >= 1)
            .ok_or_else(|| MigrateError::precondition("`ivdir` entries must be 1-based indices"))?
            as usize
            - 1;
        let variable = match from_grid {
            Some(names) => element(names, iv, "grid variables")?.clone(),
            None => ctx.variable(iv)?,
        };

        let mut point = Mapping::new();
        point.insert(Value::from("longitude"), element(londir, i, "londir")?.clone());
        point.insert(Value::from("latitude"), element(latdir, i, "latdir")?.clone());
        point.insert(Value::from("level"), element(levdir, i, "levdir")?.clone());
        point.insert(Value::from("variable"), variable);
        points.push(Value::Mapping(point));
    }

    new_bump.set_top("dirac", Value::Sequence(points));
    Ok(true)
}
