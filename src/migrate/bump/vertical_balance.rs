use serde_yaml::{Mapping, Value};

use super::rules::yes;
use super::{element, is_truthy, NewBump, RuleContext};
use crate::utils::error::MigrateResult;

/// Highest variable position taking part in a balance block
const MAX_BALANCED: usize = 9;

/// `(balanced, unbalanced)` variable positions in `vbal_block` order
pub fn block_pairs() -> impl Iterator<Item = (usize, usize)> {
    (1..=MAX_BALANCED).flat_map(|i| (0..i).map(move |j| (i, j)))
}

/// Expand the flat `vbal_block` flags into explicit balance blocks.
///
/// `vbal_diag_auto` and `vbal_diag_reg` default to all false; `id_coef` is
/// only written when `vbal_id_coef` is given.
pub(super) fn balance_blocks(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    let Some(flags) = ctx.sequence("vbal_block")? else {
        return Ok(false);
    };
    let diag_auto = ctx.sequence("vbal_diag_auto")?;
    let diag_reg = ctx.sequence("vbal_diag_reg")?;
    let id_coef = ctx.sequence("vbal_id_coef")?;

    let mut blocks = Vec::new();
    for (ib, (i, j)) in block_pairs().enumerate().take(flags.len()) {
        if !is_truthy(&flags[ib]) {
            continue;
        }

        let mut block = Mapping::new();
        block.insert(Value::from("balanced"), ctx.variable(i)?);
        block.insert(Value::from("unbalanced"), ctx.variable(j)?);
        if let Some(diag_auto) = diag_auto {
            if is_truthy(element(diag_auto, ib, "vbal_diag_auto")?) {
                block.insert(Value::from("diag_auto"), yes());
            }
        }
        if let Some(diag_reg) = diag_reg {
            if is_truthy(element(diag_reg, ib, "vbal_diag_reg")?) {
                block.insert(Value::from("diag_reg"), yes());
            }
        }
        if let Some(id_coef) = id_coef {
            block.insert(Value::from("id_coef"), element(id_coef, ib, "vbal_id_coef")?.clone());
        }
        blocks.push(Value::Mapping(block));
    }

    new_bump.set("vertical balance", "vbal", Value::Sequence(blocks));
    Ok(true)
}
