use serde_yaml::Value;

use super::rules::yes;
use super::{NewBump, RuleContext};
use crate::utils::error::MigrateResult;

const COR_DRIVERS: &[&str] = &["compute covariance", "compute correlation"];

const LOC_DRIVERS: &[&str] = &["compute covariance", "compute correlation", "compute localization"];

const HYB_RND_DRIVERS: &[&str] = &[
    "compute covariance",
    "compute lowres covariance",
    "compute correlation",
    "compute lowres correlation",
    "compute localization",
    "compute hybrid weights",
];

const HYB_ENS_DRIVERS: &[&str] = &[
    "compute covariance",
    "compute lowres covariance",
    "compute correlation",
    "compute lowres correlation",
    "compute localization",
    "compute lowres localization",
    "compute hybrid weights",
];

/// Driver flags and hybrid source implied by a legacy `method`
pub fn method_flags(method: &str) -> Option<(&'static [&'static str], Option<&'static str>)> {
    match method {
        "cor" => Some((COR_DRIVERS, None)),
        "loc" => Some((LOC_DRIVERS, None)),
        "hyb-rnd" => Some((HYB_RND_DRIVERS, Some("randomized static"))),
        "hyb-ens" => Some((HYB_ENS_DRIVERS, Some("lowres ensemble"))),
        _ => None,
    }
}

/// `method` only means something together with `new_hdiag`
pub(super) fn method_drivers(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    if !ctx.has("new_hdiag") {
        return Ok(false);
    }
    let Some((flags, source)) = ctx.get("method").and_then(Value::as_str).and_then(method_flags) else {
        return Ok(false);
    };

    for flag in flags {
        new_bump.set("drivers", flag, yes());
    }
    if let Some(source) = source {
        new_bump.set("drivers", "hybrid source", Value::from(source));
    }
    Ok(true)
}

/// `new_hdiag` computes moments unless they are updated or loaded instead
pub(super) fn hdiag_moments(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    if !ctx.has("new_hdiag") || ctx.has("update_mom") || ctx.has("load_mom") {
        return Ok(false);
    }
    new_bump.set("drivers", "compute moments", yes());
    Ok(true)
}

/// The optimality test needs the localization pipeline switched on
pub(super) fn optimality_test(ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<bool> {
    let Some(value) = ctx.get("check_optimality") else {
        return Ok(false);
    };
    new_bump.set("drivers", "localization optimality test", value.clone());
    for flag in LOC_DRIVERS {
        new_bump.set("drivers", flag, yes());
    }
    Ok(true)
}
