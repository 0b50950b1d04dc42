//! Ordered rule table applied to every legacy subsection after the generic
//! copy pass. Later rules may overwrite fields written by earlier ones; an
//! overwritten field keeps its original position.

use serde_yaml::Value;

use super::sections::{is_known_field, PASS_THROUGH_SECTIONS};
use super::{drivers, grids, io, variables, vertical_balance, NewBump, RuleContext};
use crate::migrate::ChangeType;
use crate::utils::error::MigrateResult;

/// Section-specific expansion of one or more legacy keys
pub type Expand = fn(&RuleContext<'_>, &mut NewBump) -> MigrateResult<bool>;

pub enum Rule {
    /// Copy a legacy field under a new name
    Rename {
        legacy: &'static str,
        section: &'static str,
        field: &'static str,
    },
    /// `update_*` sets the flag and `iterative algorithm`, `new_*` only the flag
    Iterative {
        new: &'static str,
        update: &'static str,
        field: &'static str,
    },
    /// Restructuring that reads `keys` and writes whatever it needs
    Expand {
        name: &'static str,
        keys: &'static [&'static str],
        apply: Expand,
    },
}

const fn rename(legacy: &'static str, section: &'static str, field: &'static str) -> Rule {
    Rule::Rename { legacy, section, field }
}

const fn iterative(new: &'static str, update: &'static str, field: &'static str) -> Rule {
    Rule::Iterative { new, update, field }
}

const fn expand(name: &'static str, keys: &'static [&'static str], apply: Expand) -> Rule {
    Rule::Expand { name, keys, apply }
}

pub static RULES: &[Rule] = &[
    expand("grids", &["grids"], grids::copy_grids),
    // general
    rename("colorlog", "general", "color log"),
    rename("default_seed", "general", "default seed"),
    rename("repro", "general", "reproducibility operators"),
    rename("rth", "general", "reproducibility threshold"),
    rename("universe_rad", "general", "universe radius"),
    // io
    rename("datadir", "io", "data directory"),
    rename("prefix", "io", "files prefix"),
    rename("parallel_io", "io", "parallel netcdf"),
    rename("nprocio", "io", "io task number"),
    rename("fname_samp", "io", "overriding sampling file"),
    rename("fname_vbal_cov", "io", "overriding vertical covariance file"),
    rename("fname_vbal", "io", "overriding vertical balance file"),
    rename("fname_mom", "io", "overriding moments file"),
    rename("fname_nicas", "io", "overriding nicas file"),
    rename("fname_wind", "io", "overriding psichitouv file"),
    expand("io alias", &["io_keys", "io_values"], io::alias),
    // drivers
    expand("method drivers", &["method", "new_hdiag"], drivers::method_drivers),
    rename("strategy", "drivers", "multivariate strategy"),
    rename("new_normality", "drivers", "compute normality"),
    rename("load_samp_local", "drivers", "load local sampling"),
    rename("load_samp_global", "drivers", "load global sampling"),
    rename("write_samp_local", "drivers", "write local sampling"),
    rename("write_samp_global", "drivers", "write global sampling"),
    iterative("new_vbal_cov", "update_vbal_cov", "compute vertical covariance"),
    rename("load_vbal_cov", "drivers", "load vertical covariance"),
    rename("write_vbal_cov", "drivers", "write vertical covariance"),
    rename("new_vbal", "drivers", "compute vertical balance"),
    rename("load_vbal", "drivers", "load vertical balance"),
    rename("write_vbal", "drivers", "write vertical balance"),
    iterative("new_var", "update_var", "compute variance"),
    iterative("new_mom", "update_mom", "compute moments"),
    rename("load_mom", "drivers", "load moments"),
    rename("write_mom", "drivers", "write moments"),
    expand("hdiag moments", &["new_hdiag"], drivers::hdiag_moments),
    rename("write_hdiag", "drivers", "write diagnostics"),
    rename("write_hdiag_detail", "drivers", "write diagnostics detail"),
    rename("new_nicas", "drivers", "compute nicas"),
    rename("load_nicas_local", "drivers", "load local nicas"),
    rename("load_nicas_global", "drivers", "load global nicas"),
    rename("write_nicas_local", "drivers", "write local nicas"),
    rename("write_nicas_global", "drivers", "write global nicas"),
    rename("write_nicas_grids", "drivers", "write nicas grids"),
    rename("new_wind", "drivers", "compute psichitouv"),
    rename("load_wind_local", "drivers", "load local psichitouv"),
    rename("write_wind_local", "drivers", "write local psichitouv"),
    rename("check_vbal", "drivers", "vertical balance inverse test"),
    rename("check_adjoints", "drivers", "adjoints test"),
    rename("check_normalization", "drivers", "normalization test"),
    rename("check_dirac", "drivers", "internal dirac test"),
    rename("check_randomization", "drivers", "randomization test"),
    rename("check_consistency", "drivers", "internal consistency test"),
    expand("optimality test", &["check_optimality"], drivers::optimality_test),
    // sampling
    rename("diag_draw_type", "sampling", "draw_type"),
    rename("samp_interp_type", "sampling", "interp_type"),
    // vertical balance
    expand(
        "balance blocks",
        &["vbal_block", "vbal_diag_auto", "vbal_diag_reg", "vbal_id_coef"],
        vertical_balance::balance_blocks,
    ),
    // per-variable values and profiles
    expand("variance profiles", &["stddev", "var_rhflt"], variables::variance_profiles),
    expand("nicas profiles", &["rh", "rv", "min_lev", "max_lev"], variables::nicas_profiles),
    expand("nicas interpolation", &["nicas_interp_type"], variables::interp_types),
    expand("localization weights", &["loc_wgt"], variables::localization_weights),
    // dirac
    expand(
        "dirac points",
        &["ndir", "londir", "latdir", "levdir", "ivdir"],
        grids::dirac_points,
    ),
];

impl Rule {
    /// Legacy keys this rule reads
    pub fn legacy_keys(&self) -> Vec<&'static str> {
        match *self {
            Rule::Rename { legacy, .. } => vec![legacy],
            Rule::Iterative { new, update, .. } => vec![new, update],
            Rule::Expand { keys, .. } => keys.to_vec(),
        }
    }

    pub fn change_type(&self) -> ChangeType {
        match self {
            Rule::Rename { .. } => ChangeType::Renamed,
            Rule::Iterative { .. } | Rule::Expand { .. } => ChangeType::Converted,
        }
    }

    /// Apply the rule, describing what it did if it fired
    pub fn apply(&self, ctx: &RuleContext<'_>, new_bump: &mut NewBump) -> MigrateResult<Option<String>> {
        match *self {
            Rule::Rename { legacy, section, field } => Ok(ctx.get(legacy).map(|value| {
                new_bump.set(section, field, value.clone());
                format!("`{}` -> `{}.{}`", legacy, section, field)
            })),
            Rule::Iterative { new, update, field } => {
                if let Some(value) = ctx.get(update) {
                    new_bump.set("drivers", field, value.clone());
                    new_bump.set("drivers", "iterative algorithm", value.clone());
                    Ok(Some(format!("`{}` -> `drivers.{}` with iterative algorithm", update, field)))
                } else if let Some(value) = ctx.get(new) {
                    new_bump.set("drivers", field, value.clone());
                    Ok(Some(format!("`{}` -> `drivers.{}`", new, field)))
                } else {
                    Ok(None)
                }
            }
            Rule::Expand { name, apply, .. } => {
                Ok(apply(ctx, new_bump)?.then(|| format!("{} expanded", name)))
            }
        }
    }
}

/// Whether some part of the migration reads legacy key `key`
pub fn is_consumed(key: &str) -> bool {
    is_known_field(key)
        || PASS_THROUGH_SECTIONS.contains(&key)
        || RULES.iter().any(|rule| rule.legacy_keys().contains(&key))
}

/// Shorthand for the `true` flag many rules write
pub(super) fn yes() -> Value {
    Value::Bool(true)
}
