use serde_yaml::{Mapping, Value};

/// A group of the new layout and the legacy fields it absorbs unchanged
pub struct FieldGroup {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

/// Sections every new subsection starts from, in output order.
///
/// Any of them still empty once all rules ran is left out of the output.
pub const FIXED_SECTIONS: [&str; 13] = [
    "general",
    "io",
    "drivers",
    "model",
    "sampling",
    "localization",
    "vertical balance",
    "variance",
    "optimality test",
    "fit",
    "local profiles",
    "nicas",
    "wind",
];

/// Legacy sections that already have their final shape
pub const PASS_THROUGH_SECTIONS: [&str; 3] = ["ensemble", "lowres ensemble", "operators application"];

/// Generic copy-through table, in application order
pub const FIELD_GROUPS: &[FieldGroup] = &[
    FieldGroup { name: "general", fields: &["testing"] },
    FieldGroup { name: "io", fields: &[] },
    FieldGroup { name: "drivers", fields: &[] },
    FieldGroup { name: "model", fields: &["nl0", "levs", "lev2d", "variables"] },
    FieldGroup { name: "ensemble sizes", fields: &["ens1_ne", "ens1_nsub", "ens2_ne", "ens2_nsub"] },
    FieldGroup { name: "mask", fields: &["mask_type", "mask_lu", "mask_th", "ncontig_th", "mask_check"] },
    FieldGroup {
        name: "sampling",
        fields: &[
            "nc1", "nc2", "nc3", "nc4", "dc", "nl0r", "local_diag", "local_rad", "local_dlat", "irmax",
        ],
    },
    FieldGroup { name: "localization", fields: &["ne", "ne_lr", "gau_approx", "gen_kurt_th", "avg_nbins"] },
    FieldGroup {
        name: "vertical balance",
        fields: &[
            "vbal_rad",
            "vbal_dlat",
            "vbal_pseudo_inv",
            "vbal_pseudo_inv_mmax",
            "vbal_pseudo_inv_var_th",
            "vbal_id",
        ],
    },
    FieldGroup { name: "variance", fields: &["forced_var", "var_filter", "var_niter", "var_npass"] },
    FieldGroup { name: "optimality test", fields: &["optimality_nfac", "optimality_delta", "optimality_ntest"] },
    FieldGroup { name: "fit", fields: &["diag_rhflt", "diag_rvflt", "fit_dl0", "fit_ncmp"] },
    FieldGroup { name: "local profiles", fields: &["nldwv", "lon_ldwv", "lat_ldwv", "name_ldwv"] },
    FieldGroup {
        name: "nicas",
        fields: &["resol", "nc1max", "nicas_draw_type", "forced_radii", "pos_def_test", "interp_test"],
    },
    FieldGroup {
        name: "wind",
        fields: &[
            "wind_streamfunction",
            "wind_velocity_potential",
            "wind_zonal",
            "wind_meridional",
            "wind_nlon",
            "wind_nlat",
            "wind_nsg",
            "wind_inflation",
        ],
    },
];

/// Copy every known legacy field of `legacy` into its group.
///
/// Groups that received nothing are not returned.
pub fn copy_known_fields(legacy: &Mapping) -> Vec<(&'static str, Mapping)> {
    FIELD_GROUPS
        .iter()
        .filter_map(|group| {
            let mut section = Mapping::new();
            for field in group.fields {
                if let Some(value) = legacy.get(*field) {
                    section.insert(Value::from(*field), value.clone());
                }
            }
            (!section.is_empty()).then_some((group.name, section))
        })
        .collect()
}

/// Same as [`copy_known_fields`], shaped as a grid entry of the new layout
pub fn copy_grid(legacy: &Mapping) -> Mapping {
    copy_known_fields(legacy)
        .into_iter()
        .map(|(name, section)| (Value::from(name), Value::Mapping(section)))
        .collect()
}

/// Whether `key` is absorbed by the generic pass
pub fn is_known_field(key: &str) -> bool {
    FIELD_GROUPS.iter().any(|group| group.fields.contains(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_copy_known_fields_groups_and_skips() {
        let legacy = mapping("nc1: 500\nne: 10\nvariables: [t, q]\nunknown_key: 1\nmask_type: ldwv\n");
        let groups = copy_known_fields(&legacy);
        let names: Vec<_> = groups.iter().map(|(name, _)| *name).collect();

        assert_eq!(names, vec!["model", "mask", "sampling", "localization"]);
        assert_eq!(groups[2].1.get("nc1").and_then(Value::as_u64), Some(500));
        assert!(groups.iter().all(|(_, section)| section.get("unknown_key").is_none()));
    }

    #[test]
    fn test_copy_grid_drops_unmapped_keys() {
        let grid = copy_grid(&mapping("variables: [t]\nnc3: 20\nrh: {t: [1000.0]}\n"));
        assert_eq!(grid.len(), 2);
        assert!(grid.get("model").is_some());
        assert_eq!(grid.get("sampling").unwrap()["nc3"].as_u64(), Some(20));
    }

    #[test]
    fn test_fixed_sections_are_all_field_groups() {
        for section in FIXED_SECTIONS {
            assert!(FIELD_GROUPS.iter().any(|group| group.name == section), "{}", section);
        }
        assert!(is_known_field("wind_nsg"));
        assert!(!is_known_field("colorlog"));
    }
}
