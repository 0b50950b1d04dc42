use log::{debug, warn};
use serde_yaml::{Mapping, Value};

use crate::migrate::{ChangeType, MigrationChange, MigrationResult};
use crate::utils::error::{MigrateError, MigrateResult};

// Import rule modules
mod drivers;
mod grids;
mod io;
pub mod rules;
pub mod sections;
mod variables;
mod vertical_balance;

use sections::{FIXED_SECTIONS, PASS_THROUGH_SECTIONS};

/// Legacy key the original tooling meant to migrate but never did
pub const UNMIGRATED_WRITE_SAMP_GRIDS: &str = "write_samp_grids";

/// New subsection under construction.
///
/// Sections keep the order in which they were first created; the fixed
/// sections are created up front so they always lead the output.
pub struct NewBump {
    sections: Vec<(&'static str, Mapping)>,
    extras: Vec<(&'static str, Value)>,
}

impl NewBump {
    pub fn new() -> Self {
        NewBump {
            sections: FIXED_SECTIONS.iter().map(|name| (*name, Mapping::new())).collect(),
            extras: Vec::new(),
        }
    }

    /// Mutable access to a section, creating it at the end if needed
    pub fn section(&mut self, name: &'static str) -> &mut Mapping {
        let index = match self.sections.iter().position(|(existing, _)| *existing == name) {
            Some(index) => index,
            None => {
                self.sections.push((name, Mapping::new()));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].1
    }

    /// Set `section.field`, keeping the field's position if it already exists
    pub fn set(&mut self, section: &'static str, field: &str, value: Value) {
        self.section(section).insert(Value::from(field), value);
    }

    /// Set a top-level key that lives after the sections
    pub fn set_top(&mut self, key: &'static str, value: Value) {
        match self.extras.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.extras.push((key, value)),
        }
    }

    /// Final mapping, without the sections that stayed empty
    pub fn into_mapping(self) -> Mapping {
        let mut mapping = Mapping::new();
        for (name, section) in self.sections {
            if !section.is_empty() {
                mapping.insert(Value::from(name), Value::Mapping(section));
            }
        }
        for (key, value) in self.extras {
            mapping.insert(Value::from(key), value);
        }
        mapping
    }
}

impl Default for NewBump {
    fn default() -> Self {
        Self::new()
    }
}

/// Read access to one legacy subsection for the rules
pub struct RuleContext<'a> {
    legacy: &'a Mapping,
    variables: &'a [String],
}

impl<'a> RuleContext<'a> {
    pub fn new(legacy: &'a Mapping, variables: &'a [String]) -> Self {
        RuleContext { legacy, variables }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.legacy.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.legacy.contains_key(key)
    }

    /// Sequence stored under `key`, if present
    pub fn sequence(&self, key: &str) -> MigrateResult<Option<&'a [Value]>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_sequence()
                .map(|seq| Some(seq.as_slice()))
                .ok_or_else(|| MigrateError::precondition(format!("`{}` must be a list", key))),
        }
    }

    /// Sequence that another field depends on
    pub fn required_sequence(&self, key: &str, needed_by: &str) -> MigrateResult<&'a [Value]> {
        self.sequence(key)?.ok_or_else(|| {
            MigrateError::precondition(format!("`{}` is required by `{}`", key, needed_by))
        })
    }

    /// Mapping stored under `key`, if present
    pub fn mapping(&self, key: &str) -> MigrateResult<Option<&'a Mapping>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_mapping()
                .map(Some)
                .ok_or_else(|| MigrateError::precondition(format!("`{}` must be a mapping", key))),
        }
    }

    /// Caller-supplied variable name at 0-based `index`
    pub fn variable(&self, index: usize) -> MigrateResult<Value> {
        self.variables.get(index).map(|name| Value::from(name.as_str())).ok_or_else(|| {
            MigrateError::precondition(format!(
                "variable {} requested but only {} variable name(s) supplied",
                index + 1,
                self.variables.len()
            ))
        })
    }
}

/// Entry `index` of a parallel array
pub fn element<'v>(seq: &'v [Value], index: usize, name: &str) -> MigrateResult<&'v Value> {
    seq.get(index).ok_or_else(|| {
        MigrateError::precondition(format!(
            "`{}` has {} entries, entry {} is required",
            name,
            seq.len(),
            index + 1
        ))
    })
}

// YAML 1.1 spellings of false that YAML 1.2 loads as strings
const YAML11_FALSE: [&str; 8] = ["n", "N", "no", "No", "NO", "off", "Off", "OFF"];

/// Truth value of a legacy flag
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty() && !YAML11_FALSE.contains(&s.as_str()),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Rewrites legacy subsections into the sectioned layout
pub struct BumpMigrator<'a> {
    variables: &'a [String],
}

impl<'a> BumpMigrator<'a> {
    pub fn new(variables: &'a [String]) -> Self {
        BumpMigrator { variables }
    }

    /// Migrate the `index`-th located subsection
    pub fn migrate(
        &self,
        index: usize,
        legacy: &Value,
        result: &mut MigrationResult,
    ) -> MigrateResult<Mapping> {
        let location = format!("bump #{}", index + 1);
        let legacy = legacy.as_mapping().ok_or_else(|| {
            MigrateError::precondition(format!("{} is not a mapping", location))
        })?;
        let ctx = RuleContext::new(legacy, self.variables);
        let mut new_bump = NewBump::new();

        for (name, section) in sections::copy_known_fields(legacy) {
            result.changes.push(MigrationChange {
                location: location.clone(),
                change_type: ChangeType::Copied,
                description: format!("{} field(s) copied into `{}`", section.len(), name),
            });
            *new_bump.section(name) = section;
        }

        for rule in rules::RULES {
            if let Some(description) = rule.apply(&ctx, &mut new_bump)? {
                debug!("{}: {}", location, description);
                result.changes.push(MigrationChange {
                    location: location.clone(),
                    change_type: rule.change_type(),
                    description,
                });
            }
        }

        for name in PASS_THROUGH_SECTIONS {
            if let Some(value) = legacy.get(name) {
                new_bump.set_top(name, value.clone());
                result.changes.push(MigrationChange {
                    location: location.clone(),
                    change_type: ChangeType::PassedThrough,
                    description: format!("`{}` kept as is", name),
                });
            }
        }

        self.report_dropped_keys(&location, legacy, result);

        Ok(new_bump.into_mapping())
    }

    fn report_dropped_keys(&self, location: &str, legacy: &Mapping, result: &mut MigrationResult) {
        for key in legacy.keys() {
            let warning = match key.as_str() {
                Some(UNMIGRATED_WRITE_SAMP_GRIDS) => format!(
                    "{}: `{}` has no migration rule and was dropped, set `drivers.write sampling grids` by hand",
                    location, UNMIGRATED_WRITE_SAMP_GRIDS
                ),
                Some(name) if rules::is_consumed(name) => continue,
                Some(name) => format!("{}: unrecognized key `{}` was dropped", location, name),
                None => format!("{}: non-string key {:?} was dropped", location, key),
            };
            warn!("{}", warning);
            result.changes.push(MigrationChange {
                location: location.to_string(),
                change_type: ChangeType::Ignored,
                description: format!("`{}` dropped", key.as_str().unwrap_or("<non-string key>")),
            });
            result.warnings.push(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrate_with(yaml: &str, variables: &[&str]) -> (Mapping, MigrationResult) {
        let legacy: Value = serde_yaml::from_str(yaml).unwrap();
        let variables: Vec<String> = variables.iter().map(|v| v.to_string()).collect();
        let mut result = MigrationResult::default();
        let mapping = BumpMigrator::new(&variables).migrate(0, &legacy, &mut result).unwrap();
        (mapping, result)
    }

    fn keys(mapping: &Mapping) -> Vec<&str> {
        mapping.keys().filter_map(Value::as_str).collect()
    }

    #[test]
    fn test_sections_in_layout_order() {
        let (mapping, _) = migrate_with(
            "prefix: test\n\
             ens1_ne: 10\n\
             colorlog: true\n\
             ensemble:\n  members: []\n\
             grids:\n- variables: [t]\n  nl0: 2\n\
             ndir: 1\nlondir: [0.0]\nlatdir: [10.0]\nlevdir: [1]\nivdir: [1]\n\
             nc1: 100\n",
            &["var1", "var2", "var3", "var4"],
        );

        assert_eq!(
            keys(&mapping),
            vec!["general", "io", "sampling", "ensemble sizes", "grids", "dirac", "ensemble"]
        );
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let (mapping, result) = migrate_with("datadir: data\n", &[]);
        assert_eq!(keys(&mapping), vec!["io"]);
        assert_eq!(mapping.get("io").unwrap()["data directory"].as_str(), Some("data"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unrecognized_keys_are_reported() {
        let (mapping, result) = migrate_with("prefix: x\nfoo: 1\nwrite_samp_grids: true\n", &[]);

        assert_eq!(keys(&mapping), vec!["io"]);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("`foo`"));
        assert!(result.warnings[1].contains("write sampling grids"));
        assert!(mapping.get("drivers").is_none());
    }

    #[test]
    fn test_new_style_subsection_is_not_renamed() {
        let (mapping, result) = migrate_with(
            "general:\n  color log: true\n\
             io:\n  data directory: data\n\
             drivers:\n  compute covariance: true\n\
             ensemble:\n  members: []\n",
            &[],
        );

        assert_eq!(keys(&mapping), vec!["ensemble"]);
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_non_mapping_subsection_is_a_precondition_violation() {
        let legacy = Value::Null;
        let mut result = MigrationResult::default();
        let err = BumpMigrator::new(&[]).migrate(1, &legacy, &mut result).unwrap_err();
        assert!(matches!(err, MigrateError::Precondition(msg) if msg.contains("bump #2")));
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&Value::from(true)));
        assert!(is_truthy(&Value::from(2)));
        assert!(!is_truthy(&Value::from(0.0)));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::from("")));
        assert!(!is_truthy(&Value::from("no")));
        assert!(!is_truthy(&Value::from("OFF")));
        assert!(!is_truthy(&Value::from("n")));
        assert!(is_truthy(&Value::from("yes")));
        assert!(is_truthy(&Value::from("On")));
    }
}
