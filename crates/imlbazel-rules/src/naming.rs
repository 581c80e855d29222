//! Target naming for module rules.

use imlbazel_schemas::{Configuration, NamingRule};

/// Decides the target name of a module rule.
///
/// Projects have path-based naming conventions (e.g. every module under
/// `tools/adt/idea` is called `studio.<name>`). The assembler asks the
/// policy for each unit before applying the project id prefix.
pub trait NamingPolicy {
    /// Returns the target name for unit `name`, whose directory `relative`
    /// lies in `package`.
    fn module_name(&self, package: &str, relative: &str, name: &str) -> String;
}

/// Naming policy driven by [`Configuration::naming`]. The first rule whose
/// path prefix matches wins.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredNaming<'a> {
    rules: &'a [NamingRule],
}

impl<'a> ConfiguredNaming<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            rules: &config.naming,
        }
    }
}

impl NamingPolicy for ConfiguredNaming<'_> {
    fn module_name(&self, _package: &str, relative: &str, name: &str) -> String {
        let matching = self.rules.iter().find(|rule| {
            relative == rule.path_prefix
                || relative
                    .strip_prefix(rule.path_prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        });
        match matching {
            Some(rule) if !name.starts_with(rule.name_prefix.as_str()) => {
                format!("{}{name}", rule.name_prefix)
            }
            _ => name.to_string(),
        }
    }
}

/// Prefixes `name` with the project id, if there is one.
pub fn with_project_id(id: &str, name: &str) -> String {
    if id.is_empty() {
        name.to_string()
    } else {
        format!("{id}.{name}")
    }
}
