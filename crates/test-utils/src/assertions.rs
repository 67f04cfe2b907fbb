//! Snapshot helpers for resolved definitions.

use graphql_project::DefinitionRecord;
use std::path::Path;

/// Formats records one per line with their file relative to `root`.
///
/// ```ignore
/// let deps = cache.fragment_dependencies_for_source("default", source).await;
/// insta::assert_snapshot!(format_definitions(&deps, project.root()));
/// ```
pub fn format_definitions(records: &[DefinitionRecord], root: &Path) -> String {
    if records.is_empty() {
        return String::from("(no definitions)");
    }

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let file = record.file_path.strip_prefix(root).unwrap_or(&record.file_path);
            format!("[{}] {} ({})", i + 1, record.name, file.display())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn definition_names(records: &[DefinitionRecord]) -> Vec<&str> {
    records.iter().map(|record| record.name.as_ref()).collect()
}
