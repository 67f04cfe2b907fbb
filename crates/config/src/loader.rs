use crate::{ConfigError, GraphQLConfig, ProjectConfig, Result};
use std::path::{Path, PathBuf};

/// Config file names, in order of preference.
pub const CONFIG_FILES: &[&str] = &[
    ".graphqlrc.yml",
    ".graphqlrc.yaml",
    ".graphqlrc.json",
    ".graphqlrc",
    "graphql.config.yml",
    "graphql.config.yaml",
    "graphql.config.json",
];

#[derive(Debug, Clone, Copy)]
enum Format {
    Yaml,
    Json,
    /// Extensionless `.graphqlrc`: YAML first, JSON as a fallback.
    Either,
}

impl Format {
    fn detect(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml" | "yaml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            None if path.file_name().is_some_and(|name| name == ".graphqlrc") => Some(Self::Either),
            _ => None,
        }
    }
}

/// Walks up from `start_dir` looking for a config file.
#[tracing::instrument(fields(start = %start_dir.display()))]
pub fn find_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    for dir in start_dir.ancestors() {
        if let Some(found) = CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
        {
            tracing::info!(path = %found.display(), "found config file");
            return Ok(Some(found));
        }
    }
    tracing::debug!("no config file found");
    Ok(None)
}

/// Reads and validates the config file at `path`.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<GraphQLConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = load_config_from_str(&contents, path)?;
    tracing::info!(
        projects = config.project_count(),
        multi_project = config.is_multi_project(),
        "config loaded"
    );
    Ok(config)
}

/// Parses config text; `path` picks the format and labels errors.
#[tracing::instrument(skip(contents), fields(path = %path.display(), size = contents.len()))]
pub fn load_config_from_str(contents: &str, path: &Path) -> Result<GraphQLConfig> {
    let format =
        Format::detect(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    let config = match format {
        Format::Yaml => parse_yaml(contents, path)?,
        Format::Json => parse_json(contents, path)?,
        Format::Either => parse_yaml(contents, path).or_else(|_| parse_json(contents, path))?,
    };

    for (name, project) in config.projects() {
        validate_project(name, project).map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
    }
    Ok(config)
}

fn parse_yaml(contents: &str, path: &Path) -> Result<GraphQLConfig> {
    serde_saphyr::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("YAML parse error: {e}"),
    })
}

fn parse_json(contents: &str, path: &Path) -> Result<GraphQLConfig> {
    serde_json::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {e}"),
    })
}

/// A project without any schema source is valid; it simply has no schema.
fn validate_project(name: &str, project: &ProjectConfig) -> std::result::Result<(), String> {
    if let Some(schema) = &project.schema {
        if schema.paths().iter().any(|path| path.trim().is_empty()) {
            return Err(format!("project '{name}' has an empty schema path"));
        }
    }

    if let Some(endpoint) = project.endpoint() {
        if !endpoint.url.starts_with("http://") && !endpoint.url.starts_with("https://") {
            return Err(format!(
                "project '{name}' endpoint '{}' is not an http(s) URL",
                endpoint.url
            ));
        }
    }

    if let Some(documents) = &project.documents {
        let patterns = documents.patterns();
        if patterns.is_empty() {
            return Err(format!("project '{name}' has empty documents configuration"));
        }
        if patterns.iter().any(|pattern| pattern.trim().is_empty()) {
            return Err(format!("project '{name}' has an empty document pattern"));
        }
    }

    if project
        .exclude_patterns()
        .iter()
        .any(|pattern| pattern.trim().is_empty())
    {
        return Err(format!("project '{name}' has an empty exclude pattern"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SchemaConfig, DEFAULT_PROJECT};
    use std::fs;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_yaml_single_project() {
        let file = write_config(
            ".yml",
            r#"
schema: "schema.graphql"
documents: "**/*.graphql"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(!config.is_multi_project());
        assert_eq!(
            config.get_project(DEFAULT_PROJECT).unwrap().schema,
            Some(SchemaConfig::Path("schema.graphql".to_string()))
        );
    }

    #[test]
    fn loads_yaml_multi_project() {
        let file = write_config(
            ".yaml",
            r"
projects:
  web:
    schema: web/schema.graphql
    documents: web/**/*.graphql
  api:
    endpoint:
      url: https://api.example.com/graphql
",
        );
        let config = load_config(file.path()).unwrap();
        assert!(config.is_multi_project());
        assert_eq!(config.project_count(), 2);
        assert!(config.get_project("api").unwrap().endpoint().is_some());
    }

    #[test]
    fn loads_json_single_project() {
        let file = write_config(
            ".json",
            r#"{ "schema": "schema.graphql", "documents": ["a/**/*.graphql", "b/**/*.graphql"] }"#,
        );
        let config = load_config(file.path()).unwrap();
        let project = config.get_project(DEFAULT_PROJECT).unwrap();
        assert_eq!(project.document_patterns(), ["a/**/*.graphql", "b/**/*.graphql"]);
    }

    #[test]
    fn extensionless_graphqlrc_accepts_json() {
        let config =
            load_config_from_str(r#"{"schema": "s.graphql"}"#, Path::new(".graphqlrc")).unwrap();
        assert_eq!(config.project_count(), 1);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = load_config_from_str("schema: s.graphql", Path::new("graphql.config.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn empty_schema_path_is_invalid() {
        let file = write_config(".yml", "schema: \"\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn non_http_endpoint_is_invalid() {
        let err = load_config_from_str(
            "endpoint:\n  url: ftp://example.com/graphql\n",
            Path::new(".graphqlrc.yml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not an http(s) URL"), "{err}");
    }

    #[test]
    fn project_without_schema_is_valid() {
        let config =
            load_config_from_str("documents: src/**/*.graphql\n", Path::new(".graphqlrc.yml"))
                .unwrap();
        assert!(config.get_project(DEFAULT_PROJECT).unwrap().schema.is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join(".graphqlrc.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn find_config_walks_up_to_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join(".graphqlrc.yml");
        fs::write(&config_path, "schema: schema.graphql").unwrap();
        let nested = temp_dir.path().join("packages/web");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested).unwrap(), Some(config_path));
    }

    #[test]
    fn find_config_prefers_earlier_names() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("graphql.config.json"), "{}").unwrap();
        fs::write(temp_dir.path().join(".graphqlrc.yml"), "schema: a.graphql").unwrap();

        let found = find_config(temp_dir.path()).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), ".graphqlrc.yml");
    }
}
