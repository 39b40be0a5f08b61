//! Dashboard configuration.
//!
//! Loaded from an optional YAML file, with `${VAR}` / `${VAR:-default}`
//! substitution, then overridden by `HSM_*` environment variables.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hsm_common::{HsmError, HsmResult};
use ingestion::ArtifactPaths;
use renderer::{ColorScheme, RenderOptions, ValueRange};
use serde::{Deserialize, Serialize};
use storage::{BlobBackend, ObjectStorageConfig};

/// Local cache used when `HSM_PNG_OUTPUT=directory` names no path.
pub const DEFAULT_PNG_DIR: &str = "cache/predictions_png";

/// Where rendered band images are written.
///
/// The blob store is the default so overlay URLs are signed; a local
/// directory is opt-in for offline development.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PngOutput {
    /// The blob store, under `{data_folder}/predictions_png`
    #[default]
    Bucket,
    /// A local cache directory
    Directory { path: PathBuf },
}

/// All settings of the dashboard data pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub storage: ObjectStorageConfig,
    pub artifacts: ArtifactPaths,
    pub png_output: PngOutput,
    pub render: RenderOptions,
    /// Lifetime of signed overlay URLs
    pub signed_url_expiry_secs: u64,
    /// Raw feature name to axis/table label
    pub feature_names: BTreeMap<String, String>,
    /// Latin species name to common name
    pub species_names: BTreeMap<String, String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            storage: ObjectStorageConfig::default(),
            artifacts: ArtifactPaths::default(),
            png_output: PngOutput::default(),
            render: RenderOptions::default(),
            signed_url_expiry_secs: 60,
            feature_names: BTreeMap::new(),
            species_names: BTreeMap::new(),
        }
    }
}

impl DashboardConfig {
    /// Load from `path` (defaults when `None`) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> HsmResult<Self> {
        let lookup = |name: &str| std::env::var(name).ok();
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    HsmError::Configuration(format!("failed to read {}: {}", path.display(), e))
                })?;
                Self::from_yaml_str(&content, lookup)?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML after expanding `${VAR}` references through `lookup`.
    pub fn from_yaml_str<F>(content: &str, lookup: F) -> HsmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_env_vars(content, &lookup)?;
        serde_yaml::from_str(&expanded)
            .map_err(|e| HsmError::Configuration(format!("invalid configuration YAML: {}", e)))
    }

    /// Apply `HSM_*` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> HsmResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(bucket) = get("HSM_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(folder) = get("HSM_DATA_FOLDER") {
            self.artifacts.data_folder = folder;
        }
        if let Some(backend) = get("HSM_BLOB_BACKEND") {
            self.storage.backend = match backend.trim().to_lowercase().as_str() {
                "gcs" => BlobBackend::Gcs,
                "public_http" | "http" => BlobBackend::PublicHttp {
                    base_url: get("HSM_PUBLIC_BASE_URL")
                        .unwrap_or_else(|| "https://storage.googleapis.com".to_string()),
                },
                "s3" => {
                    let endpoint = get("HSM_S3_ENDPOINT").ok_or_else(|| {
                        HsmError::Configuration(
                            "HSM_S3_ENDPOINT is required for the s3 backend".to_string(),
                        )
                    })?;
                    BlobBackend::S3 {
                        allow_http: endpoint.starts_with("http://"),
                        endpoint,
                        region: get("HSM_S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    }
                }
                "local" => BlobBackend::Local {
                    root: PathBuf::from(get("HSM_LOCAL_ROOT").unwrap_or_else(|| "data".to_string())),
                },
                "in_memory" | "memory" => BlobBackend::InMemory,
                other => {
                    return Err(HsmError::Configuration(format!(
                        "unknown blob backend '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(output) = get("HSM_PNG_OUTPUT") {
            self.png_output = match output.trim().to_lowercase().as_str() {
                "bucket" => PngOutput::Bucket,
                "directory" | "local" => match &self.png_output {
                    PngOutput::Directory { .. } => self.png_output.clone(),
                    PngOutput::Bucket => PngOutput::Directory {
                        path: PathBuf::from(DEFAULT_PNG_DIR),
                    },
                },
                other => {
                    return Err(HsmError::Configuration(format!(
                        "unknown PNG output '{}'",
                        other
                    )))
                }
            };
        }
        // a directory path selects local output
        if let Some(dir) = get("HSM_PNG_DIR") {
            self.png_output = PngOutput::Directory {
                path: PathBuf::from(dir),
            };
        }
        if let Some(scheme) = get("HSM_COLOR_SCHEME") {
            self.render.color_scheme = scheme;
        }
        if let Some(overwrite) = get("HSM_OVERWRITE_PNGS") {
            self.render.overwrite = parse_bool(&overwrite).ok_or_else(|| {
                HsmError::Configuration(format!(
                    "HSM_OVERWRITE_PNGS must be true or false, got '{}'",
                    overwrite
                ))
            })?;
        }
        Ok(())
    }

    /// Reject settings the pipeline would fail on later.
    pub fn validate(&self) -> HsmResult<()> {
        let invalid = |e: HsmError| HsmError::Configuration(e.to_string());

        if self.storage.bucket.trim().is_empty() {
            return Err(HsmError::Configuration("bucket cannot be empty".to_string()));
        }
        if self.signed_url_expiry_secs == 0 {
            return Err(HsmError::Configuration(
                "signed_url_expiry_secs must be greater than 0".to_string(),
            ));
        }
        ColorScheme::from_name(&self.render.color_scheme).map_err(invalid)?;
        if let Some((min, max)) = self.render.value_range {
            ValueRange::new(min, max).map_err(invalid)?;
        }
        Ok(())
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }

    /// Label for a raw feature name, title-casing unmapped names.
    pub fn feature_display_name(&self, feature: &str) -> String {
        self.feature_names
            .get(feature)
            .cloned()
            .unwrap_or_else(|| title_case(feature))
    }

    /// Common name for a species, or the latin name when unmapped.
    pub fn species_display_name(&self, latin_name: &str) -> String {
        self.species_names
            .get(latin_name)
            .cloned()
            .unwrap_or_else(|| latin_name.to_string())
    }
}

/// `woodland_cover` -> `Woodland Cover`.
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand `${VAR}` and `${VAR:-default}`.
fn expand_env_vars<F>(content: &str, lookup: &F) -> HsmResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            HsmError::Configuration(format!("unclosed variable substitution: ${{{}", after))
        })?;
        let expr = &after[..end];

        let value = match expr.split_once(":-") {
            Some((name, default)) => lookup(name.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string()),
            None => lookup(expr.trim()).ok_or_else(|| {
                HsmError::Configuration(format!("environment variable {} not set", expr.trim()))
            })?,
        };
        result.push_str(&value);
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.storage.bucket, "sygb-data");
        assert_eq!(config.storage.project_id, "sy-bat");
        assert_eq!(config.artifacts.data_folder, "app_data");
        assert_eq!(config.signed_url_expiry(), Duration::from_secs(60));
        assert_eq!(config.render.color_scheme, "viridis");
        assert!(!config.render.overwrite);
        config.validate().unwrap();
    }

    #[test]
    fn test_expand_env_vars() {
        let lookup = env(&[("FOLDER", "dev_data")]);
        assert_eq!(
            expand_env_vars("a/${FOLDER}/b", &lookup).unwrap(),
            "a/dev_data/b"
        );
        assert_eq!(
            expand_env_vars("${MISSING:-app_data}", &lookup).unwrap(),
            "app_data"
        );
        assert!(expand_env_vars("${MISSING}", &lookup).is_err());
        assert!(expand_env_vars("${FOLDER", &lookup).is_err());
        assert_eq!(expand_env_vars("no vars", &lookup).unwrap(), "no vars");
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
storage:
  bucket: ${BUCKET:-sygb-data}
  backend:
    kind: public_http
    base_url: https://storage.googleapis.com
artifacts:
  data_folder: ${FOLDER}
render:
  color_scheme: magma
  value_range: [0.0, 1.0]
png_output:
  kind: bucket
feature_names:
  woodland_cover: Woodland cover (%)
species_names:
  Myotis daubentonii: Daubenton's bat
"#;
        let config = DashboardConfig::from_yaml_str(yaml, env(&[("FOLDER", "dev_data")])).unwrap();
        assert_eq!(config.storage.bucket, "sygb-data");
        assert_eq!(config.storage.project_id, "sy-bat");
        assert_eq!(
            config.storage.backend,
            BlobBackend::PublicHttp {
                base_url: "https://storage.googleapis.com".to_string()
            }
        );
        assert_eq!(config.artifacts.results_key(), "dev_data/results.csv");
        assert_eq!(config.render.value_range, Some((0.0, 1.0)));
        assert!(!config.render.overwrite);
        assert_eq!(config.png_output, PngOutput::Bucket);
        assert_eq!(config.feature_display_name("woodland_cover"), "Woodland cover (%)");
        assert_eq!(config.species_display_name("Myotis daubentonii"), "Daubenton's bat");
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DashboardConfig::default();
        config
            .apply_overrides(env(&[
                ("HSM_BUCKET", "other-bucket"),
                ("HSM_DATA_FOLDER", "dev_data"),
                ("HSM_BLOB_BACKEND", "local"),
                ("HSM_LOCAL_ROOT", "/tmp/hsm"),
                ("HSM_PNG_DIR", "/tmp/pngs"),
                ("HSM_COLOR_SCHEME", "cividis_r"),
                ("HSM_OVERWRITE_PNGS", "true"),
            ]))
            .unwrap();

        assert_eq!(config.storage.bucket, "other-bucket");
        assert_eq!(config.artifacts.data_folder, "dev_data");
        assert_eq!(
            config.storage.backend,
            BlobBackend::Local {
                root: PathBuf::from("/tmp/hsm")
            }
        );
        assert_eq!(
            config.png_output,
            PngOutput::Directory {
                path: PathBuf::from("/tmp/pngs")
            }
        );
        assert_eq!(config.render.color_scheme, "cividis_r");
        assert!(config.render.overwrite);
    }

    #[test]
    fn test_s3_override() {
        let mut config = DashboardConfig::default();
        config
            .apply_overrides(env(&[
                ("HSM_BLOB_BACKEND", "s3"),
                ("HSM_S3_ENDPOINT", "http://localhost:9000"),
            ]))
            .unwrap();
        assert_eq!(
            config.storage.backend,
            BlobBackend::S3 {
                endpoint: "http://localhost:9000".to_string(),
                region: "us-east-1".to_string(),
                allow_http: true,
            }
        );

        let mut config = DashboardConfig::default();
        let err = config
            .apply_overrides(env(&[("HSM_BLOB_BACKEND", "s3")]))
            .unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn test_png_output_defaults_to_bucket() {
        assert_eq!(DashboardConfig::default().png_output, PngOutput::Bucket);

        let mut config = DashboardConfig::default();
        config
            .apply_overrides(env(&[("HSM_PNG_OUTPUT", "directory")]))
            .unwrap();
        assert_eq!(
            config.png_output,
            PngOutput::Directory {
                path: PathBuf::from(DEFAULT_PNG_DIR)
            }
        );

        config
            .apply_overrides(env(&[("HSM_PNG_OUTPUT", "bucket")]))
            .unwrap();
        assert_eq!(config.png_output, PngOutput::Bucket);

        let config = DashboardConfig::from_yaml_str("artifacts:\n  data_folder: app_data\n", env(&[]))
            .unwrap();
        assert_eq!(config.png_output, PngOutput::Bucket);
    }

    #[test]
    fn test_bad_overrides() {
        let mut config = DashboardConfig::default();
        assert!(config
            .apply_overrides(env(&[("HSM_BLOB_BACKEND", "ftp")]))
            .is_err());
        assert!(config
            .apply_overrides(env(&[("HSM_OVERWRITE_PNGS", "sometimes")]))
            .is_err());
        assert!(config
            .apply_overrides(env(&[("HSM_PNG_OUTPUT", "printer")]))
            .is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = DashboardConfig::default();
        config.render.color_scheme = "rainbow".to_string();
        assert_eq!(config.validate().unwrap_err().kind(), "ConfigurationError");

        let mut config = DashboardConfig::default();
        config.render.value_range = Some((1.0, 0.0));
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.signed_url_expiry_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("woodland_cover"), "Woodland Cover");
        assert_eq!(title_case("distance_to_WATER"), "Distance To Water");
        assert_eq!(title_case("ndvi"), "Ndvi");
        assert_eq!(title_case(""), "");
    }
}
