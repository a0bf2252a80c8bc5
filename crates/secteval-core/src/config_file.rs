use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub tools: Option<ToolsConfig>,
    pub data: Option<DataConfig>,
}

/// Locations of the third-party extraction toolchains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub pdffigures2_home: Option<String>,
    pub grobid_home: Option<String>,
    pub parscit_home: Option<String>,
    /// Root for backend scratch and cache directories. Defaults to the
    /// working directory.
    pub cache_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding dataset manifests, annotations, and PDFs.
    pub data_dir: Option<String>,
    /// Section names excluded from scoring (substring match on lowercased
    /// raw text). Defaults to `["abstract"]`.
    pub excluded_names: Option<Vec<String>>,
}

/// Platform config directory path: `<config_dir>/secteval/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("secteval").join("config.toml"))
}

/// Load config by cascading CWD `.secteval.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".secteval.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let pick = |o: Option<String>, b: Option<String>| o.or(b);
    let base_tools = base.tools.unwrap_or_default();
    let overlay_tools = overlay.tools.unwrap_or_default();
    let base_data = base.data.unwrap_or_default();
    let overlay_data = overlay.data.unwrap_or_default();

    ConfigFile {
        tools: Some(ToolsConfig {
            pdffigures2_home: pick(overlay_tools.pdffigures2_home, base_tools.pdffigures2_home),
            grobid_home: pick(overlay_tools.grobid_home, base_tools.grobid_home),
            parscit_home: pick(overlay_tools.parscit_home, base_tools.parscit_home),
            cache_dir: pick(overlay_tools.cache_dir, base_tools.cache_dir),
        }),
        data: Some(DataConfig {
            data_dir: pick(overlay_data.data_dir, base_data.data_dir),
            excluded_names: overlay_data.excluded_names.or(base_data.excluded_names),
        }),
    }
}
