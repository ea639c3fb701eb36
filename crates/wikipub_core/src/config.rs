use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OWNER: &str = "tijnisfijn";
pub const DEFAULT_REPO: &str = "Resolume-Composition-Converter";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Add wiki pages";
pub const WIKI_DIR_SUFFIX: &str = ".wiki";

/// The fixed (source, destination) page mapping. Not configurable: supporting
/// arbitrary file sets is an explicit non-goal.
pub const WIKI_PAGES: &[(&str, &str)] = &[
    ("wiki-Home.md", "Home.md"),
    ("wiki-Recent-Changes.md", "Recent-Changes.md"),
    ("wiki-Future-Roadmap.md", "Future-Roadmap.md"),
    ("wiki-Building-from-Source.md", "Building-from-Source.md"),
    ("wiki-_Sidebar.md", "_Sidebar.md"),
    ("wiki-_Footer.md", "_Footer.md"),
];

/// Optional TOML overlay over the compiled-in defaults. Resolution precedence
/// (flag > env > config > default) is applied in `runtime::resolve_runtime`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PublisherConfig {
    #[serde(default)]
    pub wiki: WikiSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiSection {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub remote_url: Option<String>,
    pub branch: Option<String>,
    pub commit_message: Option<String>,
}

/// The clone/push URL for a hosted wiki repository.
pub fn wiki_remote_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{owner}/{repo}{WIKI_DIR_SUFFIX}.git")
}

/// The browsable wiki URL printed in the final summary.
pub fn wiki_web_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{owner}/{repo}/wiki")
}

/// Load and parse a PublisherConfig from a TOML file. Returns default if the
/// file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<PublisherConfig> {
    if !config_path.exists() {
        return Ok(PublisherConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: PublisherConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}
