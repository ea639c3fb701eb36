use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{self, WIKI_DIR_SUFFIX, WIKI_PAGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

/// CLI-level overrides, highest precedence in resolution.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub project_root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub remote_url: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        Ok(Self { cwd })
    }
}

/// Fully resolved runtime: every value the publish sequence needs, plus where
/// each one came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRuntime {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub wiki_dir: PathBuf,
    pub owner: String,
    pub repo: String,
    pub remote_url: String,
    pub branch: String,
    pub commit_message: String,
    pub root_source: ValueSource,
    pub config_source: ValueSource,
    pub owner_source: ValueSource,
    pub repo_source: ValueSource,
    pub remote_source: ValueSource,
    pub branch_source: ValueSource,
}

impl ResolvedRuntime {
    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={} ({})\nconfig_path={} ({})\nwiki_dir={}\nowner={} ({})\nrepo={} ({})\nremote_url={} ({})\nbranch={} ({})\ncommit_message={}",
            normalize_for_display(&self.project_root),
            self.root_source.as_str(),
            normalize_for_display(&self.config_path),
            self.config_source.as_str(),
            normalize_for_display(&self.wiki_dir),
            self.owner,
            self.owner_source.as_str(),
            self.repo,
            self.repo_source.as_str(),
            self.remote_url,
            self.remote_source.as_str(),
            self.branch,
            self.branch_source.as_str(),
            self.commit_message,
        )
    }
}

pub fn resolve_runtime(context: &ResolutionContext, overrides: &Overrides) -> Result<ResolvedRuntime> {
    resolve_runtime_with_lookup(context, overrides, |key| env::var(key).ok())
}

pub fn resolve_runtime_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &Overrides,
    lookup_env: F,
) -> Result<ResolvedRuntime>
where
    F: Fn(&str) -> Option<String>,
{
    let (project_root, root_source) = if let Some(path) = overrides.project_root.as_deref() {
        (absolutize(path, &context.cwd), ValueSource::Flag)
    } else if let Some(value) = lookup_env("WIKIPUB_PROJECT_ROOT") {
        (
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        )
    } else {
        (context.cwd.clone(), ValueSource::Default)
    };

    let (config_path, config_source) = if let Some(path) = overrides.config.as_deref() {
        (absolutize(path, &project_root), ValueSource::Flag)
    } else if let Some(value) = lookup_env("WIKIPUB_CONFIG") {
        (
            absolutize(Path::new(value.trim()), &project_root),
            ValueSource::Env,
        )
    } else {
        (
            project_root.join(".wikipub").join("config.toml"),
            ValueSource::Default,
        )
    };

    let config = config::load_config(&config_path)?;

    let (owner, owner_source) = resolve_string(
        overrides.owner.as_deref(),
        "WIKIPUB_OWNER",
        config.wiki.owner.as_deref(),
        config::DEFAULT_OWNER,
        &lookup_env,
    );
    let (repo, repo_source) = resolve_string(
        overrides.repo.as_deref(),
        "WIKIPUB_REPO",
        config.wiki.repo.as_deref(),
        config::DEFAULT_REPO,
        &lookup_env,
    );
    let derived_remote = config::wiki_remote_url(&owner, &repo);
    let (remote_url, remote_source) = resolve_string(
        overrides.remote_url.as_deref(),
        "WIKIPUB_REMOTE_URL",
        config.wiki.remote_url.as_deref(),
        &derived_remote,
        &lookup_env,
    );
    let (branch, branch_source) = resolve_string(
        overrides.branch.as_deref(),
        "WIKIPUB_BRANCH",
        config.wiki.branch.as_deref(),
        config::DEFAULT_BRANCH,
        &lookup_env,
    );
    let commit_message = resolve_string(
        None,
        "WIKIPUB_COMMIT_MESSAGE",
        config.wiki.commit_message.as_deref(),
        config::DEFAULT_COMMIT_MESSAGE,
        &lookup_env,
    )
    .0;

    let wiki_dir = project_root.join(format!("{repo}{WIKI_DIR_SUFFIX}"));

    Ok(ResolvedRuntime {
        project_root,
        config_path,
        wiki_dir,
        owner,
        repo,
        remote_url,
        branch,
        commit_message,
        root_source,
        config_source,
        owner_source,
        repo_source,
        remote_source,
        branch_source,
    })
}

/// Per-page source file status within the project root.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub source: String,
    pub destination: String,
    pub exists: bool,
    pub bytes: Option<u64>,
}

pub fn inspect_sources(runtime: &ResolvedRuntime) -> Result<Vec<SourceStatus>> {
    let mut out = Vec::with_capacity(WIKI_PAGES.len());
    for (source, destination) in WIKI_PAGES {
        let path = runtime.project_root.join(source);
        let bytes = if path.exists() {
            let metadata = fs::metadata(&path)
                .with_context(|| format!("failed to inspect {}", path.display()))?;
            Some(metadata.len())
        } else {
            None
        };
        out.push(SourceStatus {
            source: (*source).to_string(),
            destination: (*destination).to_string(),
            exists: bytes.is_some(),
            bytes,
        });
    }
    Ok(out)
}

fn resolve_string<F>(
    flag: Option<&str>,
    env_key: &str,
    config_value: Option<&str>,
    default: &str,
    lookup_env: &F,
) -> (String, ValueSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = flag {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return (trimmed.to_string(), ValueSource::Flag);
        }
    }
    if let Some(value) = lookup_env(env_key) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return (trimmed.to_string(), ValueSource::Env);
        }
    }
    if let Some(value) = config_value {
        return (value.to_string(), ValueSource::Config);
    }
    (default.to_string(), ValueSource::Default)
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use tempfile::tempdir;

    use super::{
        Overrides, ResolutionContext, ValueSource, inspect_sources, resolve_runtime_with_lookup,
    };

    fn context(root: &std::path::Path) -> ResolutionContext {
        ResolutionContext {
            cwd: root.to_path_buf(),
        }
    }

    #[test]
    fn resolve_prefers_flag_over_env() {
        let temp = tempdir().expect("tempdir");
        let cwd = temp.path().join("cwd");
        let from_flag = temp.path().join("flag-root");
        fs::create_dir_all(&cwd).expect("create cwd");

        let overrides = Overrides {
            project_root: Some(from_flag.clone()),
            ..Overrides::default()
        };
        let env = HashMap::from([(
            "WIKIPUB_PROJECT_ROOT".to_string(),
            temp.path().join("env-root").to_string_lossy().to_string(),
        )]);

        let resolved =
            resolve_runtime_with_lookup(&context(&cwd), &overrides, |key| env.get(key).cloned())
                .expect("resolve");
        assert_eq!(resolved.project_root, from_flag);
        assert_eq!(resolved.root_source, ValueSource::Flag);
    }

    #[test]
    fn wiki_dir_is_repo_name_plus_suffix() {
        let temp = tempdir().expect("tempdir");
        let overrides = Overrides {
            repo: Some("project".to_string()),
            ..Overrides::default()
        };
        let resolved = resolve_runtime_with_lookup(&context(temp.path()), &overrides, |_| None)
            .expect("resolve");
        assert_eq!(resolved.wiki_dir, temp.path().join("project.wiki"));
        assert_eq!(resolved.repo_source, ValueSource::Flag);
    }

    #[test]
    fn remote_url_tracks_overridden_owner_and_repo() {
        let temp = tempdir().expect("tempdir");
        let overrides = Overrides {
            owner: Some("alice".to_string()),
            repo: Some("project".to_string()),
            ..Overrides::default()
        };
        let resolved = resolve_runtime_with_lookup(&context(temp.path()), &overrides, |_| None)
            .expect("resolve");
        assert_eq!(
            resolved.remote_url,
            "https://github.com/alice/project.wiki.git"
        );
        assert_eq!(resolved.remote_source, ValueSource::Default);
    }

    #[test]
    fn config_file_values_apply_between_env_and_default() {
        let temp = tempdir().expect("tempdir");
        let config_dir = temp.path().join(".wikipub");
        fs::create_dir_all(&config_dir).expect("config dir");
        fs::write(
            config_dir.join("config.toml"),
            "[wiki]\nowner = \"carol\"\nbranch = \"main\"\n",
        )
        .expect("write config");

        let resolved =
            resolve_runtime_with_lookup(&context(temp.path()), &Overrides::default(), |_| None)
                .expect("resolve");
        assert_eq!(resolved.owner, "carol");
        assert_eq!(resolved.owner_source, ValueSource::Config);
        assert_eq!(resolved.branch, "main");
        assert_eq!(resolved.branch_source, ValueSource::Config);
        assert_eq!(resolved.repo_source, ValueSource::Default);
    }

    #[test]
    fn relative_flag_paths_resolve_against_cwd() {
        let temp = tempdir().expect("tempdir");
        let overrides = Overrides {
            project_root: Some(PathBuf::from("nested/root")),
            ..Overrides::default()
        };
        let resolved = resolve_runtime_with_lookup(&context(temp.path()), &overrides, |_| None)
            .expect("resolve");
        assert_eq!(resolved.project_root, temp.path().join("nested/root"));
    }

    #[test]
    fn inspect_sources_reports_missing_files() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("wiki-Home.md"), "# Hello").expect("write source");

        let resolved =
            resolve_runtime_with_lookup(&context(temp.path()), &Overrides::default(), |_| None)
                .expect("resolve");
        let sources = inspect_sources(&resolved).expect("inspect");
        assert_eq!(sources.len(), 6);
        assert!(sources[0].exists);
        assert_eq!(sources[0].bytes, Some(7));
        assert!(!sources[1].exists);
        assert_eq!(sources[1].bytes, None);
    }

    #[test]
    fn diagnostics_mentions_every_resolved_value() {
        let temp = tempdir().expect("tempdir");
        let resolved =
            resolve_runtime_with_lookup(&context(temp.path()), &Overrides::default(), |_| None)
                .expect("resolve");
        let rendered = resolved.diagnostics();
        assert!(rendered.contains("project_root="));
        assert!(rendered.contains("remote_url="));
        assert!(rendered.contains("(default)"));
    }
}
