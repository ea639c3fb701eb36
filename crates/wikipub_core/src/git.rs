use std::env;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde::Serialize;

const DEFAULT_GIT_BINARY: &str = "git";

/// Result of one git invocation. Output is captured for inspection and echoed
/// to the terminal so runs stay observable from the invoking shell.
#[derive(Debug, Clone)]
pub struct GitOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutcome {
    /// Short human-readable failure description: last non-empty stderr line,
    /// or the exit code when git printed nothing.
    pub fn failure_detail(&self) -> String {
        if let Some(line) = self
            .stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
        {
            return line.to_string();
        }
        match self.code {
            Some(code) => format!("git exited with status {code}"),
            None => "git terminated by signal".to_string(),
        }
    }
}

/// Why a clone failed, judged from stderr. Report-only: every failure kind
/// still funnels into the local-init fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneFailureKind {
    RepositoryAbsent,
    AuthenticationFailed,
    Other,
}

impl CloneFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RepositoryAbsent => "repository-absent",
            Self::AuthenticationFailed => "authentication-failed",
            Self::Other => "other",
        }
    }
}

pub fn classify_clone_failure(stderr: &str) -> CloneFailureKind {
    let lowered = stderr.to_ascii_lowercase();
    if lowered.contains("not found")
        || lowered.contains("does not exist")
        || lowered.contains("does not appear to be a git repository")
    {
        return CloneFailureKind::RepositoryAbsent;
    }
    if lowered.contains("authentication failed")
        || lowered.contains("could not read username")
        || lowered.contains("permission denied")
        || lowered.contains("403")
    {
        return CloneFailureKind::AuthenticationFailed;
    }
    CloneFailureKind::Other
}

pub fn clone(url: &str, target: &Path, quiet: bool) -> Result<GitOutcome> {
    run_git(None, &["clone", url, &target.to_string_lossy()], quiet)
}

pub fn init(wiki_dir: &Path, quiet: bool) -> Result<GitOutcome> {
    run_git(Some(wiki_dir), &["init"], quiet)
}

pub fn remote_add_origin(wiki_dir: &Path, url: &str, quiet: bool) -> Result<GitOutcome> {
    run_git(Some(wiki_dir), &["remote", "add", "origin", url], quiet)
}

pub fn add_all(wiki_dir: &Path, quiet: bool) -> Result<GitOutcome> {
    run_git(Some(wiki_dir), &["add", "."], quiet)
}

pub fn commit(wiki_dir: &Path, message: &str, quiet: bool) -> Result<GitOutcome> {
    run_git(Some(wiki_dir), &["commit", "-m", message], quiet)
}

pub fn push_upstream(wiki_dir: &Path, branch: &str, quiet: bool) -> Result<GitOutcome> {
    run_git(Some(wiki_dir), &["push", "-u", "origin", branch], quiet)
}

/// Run git synchronously with no timeout; a hanging network operation blocks
/// the whole process.
pub fn run_git(workdir: Option<&Path>, args: &[&str], suppress_output: bool) -> Result<GitOutcome> {
    let binary = git_binary();
    let mut command = Command::new(&binary);
    command.args(args);
    if let Some(dir) = workdir {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .with_context(|| format!("failed to execute {binary} {}", args.join(" ")))?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !suppress_output {
        if !stdout.is_empty() {
            print!("{stdout}");
        }
        if !stderr.is_empty() {
            eprint!("{stderr}");
        }
    }

    Ok(GitOutcome {
        success: output.status.success(),
        code: output.status.code(),
        stdout,
        stderr,
    })
}

fn git_binary() -> String {
    match env::var("WIKIPUB_GIT") {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => DEFAULT_GIT_BINARY.to_string(),
    }
}
