use std::fs;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::WIKI_PAGES;
use crate::git::{self, CloneFailureKind};
use crate::runtime::{ResolvedRuntime, SourceStatus, inspect_sources, normalize_for_display};

/// Printed when publication fails; a fresh hosted wiki rejects pushes until
/// its first page exists.
pub const FIRST_PAGE_HINT: &str =
    "You may need to create the first wiki page manually through the hosting platform's web interface before pushing changes.";

#[derive(Debug, Clone, Serialize)]
pub struct FallbackReport {
    pub created_dir: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionReport {
    pub cloned: bool,
    pub clone_failure: Option<CloneFailureKind>,
    pub fallback: Option<FallbackReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StagedPage {
    pub source: String,
    pub destination: String,
    pub bytes: u64,
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub pages: Vec<StagedPage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub pushed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub remote_url: String,
    pub branch: String,
    pub wiki_dir: String,
    pub acquisition: AcquisitionReport,
    pub staged: StageReport,
    pub push: PushReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub remote_url: String,
    pub branch: String,
    pub wiki_dir: String,
    pub commit_message: String,
    pub sources: Vec<SourceStatus>,
}

/// Step 1: clone the wiki repository, falling back to local initialization on
/// any clone failure. The absent-vs-transient distinction is reported but
/// deliberately not acted on. Failures inside the fallback itself are fatal.
pub fn acquire_repository(runtime: &ResolvedRuntime, quiet: bool) -> Result<AcquisitionReport> {
    let outcome = git::clone(&runtime.remote_url, &runtime.wiki_dir, quiet)?;
    if outcome.success {
        return Ok(AcquisitionReport {
            cloned: true,
            clone_failure: None,
            fallback: None,
        });
    }

    let clone_failure = git::classify_clone_failure(&outcome.stderr);

    let created_dir = if runtime.wiki_dir.exists() {
        false
    } else {
        fs::create_dir_all(&runtime.wiki_dir)
            .with_context(|| format!("failed to create {}", runtime.wiki_dir.display()))?;
        true
    };

    let init = git::init(&runtime.wiki_dir, quiet)?;
    if !init.success {
        bail!(
            "git init failed in {}: {}",
            normalize_for_display(&runtime.wiki_dir),
            init.failure_detail()
        );
    }

    let remote = git::remote_add_origin(&runtime.wiki_dir, &runtime.remote_url, quiet)?;
    if !remote.success {
        bail!(
            "git remote add failed in {}: {}",
            normalize_for_display(&runtime.wiki_dir),
            remote.failure_detail()
        );
    }

    Ok(AcquisitionReport {
        cloned: false,
        clone_failure: Some(clone_failure),
        fallback: Some(FallbackReport { created_dir }),
    })
}

/// Step 2: copy each configured page into the wiki working directory,
/// overwriting prior content. Whole-file read/write only. A missing source is
/// fatal and aborts the remaining entries.
pub fn stage_pages(runtime: &ResolvedRuntime) -> Result<StageReport> {
    let mut pages = Vec::with_capacity(WIKI_PAGES.len());
    for (source, destination) in WIKI_PAGES {
        let source_path = runtime.project_root.join(source);
        let content = fs::read_to_string(&source_path)
            .with_context(|| format!("failed to read source page {}", source_path.display()))?;
        let destination_path = runtime.wiki_dir.join(destination);
        fs::write(&destination_path, &content)
            .with_context(|| format!("failed to write {}", destination_path.display()))?;
        pages.push(StagedPage {
            source: (*source).to_string(),
            destination: (*destination).to_string(),
            bytes: content.len() as u64,
            content_hash: compute_hash(&content),
        });
    }
    Ok(StageReport { pages })
}

/// Step 3: stage-all, commit, push. The first failure is caught and recorded;
/// the run still completes successfully.
pub fn push_pages(runtime: &ResolvedRuntime, quiet: bool) -> PushReport {
    match try_push(runtime, quiet) {
        Ok(()) => PushReport {
            pushed: true,
            error: None,
        },
        Err(error) => PushReport {
            pushed: false,
            error: Some(format!("{error:#}")),
        },
    }
}

fn try_push(runtime: &ResolvedRuntime, quiet: bool) -> Result<()> {
    let add = git::add_all(&runtime.wiki_dir, quiet)?;
    if !add.success {
        bail!("git add failed: {}", add.failure_detail());
    }
    let commit = git::commit(&runtime.wiki_dir, &runtime.commit_message, quiet)?;
    if !commit.success {
        bail!("git commit failed: {}", commit.failure_detail());
    }
    let push = git::push_upstream(&runtime.wiki_dir, &runtime.branch, quiet)?;
    if !push.success {
        bail!("git push failed: {}", push.failure_detail());
    }
    Ok(())
}

/// The full three-step sequence, unconditionally in order.
pub fn run_publish(runtime: &ResolvedRuntime, quiet: bool) -> Result<PublishReport> {
    let acquisition = acquire_repository(runtime, quiet)?;
    let staged = stage_pages(runtime)?;
    let push = push_pages(runtime, quiet);

    Ok(PublishReport {
        remote_url: runtime.remote_url.clone(),
        branch: runtime.branch.clone(),
        wiki_dir: normalize_for_display(&runtime.wiki_dir),
        acquisition,
        staged,
        push,
    })
}

/// Dry-run: resolved values plus per-source existence, no side effects.
pub fn plan(runtime: &ResolvedRuntime) -> Result<PlanReport> {
    Ok(PlanReport {
        remote_url: runtime.remote_url.clone(),
        branch: runtime.branch.clone(),
        wiki_dir: normalize_for_display(&runtime.wiki_dir),
        commit_message: runtime.commit_message.clone(),
        sources: inspect_sources(runtime)?,
    })
}

fn compute_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut output = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
