use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use wikipub_core::config::WIKI_PAGES;

const SCRUBBED_ENV: &[&str] = &[
    "WIKIPUB_PROJECT_ROOT",
    "WIKIPUB_CONFIG",
    "WIKIPUB_OWNER",
    "WIKIPUB_REPO",
    "WIKIPUB_REMOTE_URL",
    "WIKIPUB_BRANCH",
    "WIKIPUB_COMMIT_MESSAGE",
    "WIKIPUB_GIT",
];

pub fn wikipub_cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wikipub").unwrap();
    cmd.current_dir(root);
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_CONFIG_SYSTEM", "/dev/null");
    cmd.env("GIT_AUTHOR_NAME", "wikipub-tests");
    cmd.env("GIT_AUTHOR_EMAIL", "wikipub-tests@example.invalid");
    cmd.env("GIT_COMMITTER_NAME", "wikipub-tests");
    cmd.env("GIT_COMMITTER_EMAIL", "wikipub-tests@example.invalid");
    cmd
}

/// Run git directly for fixture setup and assertions, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_SYSTEM", "/dev/null")
        .env("GIT_AUTHOR_NAME", "wikipub-tests")
        .env("GIT_AUTHOR_EMAIL", "wikipub-tests@example.invalid")
        .env("GIT_COMMITTER_NAME", "wikipub-tests")
        .env("GIT_COMMITTER_EMAIL", "wikipub-tests@example.invalid")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// The end-to-end fixture: `wiki-Home.md` with content, the other five
/// configured sources empty but present.
pub fn write_default_sources(root: &Path) {
    for (source, _) in WIKI_PAGES {
        let content = if *source == "wiki-Home.md" { "# Hello" } else { "" };
        std::fs::write(root.join(source), content).expect("write source page");
    }
}
