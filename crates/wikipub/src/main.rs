use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use wikipub_core::config::wiki_web_url;
use wikipub_core::publish::{FIRST_PAGE_HINT, PlanReport, PublishReport, plan, run_publish};
use wikipub_core::runtime::{
    Overrides, ResolutionContext, ResolvedRuntime, inspect_sources, normalize_for_display,
    resolve_runtime,
};

#[derive(Debug, Parser)]
#[command(
    name = "wikipub",
    version,
    about = "Publish project documentation pages to a hosted wiki repository"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "NAME")]
    owner: Option<String>,
    #[arg(long, global = true, value_name = "NAME")]
    repo: Option<String>,
    #[arg(long, global = true, value_name = "URL")]
    remote_url: Option<String>,
    #[arg(long, global = true, value_name = "NAME")]
    branch: Option<String>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            project_root: self.project_root.clone(),
            config: self.config.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            remote_url: self.remote_url.clone(),
            branch: self.branch.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Clone or initialize the wiki repository, copy pages, commit, and push")]
    Publish(PublishArgs),
    #[command(about = "Show resolved configuration and source page availability")]
    Status(StatusArgs),
}

#[derive(Debug, Args, Default)]
struct PublishArgs {
    #[arg(long, help = "Resolve and report without touching the filesystem or remote")]
    dry_run: bool,
    #[arg(long, help = "Emit the report as JSON")]
    json: bool,
}

#[derive(Debug, Args, Default)]
struct StatusArgs {
    #[arg(long, help = "Emit the report as JSON")]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = resolve(&cli)?;
    if cli.diagnostics {
        println!("[diagnostics]\n{}\n", runtime.diagnostics());
    }

    // Invoked bare, the tool publishes; that is its one job.
    match cli.command {
        Some(Commands::Publish(args)) => cmd_publish(&runtime, &args),
        Some(Commands::Status(args)) => cmd_status(&runtime, &args),
        None => cmd_publish(&runtime, &PublishArgs::default()),
    }
}

fn cmd_publish(runtime: &ResolvedRuntime, args: &PublishArgs) -> Result<()> {
    if args.dry_run {
        let report = plan(runtime)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_plan(&report);
        }
        return Ok(());
    }

    if !args.json {
        println!(
            "Setting up wiki for repository: {}/{}",
            runtime.owner, runtime.repo
        );
        println!("Cloning wiki repository: {}", runtime.remote_url);
    }

    let report = run_publish(runtime, args.json)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_publish(&report);
    println!();
    println!("Wiki setup complete!");
    println!(
        "Visit {} to view your wiki.",
        wiki_web_url(&runtime.owner, &runtime.repo)
    );
    Ok(())
}

fn cmd_status(runtime: &ResolvedRuntime, args: &StatusArgs) -> Result<()> {
    let sources = inspect_sources(runtime)?;

    if args.json {
        #[derive(serde::Serialize)]
        struct StatusReport<'a> {
            runtime: &'a ResolvedRuntime,
            wiki_dir_exists: bool,
            sources: &'a [wikipub_core::runtime::SourceStatus],
        }
        let report = StatusReport {
            runtime,
            wiki_dir_exists: runtime.wiki_dir.exists(),
            sources: &sources,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("wiki publisher status");
    println!(
        "owner: {} ({})",
        runtime.owner,
        runtime.owner_source.as_str()
    );
    println!("repo: {} ({})", runtime.repo, runtime.repo_source.as_str());
    println!(
        "remote_url: {} ({})",
        runtime.remote_url,
        runtime.remote_source.as_str()
    );
    println!(
        "branch: {} ({})",
        runtime.branch,
        runtime.branch_source.as_str()
    );
    println!("commit_message: {}", runtime.commit_message);
    println!("wiki_dir: {}", normalize_for_display(&runtime.wiki_dir));
    println!(
        "wiki_dir_exists: {}",
        format_flag(runtime.wiki_dir.exists())
    );
    for status in &sources {
        match status.bytes {
            Some(bytes) => println!(
                "source.{}: present ({bytes} bytes) -> {}",
                status.source, status.destination
            ),
            None => println!(
                "source.{}: missing -> {}",
                status.source, status.destination
            ),
        }
    }
    Ok(())
}

fn print_plan(report: &PlanReport) {
    println!("publish plan (dry run)");
    println!("remote_url: {}", report.remote_url);
    println!("branch: {}", report.branch);
    println!("wiki_dir: {}", report.wiki_dir);
    println!("commit_message: {}", report.commit_message);
    for status in &report.sources {
        println!(
            "page: {} -> {} ({})",
            status.source,
            status.destination,
            if status.exists { "present" } else { "missing" }
        );
    }
}

fn print_publish(report: &PublishReport) {
    if report.acquisition.cloned {
        println!("Wiki repository cloned successfully.");
    } else {
        println!("Wiki repository could not be cloned. Falling back to local initialization...");
        if let Some(kind) = report.acquisition.clone_failure {
            println!("clone_failure: {}", kind.as_str());
        }
        if let Some(fallback) = &report.acquisition.fallback {
            println!(
                "fallback.created_dir: {}",
                format_flag(fallback.created_dir)
            );
        }
    }

    for page in &report.staged.pages {
        println!(
            "staged: {} -> {} ({} bytes, {})",
            page.source, page.destination, page.bytes, page.content_hash
        );
    }

    if report.push.pushed {
        println!("Wiki pages pushed successfully.");
    } else {
        if let Some(error) = &report.push.error {
            eprintln!("Error committing or pushing changes: {error}");
        }
        println!("{FIRST_PAGE_HINT}");
    }
}

fn resolve(cli: &Cli) -> Result<ResolvedRuntime> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = cli.overrides();

    let initial = resolve_runtime(&context, &overrides)?;
    let project_env = initial.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }

    resolve_runtime(&context, &overrides)
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
