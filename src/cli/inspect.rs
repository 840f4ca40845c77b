//! Inspect command - show how stackbot sees one PR

use crate::cli::context::CommandContext;
use anstream::println;
use owo_colors::OwoColorize;
use stackbot::error::Result;
use stackbot::platform::PlatformProvider;
use stackbot::stack::{DependencyStatus, Directive, ShadowBranches};
use stackbot::types::RepoId;
use std::path::Path;

/// Print the directive, shadow branches and effective status of a PR
pub async fn run_inspect(
    config_path: Option<&Path>,
    token: Option<String>,
    repo: &RepoId,
    pr_number: u64,
) -> Result<()> {
    let ctx = CommandContext::new(config_path, token).await?;
    let platform = ctx.provider().for_repo(repo)?;
    let settings = &ctx.config.stack;
    let shadow = ShadowBranches::new(platform.as_ref(), settings);

    let pr = platform.get_pull_request(pr_number).await?;
    let directive = Directive::for_pull_request(&pr.body, pr.number);
    let status = DependencyStatus::evaluate(directive, &pr.base_ref, &settings.branch_prefix);

    println!("{} {repo}#{}", "PR".bold(), pr.number);
    println!("  state:  {}", pr.state);
    let base_note = match shadow.dependency_of(&pr.base_ref) {
        Some(mirrored) if directive.depends_on == Some(mirrored) => {
            format!("shadow of #{mirrored}").green().to_string()
        }
        Some(mirrored) => format!("shadow of #{mirrored}, not the declared dependency")
            .yellow()
            .to_string(),
        None => "regular branch".dimmed().to_string(),
    };
    println!("  base:   {} ({base_note})", pr.base_ref);

    match directive.depends_on {
        Some(dep) => {
            let branch = shadow.branch_name_for(dep);
            let exists = if shadow.exists(dep).await {
                "exists".green().to_string()
            } else {
                "missing".yellow().to_string()
            };
            println!("  depends on: #{dep}");
            println!("  dependency shadow branch: {branch} ({exists})");
        }
        None => println!("  depends on: {}", "nothing".dimmed()),
    }

    let own = shadow.branch_name_for(pr.number);
    if shadow.exists(pr.number).await {
        println!("  own shadow branch: {own} (exists)");
    }

    match status {
        DependencyStatus::Waiting(dep) => {
            println!("  status: {}", format!("waiting for #{dep}").red());
        }
        DependencyStatus::NoDependency => println!("  status: {}", "no dependency".green()),
    }
    Ok(())
}
