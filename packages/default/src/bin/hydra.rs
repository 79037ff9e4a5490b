use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hydra_client::{
    Build, BuildFilter, BuildStatus, CallContext, ClientConfig, HydraClient, SearchOptions,
    SearchSummary, build_url, calculate_statistics, debug_print_config, evaluation_url,
    filter_builds, flatten_search_results, parse_build_id,
};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hydra", author, version, about = "Query and drive a Hydra build farm", long_about = None)]
struct Args {
    /// Hydra base URL (default: from config, then https://hydra.nixos.org)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all projects
    Projects,
    /// Show one project and its jobsets
    Project { project: String },
    /// List the jobsets of a project
    Jobsets { project: String },
    /// Show a jobset definition
    Jobset { project: String, jobset: String },
    /// List evaluations of a jobset
    Evals { project: String, jobset: String },
    /// Show a build
    Build { id: String },
    /// Show a build with its constituents and evaluation
    BuildInfo { id: String },
    /// Poll a build until it finishes
    Wait {
        id: String,
        /// Poll interval, e.g. "10s"
        #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
        interval: Duration,
    },
    /// Find the most recent build of a job
    Latest {
        project: String,
        jobset: String,
        job: String,
    },
    /// Trigger evaluation of `project:jobset` references
    Trigger {
        #[arg(required = true)]
        jobsets: Vec<String>,
        /// Wait for the resulting evaluation (single jobset only)
        #[arg(long, value_parser = humantime::parse_duration)]
        wait: Option<Duration>,
    },
    /// Search projects, jobsets, builds and derivations
    Search {
        query: String,
        #[arg(long)]
        no_projects: bool,
        #[arg(long)]
        no_jobsets: bool,
        #[arg(long)]
        no_builds: bool,
        #[arg(long)]
        no_derivations: bool,
        /// Print one line per hit instead of a summary
        #[arg(long)]
        flat: bool,
    },
    /// Outcome statistics for the builds of an evaluation
    Stats {
        eval: i64,
        #[arg(long)]
        job: Option<String>,
        #[arg(long)]
        system: Option<String>,
        /// Only count builds with this status code
        #[arg(long)]
        status: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()) // uses RUST_LOG
        .init();

    let args = Args::parse();
    let mut cfg = ClientConfig::load()?;
    if let Some(url) = args.url {
        cfg = cfg.with_base_url(url);
    }
    debug_print_config(&cfg);

    let client = HydraClient::new(cfg.clone()).context("creating Hydra client")?;

    let ctx = CallContext::new();
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    if let Some((username, password)) = cfg.credentials() {
        client.login(&ctx, username, password).await?;
    }

    run(&client, &ctx, args.command).await
}

async fn run(client: &HydraClient, ctx: &CallContext, command: Command) -> Result<()> {
    let base = client.base_url();
    match command {
        Command::Projects => {
            for project in client.list_projects(ctx).await? {
                let state = if project.enabled { "" } else { " (disabled)" };
                println!("{:<30} {}{}", project.name, project.display_name, state);
            }
        }
        Command::Project { project } => {
            let (project, jobsets) = client.project_with_jobsets(ctx, &project).await?;
            println!("{} ({})", project.display_name, project.name);
            println!("  owner: {}", project.owner);
            if !project.description.is_empty() {
                println!("  {}", project.description);
            }
            for jobset in jobsets {
                println!(
                    "  {:<24} total {:>6}  failed {:>6}  queued {:>6}",
                    jobset.name, jobset.nr_total, jobset.nr_failed, jobset.nr_scheduled
                );
            }
        }
        Command::Jobsets { project } => {
            for jobset in client.list_jobsets(ctx, &project).await? {
                let error = if jobset.has_error_msg { "  [error]" } else { "" };
                println!("{:<30} {:>6} builds{}", jobset.name, jobset.nr_total, error);
            }
        }
        Command::Jobset { project, jobset } => {
            let jobset = client.get_jobset(ctx, &project, &jobset).await?;
            println!("{}:{}", jobset.project, jobset.name);
            match jobset.state() {
                Some(state) => println!("  state: {state:?}"),
                None => println!("  state: unknown ({})", jobset.enabled),
            }
            if let Some(flake) = &jobset.flake {
                println!("  flake: {flake}");
            }
            if let Some(error) = &jobset.error_msg {
                println!("  error: {error}");
            }
            for input in jobset.inputs.values() {
                println!("  input {} ({}): {}", input.name, input.kind, input.value);
            }
        }
        Command::Evals { project, jobset } => {
            let evals = client.get_evaluations(ctx, &project, &jobset).await?;
            for eval in evals.iter() {
                println!(
                    "{:>10}  {:>5} builds  {}",
                    eval.id,
                    eval.builds.len(),
                    evaluation_url(&base, eval.id)
                );
            }
        }
        Command::Build { id } => {
            let build = client.get_build(ctx, parse_build_id(&id)?).await?;
            print_build(&base, &build);
        }
        Command::BuildInfo { id } => {
            let info = client.get_build_info(ctx, parse_build_id(&id)?).await?;
            print_build(&base, &info.build);
            if let Some(constituents) = &info.constituents {
                println!("  constituents: {}", constituents.len());
                for build in constituents {
                    println!("    {:<40} {}", build.job, build.status_label());
                }
            }
            if let Some(eval) = &info.evaluation {
                println!("  evaluation: {}", evaluation_url(&base, eval.id));
            }
        }
        Command::Wait { id, interval } => {
            let build = client
                .wait_for_build(ctx, parse_build_id(&id)?, interval)
                .await?;
            print_build(&base, &build);
        }
        Command::Latest {
            project,
            jobset,
            job,
        } => {
            let build = client
                .latest_build_for_job(ctx, &project, &jobset, &job)
                .await?;
            print_build(&base, &build);
        }
        Command::Trigger { jobsets, wait } => {
            let Some(timeout) = wait else {
                let response = client.trigger_jobsets(ctx, jobsets.as_slice()).await?;
                for jobset in &response.jobsets_triggered {
                    println!("triggered {jobset}");
                }
                return Ok(());
            };

            // waiting triggers the jobset itself
            let [jobset] = jobsets.as_slice() else {
                anyhow::bail!("--wait needs exactly one jobset");
            };
            let (project, name) = jobset.split_once(':').unwrap_or((jobset.as_str(), ""));
            let eval = client
                .wait_for_jobset_evaluation(ctx, project, name, timeout)
                .await?;
            println!("triggered {jobset}");
            println!(
                "evaluation {} with {} builds: {}",
                eval.id,
                eval.builds.len(),
                evaluation_url(&base, eval.id)
            );
        }
        Command::Search {
            query,
            no_projects,
            no_jobsets,
            no_builds,
            no_derivations,
            flat,
        } => {
            let options = SearchOptions::new(query.clone())
                .with_projects(!no_projects)
                .with_jobsets(!no_jobsets)
                .with_builds(!no_builds)
                .with_derivations(!no_derivations);
            let result = client.search_with_options(ctx, &options).await?;

            println!("{}", SearchSummary::new(query.trim(), &result));
            if flat {
                for item in flatten_search_results(&base, &result) {
                    println!("{:<10} {:<40} {}", item.kind, item.name, item.url);
                }
            }
        }
        Command::Stats {
            eval,
            job,
            system,
            status,
        } => {
            let pages = client.get_evaluation_builds(ctx, eval).await?;
            let builds: Vec<Build> = pages.into_iter().flat_map(|p| p.into_values()).collect();

            let filter = BuildFilter {
                job,
                system,
                status: status.map(BuildStatus::from_code),
                ..Default::default()
            };
            let selected = filter_builds(&builds, &filter);
            debug!("{} of {} builds selected", selected.len(), builds.len());

            let stats = calculate_statistics(&selected);
            println!("total:       {}", stats.total);
            println!("succeeded:   {}", stats.succeeded);
            println!("failed:      {}", stats.failed);
            println!("aborted:     {}", stats.aborted);
            println!("timed out:   {}", stats.timed_out);
            println!("in progress: {}", stats.in_progress);
            println!("other:       {}", stats.other);
            println!("success:     {:.1}%", stats.success_rate());
        }
    }
    Ok(())
}

fn print_build(base: &str, build: &Build) {
    println!("{} #{} ({})", build.job, build.id, build.status_label());
    println!("  {}", build_url(base, build.id));
    println!("  {}:{} on {}", build.project, build.jobset, build.system);
    if !build.nix_name.is_empty() {
        println!("  {}", build.nix_name);
    }
    if build.finished {
        println!(
            "  finished {} after {}s",
            build.stopped_at().to_rfc3339(),
            build.duration().num_seconds()
        );
    }
}
