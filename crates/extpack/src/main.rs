use clap::Parser;
use extpack::{
    PackError,
    config::{PackConfig, load_config, resolve_project_root},
    format::FormatMode,
    pipeline::{format_project, run_check, validate_archive},
    version::check_version,
};
use std::path::{Path, PathBuf};

mod cli;
use cli::{Cli, Commands};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn fail(e: &PackError) -> ! {
    eprintln!("extpack: {e}");
    tracing::debug!(code = e.code(), "command failed");
    std::process::exit(1);
}

fn with_schema_override(mut cfg: PackConfig, schema: Option<PathBuf>) -> PackConfig {
    if let Some(path) = schema {
        cfg.archive.schema_path = path;
    }
    cfg
}

fn print_rewritten(prefix: &'static str) -> impl FnMut(&str) {
    move |rel: &str| println!("{prefix} {rel}")
}

async fn run(cli: Cli, project_root: &Path) -> Result<i32, PackError> {
    let cfg = load_config(project_root)?;
    match cli.command {
        Commands::Format { check } => {
            let mode = if check {
                FormatMode::Check
            } else {
                FormatMode::Write
            };
            let prefix = if check { "would rewrite" } else { "rewrote" };
            let summary = format_project(project_root, &cfg, mode, &mut print_rewritten(prefix))?;
            if check && !summary.changed.is_empty() {
                eprintln!(
                    "extpack: {} of {} JSON files are not canonical",
                    summary.changed.len(),
                    summary.checked
                );
                return Ok(1);
            }
            Ok(0)
        }
        Commands::Validate(args) => {
            let source = args.archive.source();
            let cfg = with_schema_override(cfg, args.schema);
            let check = validate_archive(project_root, &cfg, &source)?;
            println!("{}", check.confirmation());
            Ok(0)
        }
        Commands::Version { offline } => {
            let report = check_version(project_root, &cfg.version, offline).await?;
            println!("{report}");
            Ok(0)
        }
        Commands::Check {
            archive,
            schema,
            offline,
        } => {
            let source = archive.source();
            let cfg = with_schema_override(cfg, schema);
            let summary = run_check(
                project_root,
                &cfg,
                &source,
                offline,
                &mut print_rewritten("rewrote"),
            )
            .await?;
            if let Some(version) = &summary.version {
                println!("{version}");
            }
            println!("{}", summary.archive.confirmation());
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let project_root = resolve_project_root(cli.project_root.clone());
    match run(cli, &project_root).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => fail(&e),
    }
}
