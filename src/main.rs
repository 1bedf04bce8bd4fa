//! Railway Provisioner
//!
//! Usage:
//! - `RAILWAY_TOKEN=xxx GITHUB_OWNER=acme GITHUB_REPO_API=bal-api GITHUB_REPO_FRONTEND=bal-front railway-provisioner`
//! - Plan only: `railway-provisioner --dry-run` (or `DRY_RUN=1`)

use railway_provisioner::{RuntimeConfig, SetupConfig};

/// 解析命令行参数
fn parse_args(args: &[String]) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--dry-run" | "--plan" => {
                config.dry_run = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                tracing::warn!(argument = %other, "Ignoring unknown argument");
            }
        }
    }

    config
}

fn print_help() {
    println!("Railway Provisioner - API + Frontend services from GitHub");
    println!();
    println!("USAGE:");
    println!("    railway-provisioner [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --dry-run, --plan    Print the planned actions without calling Railway");
    println!("    -h, --help           Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    RAILWAY_TOKEN          (required) Railway API token");
    println!("    RAILWAY_PROJECT_ID     Existing project ID; a new project is created if unset");
    println!("    RAILWAY_WORKSPACE_ID   Workspace for a new project");
    println!("    RAILWAY_PROJECT_NAME   Name for a new project (default: nap-us)");
    println!("    RAILWAY_API_URL        GraphQL endpoint override");
    println!("    GITHUB_OWNER           (required) GitHub org or user");
    println!("    GITHUB_REPO_API        (required) API repo, \"name\" or \"owner/name\"");
    println!("    GITHUB_REPO_FRONTEND   (required) Frontend repo, \"name\" or \"owner/name\"");
    println!("    GITHUB_BRANCH          Branch to deploy (default: main)");
    println!("    API_ROOT_DIR           Monorepo subdirectory for the API");
    println!("    FRONTEND_ROOT_DIR      Monorepo subdirectory for the frontend");
    println!("    DRY_RUN                1/true: only print planned actions");
}

fn main() {
    railway_provisioner::setup_tracing();

    let args: Vec<String> = std::env::args().collect();
    let runtime_config = parse_args(&args);

    let config = match SetupConfig::from_env() {
        Ok(config) => config.with_runtime(&runtime_config),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = rt.block_on(railway_provisioner::provision(&config));

    match result {
        Ok(outcome) => {
            println!();
            println!("{}", outcome);
            std::process::exit(outcome.exit_code());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
