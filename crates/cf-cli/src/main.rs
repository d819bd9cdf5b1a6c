//! `cf3` binary entrypoint.

use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cf_cli::cli::{Cli, Commands};
use cf_cli::commands::{
    AppCommand, AppsCommand, EnvCommand, IsolationSegmentCommand, NetworkPolicyCommand, PackageCommand,
    ProcessCommand, PushCommand, ServiceCommand, TaskCommand,
};
use cf_cli::config::EnvOverrides;
use cf_cli::{CliError, Config, Ui, setup};

const DEFAULT_BINARY_NAME: &str = "cf3";

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let binary = binary_name();
    let mut ui = Ui::stdio();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(cli, &binary, &mut ui)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let _ = ui.display_error(&e.message(&binary));
            ExitCode::FAILURE
        }
    };
    let _ = ui.flush();
    code
}

/// `RUST_LOG` wins; otherwise `CF_TRACE` turns on request tracing.
fn init_tracing() {
    let fallback = if EnvOverrides::from_env().trace {
        "cf_actor=trace,cf_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// The name the CLI was invoked as, for hints like "Use 'cf3 login'".
fn binary_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_BINARY_NAME.to_string())
}

async fn run(cli: Cli, binary: &str, ui: &mut Ui) -> Result<(), CliError> {
    let config = Config::load(binary)?;
    let actor = setup::connect(&config).await?;
    let config = &config;
    let actor = &actor;

    match cli.command {
        Commands::V3Apps => AppsCommand::new(config, actor).list(ui).await,
        Commands::V3App(args) => AppsCommand::new(config, actor).show(ui, &args).await,
        Commands::V3CreateApp(args) => AppCommand::new(config, actor).create(ui, &args).await,
        Commands::V3Delete(args) => AppCommand::new(config, actor).delete(ui, &args).await,
        Commands::V3Start(args) => AppCommand::new(config, actor).start(ui, &args).await,
        Commands::V3Stop(args) => AppCommand::new(config, actor).stop(ui, &args).await,
        Commands::V3Restart(args) => AppCommand::new(config, actor).restart(ui, &args).await,
        Commands::V3RestartAppInstance(args) => {
            ProcessCommand::new(config, actor).restart_instance(ui, &args).await
        }
        Commands::V3Scale(args) => ProcessCommand::new(config, actor).scale(ui, &args).await,
        Commands::V3Stage(args) => PackageCommand::new(config, actor).stage(ui, &args).await,
        Commands::V3SetDroplet(args) => PackageCommand::new(config, actor).set_droplet(ui, &args).await,
        Commands::V3Droplets(args) => PackageCommand::new(config, actor).droplets(ui, &args).await,
        Commands::V3Packages(args) => PackageCommand::new(config, actor).packages(ui, &args).await,
        Commands::V3CreatePackage(args) => PackageCommand::new(config, actor).create(ui, &args).await,
        Commands::V3SetEnv(args) => EnvCommand::new(config, actor).set(ui, &args).await,
        Commands::V3UnsetEnv(args) => EnvCommand::new(config, actor).unset(ui, &args).await,
        Commands::V3Push(args) => PushCommand::new(config, actor).push(ui, &args).await,
        Commands::RunTask(args) => TaskCommand::new(config, actor).run(ui, &args).await,
        Commands::Tasks(args) => TaskCommand::new(config, actor).list(ui, &args).await,
        Commands::TerminateTask(args) => TaskCommand::new(config, actor).terminate(ui, &args).await,
        Commands::IsolationSegments => IsolationSegmentCommand::new(config, actor).list(ui).await,
        Commands::CreateIsolationSegment(args) => {
            IsolationSegmentCommand::new(config, actor).create(ui, &args).await
        }
        Commands::DeleteIsolationSegment(args) => {
            IsolationSegmentCommand::new(config, actor).delete(ui, &args).await
        }
        Commands::EnableOrgIsolation(args) => {
            IsolationSegmentCommand::new(config, actor).enable_org(ui, &args).await
        }
        Commands::DisableOrgIsolation(args) => {
            IsolationSegmentCommand::new(config, actor).disable_org(ui, &args).await
        }
        Commands::SetOrgDefaultIsolationSegment(args) => {
            IsolationSegmentCommand::new(config, actor).set_org_default(ui, &args).await
        }
        Commands::ResetOrgDefaultIsolationSegment(args) => {
            IsolationSegmentCommand::new(config, actor).reset_org_default(ui, &args).await
        }
        Commands::SetSpaceIsolationSegment(args) => {
            IsolationSegmentCommand::new(config, actor).set_space(ui, &args).await
        }
        Commands::ResetSpaceIsolationSegment(args) => {
            IsolationSegmentCommand::new(config, actor).reset_space(ui, &args).await
        }
        Commands::ShareService(args) => ServiceCommand::new(config, actor).share(ui, &args).await,
        Commands::UnshareService(args) => ServiceCommand::new(config, actor).unshare(ui, &args).await,
        Commands::AddNetworkPolicy(args) => NetworkPolicyCommand::new(config, actor).add(ui, &args).await,
        Commands::RemoveNetworkPolicy(args) => NetworkPolicyCommand::new(config, actor).remove(ui, &args).await,
        Commands::NetworkPolicies(args) => NetworkPolicyCommand::new(config, actor).list(ui, &args).await,
    }
}
