use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::info;

use volley::args::VolleyArgs;
use volley::config::{apply_config, load_config};
use volley::domain::{RunConfig, RunSummary};
use volley::error::{AppError, AppResult, ValidationError};
use volley::http::{ClientSettings, Dispatcher, ReqwestFactory, UserAgentPool};
use volley::metrics::{
    DiagnosticsServer, LatencyRecorder, ObserverSet, OutcomeTally, TracingObserver,
};
use volley::shutdown::{CancelSignal, shutdown_channel};

use crate::prompt::{Prompter, require_present};
use crate::shutdown_handlers::setup_signal_shutdown_handler;
use crate::summary::print_summary;

pub(crate) fn run() -> AppResult<()> {
    let matches = VolleyArgs::command().get_matches();
    let args = VolleyArgs::from_arg_matches(&matches)?;

    crate::logger::init_logging(args.verbose, args.log_json);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, &matches))
}

async fn run_async(mut args: VolleyArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, matches, &config)?;
    }

    if args.no_prompt {
        require_present(&args)?;
    } else {
        let stdin = std::io::stdin();
        Prompter::new(stdin.lock(), std::io::stdout()).fill_missing(&mut args)?;
    }

    let run_config = build_run_config(&args)?;
    let user_agents = if args.user_agents.is_empty() {
        UserAgentPool::builtin()
    } else {
        UserAgentPool::from_values(&args.user_agents)?
    };
    let factory = ReqwestFactory::new(ClientSettings::from_args(&args))?;

    let tally = Arc::new(OutcomeTally::new());
    let latency = Arc::new(LatencyRecorder::new()?);
    let observers = ObserverSet::new()
        .with(Arc::new(TracingObserver))
        .with(tally.clone())
        .with(latency.clone());
    let dispatcher = Dispatcher::new(factory)
        .with_user_agents(user_agents)
        .with_observer(Arc::new(observers));

    let diagnostics = match args.diagnostics_addr.as_deref() {
        Some(addr) => Some(DiagnosticsServer::bind(addr, tally.clone(), latency.clone()).await?),
        None => None,
    };

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let diagnostics_handle = diagnostics
        .map(|server| tokio::spawn(server.serve(CancelSignal::subscribe(&shutdown_tx))));

    info!(
        target = %run_config.target(),
        workers = run_config.worker_count().get(),
        requests_per_worker = run_config.requests_per_worker().get(),
        rate = run_config.rate_per_second().get(),
        "Starting load run"
    );
    let result = dispatcher.run_with_shutdown(&run_config, &shutdown_tx).await;

    shutdown_tx.trigger();
    signal_handle.await?;
    if let Some(handle) = diagnostics_handle {
        handle.await?;
    }

    let summary = result?;
    print_summary(
        args.output_format,
        &summary,
        &tally.snapshot(),
        &latency.snapshot(),
    )?;
    check_failures(&args, &summary)
}

fn build_run_config(args: &VolleyArgs) -> AppResult<RunConfig> {
    let url = args
        .url
        .as_deref()
        .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
    let workers = args.workers.ok_or_else(|| {
        AppError::validation(ValidationError::MissingValue { field: "workers" })
    })?;
    let requests = args.requests.ok_or_else(|| {
        AppError::validation(ValidationError::MissingValue { field: "requests" })
    })?;
    RunConfig::from_parts(url, workers, requests, args.rate_per_second).map_err(AppError::from)
}

fn check_failures(args: &VolleyArgs, summary: &RunSummary) -> AppResult<()> {
    if args.fail_on_error && summary.total_failure > 0 {
        return Err(AppError::validation(ValidationError::RunHadFailures {
            failures: summary.total_failure,
        }));
    }
    Ok(())
}
