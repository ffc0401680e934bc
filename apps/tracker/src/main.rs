mod config;
mod listener;
mod main_lib;
mod scheduler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use config::Config;
use main_lib::{build_app, init_tracing};
use shareprofit_core::refresh::TriggerOutcome;

/// How long the UI loop waits for work before checking for shutdown.
const UI_POLL: Duration = Duration::from_millis(250);

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing();

    // Fetches run on the runtime; this thread is the UI thread.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("spt-worker")
        .build()?;
    let app = build_app(&config, runtime.handle().clone())?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let today = || Local::now().date_naive();
    let portfolio = app.orchestrator.portfolio();
    listener::render(&portfolio.valuations(today()), &portfolio.summary(today()));

    match app.orchestrator.trigger_refresh() {
        TriggerOutcome::NothingToRefresh => {
            tracing::info!("No positions yet. Add some, or set SPT_DEMO_MODE=true");
            return Ok(());
        }
        TriggerOutcome::Failed if config.run_once => {
            anyhow::bail!("Could not read the portfolio");
        }
        _ => {}
    }

    if !config.run_once {
        if let Some(period) = config.refresh.auto_refresh_interval() {
            scheduler::start_auto_refresh(
                runtime.handle(),
                period,
                app.executor.clone(),
                app.orchestrator.clone(),
            );
        }
    }

    while !shutdown.load(Ordering::SeqCst) {
        let refreshed = app.ui.run_until(UI_POLL, || app.listener.take_dirty());

        if refreshed {
            let portfolio = app.orchestrator.portfolio();
            listener::render(&portfolio.valuations(today()), &portfolio.summary(today()));
            if config.run_once {
                break;
            }
        }
    }

    // In-flight fetches are abandoned.
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}
