//! Console stand-in for the desktop window.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use shareprofit_core::portfolio::{PortfolioSummary, PositionValuation};
use shareprofit_core::quotes::RefreshError;
use shareprofit_core::refresh::{RefreshListener, RefreshReport, RefreshState};

#[derive(Default)]
pub struct ConsoleListener {
    /// Set by every finished cycle, cleared by whoever renders the portfolio.
    dirty: AtomicBool,
}

impl ConsoleListener {
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    fn finish(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }
}

impl RefreshListener for ConsoleListener {
    fn on_refresh_started(&self) {
        info!("Refreshing prices...");
    }

    fn on_refresh_progress(&self, completed: usize, total: usize) {
        debug!("Progress {}/{}", completed, total);
    }

    fn on_refresh_completed(&self, report: &RefreshReport) {
        info!(
            "{} at {}",
            report.summary.status_line(),
            Local::now().format("%H:%M:%S")
        );
        if report.status == RefreshState::PartiallyFailed {
            for symbol in report.failed_symbols() {
                if let Some(failure) = report.results.get(symbol).and_then(|r| r.failure()) {
                    warn!("{}: {} ({})", symbol, failure.kind, failure.detail);
                }
            }
        }
        self.finish();
    }

    fn on_refresh_failed(&self, error: &RefreshError) {
        error!("Price refresh failed: {}", error);
        self.finish();
    }
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Log the position table and totals.
pub fn render(valuations: &[PositionValuation], summary: &PortfolioSummary) {
    for v in valuations {
        let price = v.current_price.map(money).unwrap_or_else(|| "-".to_string());
        info!(
            "{:<12} qty {:>8}  buy {:>10}  now {:>10}  P/L {:>12} ({:>7}%)  {} days, {}% p.a.",
            v.symbol.as_str(),
            v.quantity,
            money(v.purchase_price),
            price,
            money(v.profit_loss),
            v.profit_loss_percent,
            v.days_held,
            v.annualized_return_percent
        );
    }
    info!(
        "Invested {}  Value {}  P/L {} ({}%)  {}/{} priced",
        money(summary.total_investment),
        money(summary.current_value),
        money(summary.profit_loss),
        summary.profit_loss_percent,
        summary.priced_count,
        summary.position_count
    );
    if let (Some(best), Some(worst)) = (&summary.best_performer, &summary.worst_performer) {
        info!(
            "Best {} ({}%)  Worst {} ({}%)",
            best.symbol, best.profit_loss_percent, worst.symbol, worst.profit_loss_percent
        );
    }
}
