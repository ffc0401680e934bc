use crate::quotes::RefreshError;

use super::state::RefreshReport;

/// UI-side notifications for a refresh cycle. All calls arrive on the UI thread.
pub trait RefreshListener: Send + Sync {
    fn on_refresh_started(&self) {}

    fn on_refresh_progress(&self, _completed: usize, _total: usize) {}

    fn on_refresh_completed(&self, report: &RefreshReport);

    /// The cycle produced no results. The user should be told.
    fn on_refresh_failed(&self, error: &RefreshError);
}

pub struct NoOpListener;

impl RefreshListener for NoOpListener {
    fn on_refresh_completed(&self, _report: &RefreshReport) {}

    fn on_refresh_failed(&self, _error: &RefreshError) {}
}
