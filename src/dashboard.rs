use crate::models::{AppData, DashboardCharts, DashboardSummary, DashboardView, RangeQuery};
use crate::refresh::{RefreshHandle, RefreshScheduler};
use crate::series::merge;
use crate::stats::{build_summary, SummaryError};
use crate::sync::{SyncBus, Topic};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Chart-ready series for a summary.
pub fn build_charts(summary: &DashboardSummary) -> DashboardCharts {
    let body = merge(
        [
            ("weight", &summary.weight_series[..]),
            ("bodyfat", &summary.bodyfat_series[..]),
        ],
        &[],
    );

    let tdee_line: Vec<(&str, f64)> = summary
        .tdee
        .filter(|tdee| *tdee > 0.0)
        .map(|tdee| ("tdee", tdee))
        .into_iter()
        .collect();
    let nutrition = merge(
        [
            ("calories", &summary.intake_series[..]),
            ("protein", &summary.protein_series[..]),
        ],
        &tdee_line,
    );

    DashboardCharts { body, nutrition }
}

pub fn has_series_data(summary: &DashboardSummary) -> bool {
    !summary.weight_series.is_empty() || !summary.intake_series.is_empty()
}

pub fn build_view(summary: DashboardSummary) -> DashboardView {
    DashboardView {
        charts: build_charts(&summary),
        has_series_data: has_series_data(&summary),
        summary,
    }
}

/// Starts the server-side dashboard view, refreshed whenever logs or the
/// profile change and at least every `interval`.
pub fn activate_live_dashboard(
    bus: &SyncBus,
    data: Arc<Mutex<AppData>>,
    interval: Duration,
    window_days: i64,
) -> RefreshHandle<DashboardView> {
    RefreshScheduler::new(bus.clone(), Topic::ALL)
        .with_interval(interval)
        .activate(move || {
            let data = Arc::clone(&data);
            async move {
                let data = data.lock().await;
                let summary = build_summary(&data, &RangeQuery::default(), window_days)?;
                Ok::<_, SummaryError>(build_view(summary))
            }
        })
}
