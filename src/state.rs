use crate::models::{AppData, DashboardView};
use crate::refresh::ViewSnapshot;
use crate::sync::SyncBus;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{watch, Mutex};

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub bus: SyncBus,
    pub window_days: i64,
    pub live: Option<watch::Receiver<ViewSnapshot<DashboardView>>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData, bus: SyncBus, window_days: i64) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            bus,
            window_days,
            live: None,
        }
    }

    pub fn with_live_dashboard(mut self, live: watch::Receiver<ViewSnapshot<DashboardView>>) -> Self {
        self.live = Some(live);
        self
    }
}
