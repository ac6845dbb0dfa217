pub mod app;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod nutrition;
pub mod refresh;
pub mod series;
pub mod state;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod template;

pub use app::router;
pub use config::Config;
pub use dashboard::activate_live_dashboard;
pub use refresh::{RefreshHandle, RefreshScheduler, ViewSnapshot, ViewState};
pub use series::{merge, MergedPoint, MetricPoint};
pub use state::AppState;
pub use storage::load_data;
pub use sync::{Subscription, SyncBus, Topic};
pub use template::{expand, finalize_sets, DraftSet, SessionDraft};
