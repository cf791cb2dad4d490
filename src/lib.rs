pub mod app;
pub mod calendar;
pub mod datekey;
pub mod errors;
pub mod habits;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod streak;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path, resolve_timezone};
