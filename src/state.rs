use crate::models::AppData;
use chrono_tz::Tz;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub timezone: Tz,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, timezone: Tz, data: AppData) -> Self {
        Self {
            data_path,
            timezone,
            data: Arc::new(Mutex::new(data)),
        }
    }
}
