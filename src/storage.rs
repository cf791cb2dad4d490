use crate::errors::AppError;
use crate::models::AppData;
use chrono_tz::Tz;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

/// Timezone all date keys are anchored to. Server-side and fixed, so client
/// clocks can never shift a completion across a day boundary.
pub const DEFAULT_TIMEZONE: &str = "America/Mexico_City";

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/habits.json"))
}

pub fn resolve_timezone() -> Result<Tz, String> {
    let name = env::var("APP_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
    name.parse()
        .map_err(|_| format!("unknown timezone '{name}' in APP_TIMEZONE"))
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timezone_is_a_real_zone() {
        assert!(DEFAULT_TIMEZONE.parse::<Tz>().is_ok());
    }
}
