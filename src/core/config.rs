use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    /// Days of merchant access granted when an admin does not say
    pub default_access_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("SALON_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path =
            env::var("SALON_DB_PATH").unwrap_or_else(|_| format!("{}/db", storage_path));
        let default_access_days = env::var("SALON_DEFAULT_ACCESS_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            storage_path,
            db_path,
            default_access_days,
        }
    }
}
