use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub static_path: PathBuf,
    pub max_upload_bytes: usize,
    pub currency: String,
    pub locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7070,
            static_path: PathBuf::from("static"),
            max_upload_bytes: 32 * 1024 * 1024,
            currency: "USD".into(),
            locale: "en-US".into(),
        }
    }
}

impl Config {
    /// Read configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            host: env::var("MONEYFLOW_HOST").unwrap_or(defaults.host),
            port: env::var("MONEYFLOW_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            static_path: env::var("MONEYFLOW_STATIC_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_path),
            max_upload_bytes: env::var("MONEYFLOW_MAX_UPLOAD_MB")
                .ok()
                .and_then(|mb| mb.parse::<usize>().ok())
                .filter(|mb| *mb > 0)
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_upload_bytes),
            currency: env::var("MONEYFLOW_CURRENCY")
                .ok()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(defaults.currency),
            locale: env::var("MONEYFLOW_LOCALE")
                .ok()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.locale),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
