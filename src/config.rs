use std::path::PathBuf;
use std::time::Duration;

const DATA_DIR_ENV: &str = "PLAYFUL_PAUSE_DATA_DIR";
const DEBUG_ENV: &str = "PLAYFUL_PAUSE_DEBUG";
const SILENT_ENV: &str = "PLAYFUL_PAUSE_SILENT";

const STORE_FILE_NAME: &str = "local_storage.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub debug: bool,
    /// Skip opening an audio device entirely.
    pub silent: bool,
    pub growth_refresh_every: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let debug = env_flag(DEBUG_ENV);

        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".playful-pause")))
            .unwrap_or_else(|| std::env::temp_dir().join("playful-pause"));

        Self {
            data_dir,
            debug,
            silent: env_flag(SILENT_ENV),
            growth_refresh_every: if debug {
                Duration::from_secs(5)
            } else {
                Duration::from_secs(60)
            },
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
