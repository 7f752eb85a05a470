use std::path::PathBuf;
use std::sync::OnceLock;

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Sets the data directory. Only the first call has an effect; call at startup
/// before anything is logged.
pub fn init_data_dir(dir: Option<PathBuf>) {
    let _ = DATA_DIR.set(dir.unwrap_or_else(default_data_dir));
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("miaocarb")
}

/// Returns the data directory: `<local data>/miaocarb/` unless overridden.
pub fn get_data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(default_data_dir)
}

/// Returns the logs directory: `<data_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_data_dir().join("logs")
}

/// Returns the key-value store directory: `<data_dir>/store/`
pub fn get_store_dir() -> PathBuf {
    get_data_dir().join("store")
}

/// Returns the photo blob directory: `<data_dir>/images/`
pub fn get_images_dir() -> PathBuf {
    get_data_dir().join("images")
}

/// Returns the downloaded OCR language data directory: `<data_dir>/tessdata/`
pub fn get_tessdata_dir() -> PathBuf {
    get_data_dir().join("tessdata")
}

/// Returns the config file path: `<data_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.json")
}

/// Ensures all data directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_store_dir())?;
    std::fs::create_dir_all(get_images_dir())?;
    Ok(())
}
