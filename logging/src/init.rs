// Loading the logger configuration from disk and starting a logger from it.

use crate::{
  config::{
    processed::{process_raw_config, LoggerConfig},
    raw::LoggerConfigRaw,
  },
  error::{Error, Result},
  error_handling::status,
  AsyncLogger,
};

use std::{
  env,
  fs::File,
  io,
  path::{Path, PathBuf},
};

const DEFAULT_CONFIG_BASE_NAME: &str = "batch_logging";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// Finds the configuration file based on common patterns and an optional environment suffix.
///
/// Looks in the working directory for `batch_logging.<env>.yaml`, then
/// `batch_logging.yaml`. The environment comes from `environment_suffix`,
/// `BATCH_LOGGING_ENV` or `APP_ENV`, in that order.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let base_name = DEFAULT_CONFIG_BASE_NAME;
  let extension = DEFAULT_CONFIG_EXTENSION;

  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("BATCH_LOGGING_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{}.{}.{}", base_name, env_str, extension));
    }
  }
  files_to_check.push(format!("{}.{}", base_name, extension));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check BATCH_LOGGING_ENV/APP_ENV.",
    files_to_check, dir
  )))
}

/// Reads and validates a logger configuration. Files ending in `.json` are
/// parsed as JSON, everything else as YAML.
pub fn load_config(config_path: &Path) -> Result<LoggerConfig> {
  let file = File::open(config_path)?;
  let reader = io::BufReader::new(file);

  let is_json = config_path
    .extension()
    .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
  let raw_config: LoggerConfigRaw = if is_json {
    serde_json::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))?
  } else {
    serde_yaml::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))?
  };

  process_raw_config(raw_config)
}

/// Loads the configuration at `config_path` and starts an [`AsyncLogger`] with it.
pub fn init_from_file(config_path: &Path) -> Result<AsyncLogger> {
  status(format_args!(
    "[batch_logging] Initializing from config file: {:?}",
    config_path
  ));
  let config = load_config(config_path)?;
  status(format_args!("[batch_logging] Processed config: {:?}", config));
  AsyncLogger::new(config)
}
