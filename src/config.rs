use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::browser::webdriver::Browser;
use crate::browser::{Wait, WebDriverOptions};
use crate::classify::{CaseMatching, Denylist};
use crate::cli::{ReportArgs, ScanArgs};
use crate::controller::{PageMode, Target, DEFAULT_STALE_TIMEOUT};
use crate::store::{self, StoreError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid duration for {field}: {value:?} ({source})")]
    Duration {
        field: &'static str,
        value: String,
        source: humantime::DurationError,
    },
}

/// On-disk config (~/.config/idsweep/config.toml). Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub input_selector: Option<String>,
    pub result_selector: Option<String>,
    /// e.g. "20s"
    pub timeout: Option<String>,
    /// e.g. "250ms"
    pub poll_interval: Option<String>,
    /// e.g. "2s"; reuse mode only
    pub stale_timeout: Option<String>,
    pub page_mode: Option<PageMode>,
    pub webdriver: Option<String>,
    pub browser: Option<Browser>,
    pub headless: Option<bool>,
    pub database: Option<PathBuf>,
    pub case_matching: Option<CaseMatching>,
    pub extra_placeholders: Vec<String>,
}

pub struct Config {
    pub target: Target,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    pub stale_timeout: Duration,
    pub page_mode: PageMode,
    pub webdriver: WebDriverOptions,
    /// None means the platform data dir
    pub database: Option<PathBuf>,
    pub case_matching: CaseMatching,
    pub extra_placeholders: Vec<String>,
    pub json_output: bool,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: Target::default(),
            wait_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
            stale_timeout: DEFAULT_STALE_TIMEOUT,
            page_mode: PageMode::default(),
            webdriver: WebDriverOptions::default(),
            database: None,
            case_matching: CaseMatching::default(),
            extra_placeholders: Vec::new(),
            json_output: false,
            verbose: false,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "idsweep").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|source| ConfigError::Duration {
        field,
        value: value.to_string(),
        source,
    })
}

impl Config {
    /// Defaults overlaid with the config file.
    ///
    /// An explicitly named file must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.is_file()),
        };

        if let Some(path) = path {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            let file: FileConfig =
                toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
            config.apply_file(file)?;
        }

        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(url) = file.url {
            self.target.url = url;
        }
        if let Some(selector) = file.input_selector {
            self.target.input_selector = selector;
        }
        if let Some(selector) = file.result_selector {
            self.target.result_selector = selector;
        }
        if let Some(value) = file.timeout {
            self.wait_timeout = parse_duration("timeout", &value)?;
        }
        if let Some(value) = file.poll_interval {
            self.poll_interval = parse_duration("poll_interval", &value)?;
        }
        if let Some(value) = file.stale_timeout {
            self.stale_timeout = parse_duration("stale_timeout", &value)?;
        }
        if let Some(mode) = file.page_mode {
            self.page_mode = mode;
        }
        if let Some(endpoint) = file.webdriver {
            self.webdriver.endpoint = endpoint;
        }
        if let Some(browser) = file.browser {
            self.webdriver.browser = browser;
        }
        if let Some(headless) = file.headless {
            self.webdriver.headless = headless;
        }
        if file.database.is_some() {
            self.database = file.database;
        }
        if let Some(case) = file.case_matching {
            self.case_matching = case;
        }
        self.extra_placeholders.extend(file.extra_placeholders);
        Ok(())
    }

    /// Config file first, then command-line flags on top.
    pub fn from_scan_args(args: &ScanArgs, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::load(explicit)?;

        if let Some(secs) = args.timeout {
            config.wait_timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = args.page_mode {
            config.page_mode = mode;
        }
        if let Some(endpoint) = &args.webdriver {
            config.webdriver.endpoint = endpoint.clone();
        }
        if let Some(browser) = args.browser {
            config.webdriver.browser = browser;
        }
        if args.no_headless {
            config.webdriver.headless = false;
        }
        if args.db.is_some() {
            config.database = args.db.clone();
        }
        if args.case_sensitive {
            config.case_matching = CaseMatching::Sensitive;
        }
        config.json_output = args.json;
        Ok(config)
    }

    pub fn from_report_args(args: &ReportArgs, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::load(explicit)?;
        if args.db.is_some() {
            config.database = args.db.clone();
        }
        config.json_output = args.json;
        Ok(config)
    }

    pub fn denylist(&self) -> Denylist {
        Denylist::new(self.case_matching).with_placeholders(self.extra_placeholders.iter().cloned())
    }

    pub fn wait(&self) -> Wait {
        Wait::new(self.wait_timeout, self.poll_interval)
    }

    /// Never longer than the readiness wait.
    pub fn stale_wait(&self) -> Wait {
        self.wait().capped(self.stale_timeout)
    }

    pub fn db_path(&self) -> Result<PathBuf, StoreError> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => store::default_db_path(),
        }
    }
}
