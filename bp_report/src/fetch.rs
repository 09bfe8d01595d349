//! Device download collaborator.
//!
//! Downloading from a paired measurement device is done by an external
//! program. [`CommandFetcher`] runs it with an explicit timeout and moves
//! the file it produces to a dated name next to the other sources. Nothing
//! here knows about pairing or retries; a failed download is reported as a
//! [`FetchError`] and the run stops.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::FetchError;
use crate::services::layout::DATE_FORMAT;

/// A paired device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    /// Short name, used as the download file prefix.
    pub name: String,
    /// Model identifier passed to the downloader.
    pub model: String,
    pub mac: String,
}

impl DeviceSpec {
    pub fn new(name: impl Into<String>, model: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            mac: mac.into(),
        }
    }

    /// The two supported monitors. MAC addresses have to be filled in by
    /// the config file.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("M7", "hem-7361t", "YOUR-MAC1-HERE"),
            Self::new("Evolv", "hem-7600t", "YOUR-MAC2-HERE"),
        ]
    }
}

/// How the downloader program is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the device arguments.
    #[serde(default = "default_args_prefix")]
    pub args_prefix: Vec<String>,
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    /// File the downloader writes, relative to `working_dir`.
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "python".to_string()
}

fn default_args_prefix() -> Vec<String> {
    vec!["omblepy.py".to_string()]
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("omblepy-main")
}

fn default_output_file() -> String {
    "user1.csv".to_string()
}

fn default_timeout_secs() -> u64 {
    180
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            args_prefix: default_args_prefix(),
            working_dir: default_working_dir(),
            output_file: default_output_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<device>-1-<YYYY-MM-DD>.csv`
pub fn download_file_name(device: &str, date: NaiveDate) -> String {
    format!("{}-1-{}.csv", device, date.format(DATE_FORMAT))
}

/// `analiza-<YYYY-MM-DD>.csv`, the output base of a download run.
pub fn analysis_file_name(date: NaiveDate) -> String {
    format!("analiza-{}.csv", date.format(DATE_FORMAT))
}

/// Resolve a device selector: a device name, `all`/`both`, or `none`.
pub fn select_devices<'a>(
    devices: &'a [DeviceSpec],
    selector: &str,
) -> Result<Vec<&'a DeviceSpec>, FetchError> {
    match selector.to_lowercase().as_str() {
        "all" | "both" => Ok(devices.iter().collect()),
        "none" => Ok(Vec::new()),
        name => devices
            .iter()
            .find(|d| d.name.to_lowercase() == name)
            .map(|d| vec![d])
            .ok_or_else(|| FetchError::UnknownDevice(selector.to_string())),
    }
}

/// Downloads one device's measurements to a CSV file.
pub trait DeviceFetcher: Send + Sync {
    /// Fetch into `destination` and return the written path.
    fn fetch(&self, device: &DeviceSpec, destination: &Path) -> Result<PathBuf, FetchError>;
}

/// Runs the external downloader as a child process.
#[derive(Debug, Clone, Default)]
pub struct CommandFetcher {
    settings: FetchSettings,
}

impl CommandFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Full argument list for one device.
    pub fn command_args(&self, device: &DeviceSpec) -> Vec<String> {
        let mut args = self.settings.args_prefix.clone();
        args.extend([
            "-d".to_string(),
            device.model.clone(),
            "-m".to_string(),
            device.mac.clone(),
            "--loggerDebug".to_string(),
        ]);
        args
    }

    async fn run(&self, device: &DeviceSpec) -> Result<(), FetchError> {
        let timeout = self.settings.timeout();
        let mut child = Command::new(&self.settings.program)
            .args(self.command_args(device))
            .current_dir(&self.settings.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::Spawn {
                device: device.name.clone(),
                source,
            })?;

        let waited = tokio::time::timeout(timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status.map_err(|source| FetchError::Io {
                device: device.name.clone(),
                source,
            })?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to stop downloader for {}: {}", device.name, e);
                }
                return Err(FetchError::Timeout {
                    device: device.name.clone(),
                    timeout,
                });
            }
        };

        if !status.success() {
            return Err(FetchError::Failed {
                device: device.name.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Rename, falling back to copy and remove across file systems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

impl DeviceFetcher for CommandFetcher {
    fn fetch(&self, device: &DeviceSpec, destination: &Path) -> Result<PathBuf, FetchError> {
        info!("Running downloader for '{}' ({})", device.name, device.model);
        debug!(
            "{} {}",
            self.settings.program,
            self.command_args(device).join(" ")
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| FetchError::Io {
                device: device.name.clone(),
                source,
            })?;
        runtime.block_on(self.run(device))?;

        let produced = self.settings.working_dir.join(&self.settings.output_file);
        if !produced.is_file() {
            return Err(FetchError::MissingOutput {
                device: device.name.clone(),
                path: produced,
            });
        }
        move_file(&produced, destination).map_err(|source| FetchError::Io {
            device: device.name.clone(),
            source,
        })?;

        info!("Saved as {}", destination.display());
        Ok(destination.to_path_buf())
    }
}
