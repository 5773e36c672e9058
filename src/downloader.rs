//! Hand-off of chosen URLs to the external downloader
//!
//! The external tool is invoked as
//! `<binary> dl [passthrough flags...] <SERVICE> <URL>` and waited on. Its
//! exit status is logged but never acted upon.

use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors that can occur when invoking the downloader
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The downloader process could not be started
    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },
}

/// Passthrough flags for the downloader, fixed for one top-level invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassthroughOptions {
    flags: Vec<String>,
}

impl PassthroughOptions {
    /// Splits a flag string such as `"--quality 1080 -w S01"` on whitespace.
    ///
    /// An empty or blank string yields no flags.
    pub fn parse(options: &str) -> Self {
        Self {
            flags: options.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Something that can download one URL for a service.
pub trait Downloader {
    fn download(
        &mut self,
        service: &str,
        options: &PassthroughOptions,
        url: &Url,
    ) -> Result<(), DownloadError>;
}

/// Builds the argument list passed after the binary name.
pub fn command_args(service: &str, options: &PassthroughOptions, url: &Url) -> Vec<String> {
    let mut args = Vec::with_capacity(options.flags().len() + 3);
    args.push("dl".to_string());
    args.extend(options.flags().iter().cloned());
    args.push(service.to_string());
    args.push(url.to_string());
    args
}

/// [`Downloader`] that runs the `devine` CLI (or a compatible binary).
pub struct DevineInvoker {
    binary: String,
}

impl DevineInvoker {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for DevineInvoker {
    fn default() -> Self {
        Self::new("devine")
    }
}

impl Downloader for DevineInvoker {
    fn download(
        &mut self,
        service: &str,
        options: &PassthroughOptions,
        url: &Url,
    ) -> Result<(), DownloadError> {
        let args = command_args(service, options, url);
        debug!(binary = %self.binary, ?args, "starting downloader");

        let status = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| DownloadError::Spawn {
                binary: self.binary.clone(),
                source: e,
            })?;

        debug!(binary = %self.binary, code = ?status.code(), "downloader finished");
        Ok(())
    }
}
