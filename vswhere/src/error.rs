// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {std::path::PathBuf, thiserror::Error};

/// Error type for this crate.
#[derive(Debug, Error)]
pub enum VsWhereError {
    #[error("could not find vswhere.exe and downloading is disabled")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on path {}: {}", .0.display(), .1)]
    IoPath(PathBuf, std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bad HTTP status code fetching {0}: {1}")]
    HttpStatus(String, reqwest::StatusCode),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("could not locate vswhere.exe in the latest release of vswhere")]
    ReleaseAssetMissing,

    #[error("digest mismatch on {url}; wanted {expected}, got {got}")]
    DigestMismatch {
        url: String,
        expected: String,
        got: String,
    },

    #[error("vswhere exited with {status}: {}", .stderr.trim())]
    ProcessFailed {
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("vswhere output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("error parsing vswhere JSON output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid version: {0}")]
    VersionParse(String),

    #[error("invalid version range: {0}")]
    VersionRangeParse(String),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, VsWhereError>;
