// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Settings controlling how vswhere.exe is located and downloaded. */

use {
    once_cell::sync::Lazy,
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
        sync::RwLock,
    },
};

/// Environment variable holding an explicit path to vswhere.exe.
pub const ENV_VSWHERE_PATH: &str = "VSWHERE_PATH";

/// Environment variable holding a URL to download vswhere.exe from.
pub const ENV_DOWNLOAD_MIRROR: &str = "VSWHERE_DOWNLOAD_MIRROR";

/// Environment variable holding the expected SHA-256 of a downloaded vswhere.exe.
pub const ENV_DOWNLOAD_SHA256: &str = "VSWHERE_DOWNLOAD_SHA256";

/// Environment variable overriding the download cache directory.
pub const ENV_CACHE_DIR: &str = "VSWHERE_CACHE_DIR";

/// Environment variable disabling downloads when set to a true-ish value.
pub const ENV_NO_DOWNLOAD: &str = "VSWHERE_NO_DOWNLOAD";

/// Controls how vswhere.exe is located.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VsWhereConfig {
    /// Explicit path to vswhere.exe.
    ///
    /// Takes precedence over everything else, but only if the file exists.
    pub vswhere_path: Option<PathBuf>,

    /// URL to download vswhere.exe from instead of the latest GitHub release.
    pub download_mirror: Option<String>,

    /// Hex encoded SHA-256 a downloaded vswhere.exe must match.
    pub download_sha256: Option<String>,

    /// Directory where downloaded executables are stored.
    pub cache_dir: PathBuf,

    /// Whether vswhere.exe may be downloaded if it isn't found locally.
    pub allow_download: bool,
}

impl Default for VsWhereConfig {
    fn default() -> Self {
        Self {
            vswhere_path: None,
            download_mirror: None,
            download_sha256: None,
            cache_dir: default_cache_dir(),
            allow_download: true,
        }
    }
}

impl VsWhereConfig {
    /// Construct an instance from defaults overlaid with `VSWHERE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    /// Construct an instance from defaults overlaid with the given variables.
    pub fn from_vars(vars: impl Iterator<Item = (OsString, OsString)>) -> Self {
        let mut config = Self::default();

        for (key, value) in vars {
            if value.is_empty() {
                continue;
            }

            match key.to_str() {
                Some(ENV_VSWHERE_PATH) => {
                    config.vswhere_path = Some(PathBuf::from(value));
                }
                Some(ENV_DOWNLOAD_MIRROR) => {
                    config.download_mirror = Some(value.to_string_lossy().to_string());
                }
                Some(ENV_DOWNLOAD_SHA256) => {
                    config.download_sha256 = Some(value.to_string_lossy().to_lowercase());
                }
                Some(ENV_CACHE_DIR) => {
                    config.cache_dir = PathBuf::from(value);
                }
                Some(ENV_NO_DOWNLOAD) => {
                    let value = value.to_string_lossy().to_lowercase();
                    config.allow_download = value == "0" || value == "false";
                }
                _ => {}
            }
        }

        config
    }

    /// Set an explicit path to vswhere.exe.
    pub fn vswhere_path(mut self, path: impl AsRef<Path>) -> Self {
        self.vswhere_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the URL vswhere.exe is downloaded from.
    pub fn download_mirror(mut self, url: impl ToString) -> Self {
        self.download_mirror = Some(url.to_string());
        self
    }

    /// Require downloads to match a SHA-256 digest.
    pub fn download_sha256(mut self, digest: impl ToString) -> Self {
        self.download_sha256 = Some(digest.to_string().to_lowercase());
        self
    }

    /// Set the directory holding downloaded executables.
    pub fn cache_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.cache_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set whether downloading is allowed.
    pub fn allow_download(mut self, allow: bool) -> Self {
        self.allow_download = allow;
        self
    }
}

/// The default directory for downloaded vswhere executables.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vswhere")
}

static DEFAULT_CONFIG: Lazy<RwLock<VsWhereConfig>> =
    Lazy::new(|| RwLock::new(VsWhereConfig::from_env()));

/// Obtain a copy of the process-wide configuration.
///
/// It is seeded from the environment on first use.
pub fn default_config() -> VsWhereConfig {
    match DEFAULT_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn update_default_config(f: impl FnOnce(&mut VsWhereConfig)) {
    let mut guard = match DEFAULT_CONFIG.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    f(&mut guard);
}

/// Set the path to vswhere.exe used by the crate-level functions.
///
/// If the file exists, it overrides any version installed as part of Visual Studio.
/// `None` restores default lookup.
pub fn set_vswhere_path(path: Option<impl AsRef<Path>>) {
    let path = path.map(|p| p.as_ref().to_path_buf());
    update_default_config(|config| config.vswhere_path = path);
}

/// Set a URL from which vswhere.exe should be downloaded by the crate-level functions.
///
/// Only used when vswhere.exe is not installed as part of Visual Studio and no
/// alternate path was given with [set_vswhere_path].
pub fn set_download_mirror(url: Option<impl ToString>) {
    let url = url.map(|u| u.to_string());
    update_default_config(|config| config.download_mirror = url);
}
