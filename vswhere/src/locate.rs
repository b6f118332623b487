// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        config::VsWhereConfig,
        error::{Result, VsWhereError},
        http::{download_to_path, get_http_client, resolve_download_url, sha256_hex},
    },
    log::{debug, info},
    reqwest::blocking::Client,
    std::path::{Path, PathBuf},
};

/// Filename of the executable.
pub const VSWHERE_EXE: &str = "vswhere.exe";

const INSTALLER_RELATIVE_PATH: &str = r"Microsoft Visual Studio\Installer\vswhere.exe";

/// Paths where the Visual Studio installer places vswhere.exe.
///
/// vswhere.exe ships with Visual Studio 15.2 and later. Only locations whose
/// base directory environment variable is defined are returned.
pub fn default_install_paths() -> Vec<PathBuf> {
    ["ProgramFiles(x86)", "ProgramData"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .filter(|base| !base.is_empty())
        .map(|base| Path::new(&base).join(INSTALLER_RELATIVE_PATH))
        .collect()
}

/// Where a downloaded vswhere.exe is stored.
///
/// The latest GitHub release lives directly under the cache directory. Mirror
/// downloads are keyed by a digest of their URL so switching mirrors never
/// reuses an executable fetched from elsewhere.
pub fn download_path(config: &VsWhereConfig) -> PathBuf {
    match &config.download_mirror {
        Some(url) => {
            let digest = sha256_hex(url.as_bytes());
            config
                .cache_dir
                .join(format!("mirror-{}", &digest[0..16]))
                .join(VSWHERE_EXE)
        }
        None => config.cache_dir.join(VSWHERE_EXE),
    }
}

/// Attempt to locate vswhere.exe without touching the network.
pub fn find_local_vswhere(config: &VsWhereConfig) -> Option<PathBuf> {
    if let Some(path) = &config.vswhere_path {
        if path.exists() {
            return Some(path.clone());
        }

        debug!(
            "configured vswhere path {} does not exist; ignoring",
            path.display()
        );
    }

    if let Some(path) = default_install_paths().into_iter().find(|p| p.exists()) {
        return Some(path);
    }

    let path = download_path(config);
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Download vswhere.exe into the cache, returning its path.
///
/// An existing cached executable is reused without any network access.
pub fn download_vswhere(config: &VsWhereConfig) -> Result<PathBuf> {
    let dest = download_path(config);

    if dest.exists() {
        return Ok(dest);
    }

    let client = get_http_client()?;
    let url = resolve_download_url(&client, config.download_mirror.as_deref())?;

    download_vswhere_from(config, &client, &url)
}

/// Download vswhere.exe from an already resolved URL into the cache.
pub fn download_vswhere_from(
    config: &VsWhereConfig,
    client: &Client,
    url: &str,
) -> Result<PathBuf> {
    let dest = download_path(config);

    info!("vswhere download URL: {}", url);
    download_to_path(client, url, config.download_sha256.as_deref(), &dest)?;

    Ok(dest)
}

/// Attempt to locate vswhere.exe.
///
/// In order: the configured path, the copy installed with Visual Studio, a
/// previously downloaded copy. Failing those the latest release (or the
/// configured mirror) is downloaded into the cache directory.
pub fn find_vswhere(config: &VsWhereConfig) -> Result<PathBuf> {
    if let Some(path) = find_local_vswhere(config) {
        debug!("using vswhere at {}", path.display());
        return Ok(path);
    }

    if !config.allow_download {
        return Err(VsWhereError::NotFound);
    }

    download_vswhere(config)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testutil::{serve_http, DEFAULT_TEMP_DIR},
    };

    fn test_config(name: &str) -> VsWhereConfig {
        VsWhereConfig::default()
            .cache_dir(DEFAULT_TEMP_DIR.path().join(name))
            .allow_download(false)
    }

    #[test]
    fn download_path_keyed_by_url() {
        let config = test_config("keyed");
        assert_eq!(download_path(&config), config.cache_dir.join("vswhere.exe"));

        let a = download_path(&config.clone().download_mirror("https://a.example/vswhere.exe"));
        let b = download_path(&config.clone().download_mirror("https://b.example/vswhere.exe"));

        assert_ne!(a, b);
        assert!(a.starts_with(&config.cache_dir));
        assert!(a.ends_with("vswhere.exe"));
        assert_eq!(
            a,
            download_path(&config.download_mirror("https://a.example/vswhere.exe"))
        );
    }

    #[test]
    fn explicit_path_wins() -> Result<()> {
        let config = test_config("explicit");
        std::fs::create_dir_all(&config.cache_dir)?;

        let explicit = config.cache_dir.join("custom-vswhere.exe");
        std::fs::write(&explicit, b"")?;
        std::fs::write(download_path(&config), b"")?;

        assert_eq!(find_vswhere(&config.vswhere_path(&explicit))?, explicit);

        Ok(())
    }

    #[test]
    fn missing_explicit_path_falls_back_to_cache() -> Result<()> {
        let config = test_config("fallback");
        std::fs::create_dir_all(&config.cache_dir)?;
        let cached = download_path(&config);
        std::fs::write(&cached, b"")?;

        let config = config.vswhere_path(DEFAULT_TEMP_DIR.path().join("does-not-exist.exe"));

        // A Windows host with Visual Studio installed resolves the bundled copy first.
        let found = find_vswhere(&config)?;
        if default_install_paths().iter().all(|p| !p.exists()) {
            assert_eq!(found, cached);
        }

        Ok(())
    }

    #[test]
    fn not_found_without_download() {
        let config = test_config("not_found");

        if default_install_paths().iter().all(|p| !p.exists()) {
            assert!(matches!(
                find_vswhere(&config),
                Err(VsWhereError::NotFound)
            ));
        }
    }

    #[test]
    fn mirror_download_cached() -> anyhow::Result<()> {
        let (url, server) = serve_http(b"mirrored vswhere", 1)?;
        let config = test_config("mirror_download")
            .download_mirror(&url)
            .download_sha256(sha256_hex(b"mirrored vswhere"));

        let path = download_vswhere(&config)?;
        assert_eq!(path, download_path(&config));
        assert_eq!(std::fs::read(&path)?, b"mirrored vswhere");

        // The server only answers once. A second fetch would fail to connect.
        assert_eq!(server.join().expect("server thread panicked")?.len(), 1);
        assert_eq!(download_vswhere(&config)?, path);

        Ok(())
    }

    #[cfg(windows)]
    #[test]
    fn install_paths_use_program_files() {
        let paths = default_install_paths();
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| p.ends_with("vswhere.exe")));
    }
}
