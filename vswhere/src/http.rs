// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Downloading vswhere.exe releases. */

use {
    crate::error::{Result, VsWhereError},
    fs2::FileExt,
    log::{debug, warn},
    reqwest::blocking::{Client, ClientBuilder},
    serde::Deserialize,
    sha2::Digest,
    std::{
        io::{Read, Write},
        path::Path,
    },
    url::Url,
};

/// GitHub API endpoint describing the latest vswhere release.
pub const LATEST_RELEASE_ENDPOINT: &str =
    "https://api.github.com/repos/Microsoft/vswhere/releases/latest";

/// Name of the release asset holding the executable.
pub const VSWHERE_ASSET_NAME: &str = "vswhere.exe";

/// Default HTTP user agent string.
///
/// The GitHub API rejects requests without one.
pub const USER_AGENT: &str = concat!("vswhere Rust crate/", env!("CARGO_PKG_VERSION"));

/// Obtain an HTTP client, taking proxy environment variables into account.
pub fn get_http_client() -> Result<Client> {
    let mut builder = ClientBuilder::new().user_agent(USER_AGENT);

    // Variables that are not valid UTF-8 cannot name a proxy.
    for (key, value) in std::env::vars_os() {
        let (key, value) = match (key.to_str(), value.to_str()) {
            (Some(key), Some(value)) => (key.to_lowercase(), value.to_string()),
            _ => continue,
        };

        if let Some(schema) = key.strip_suffix("_proxy") {
            if let Ok(url) = Url::parse(&value) {
                let proxy = match schema {
                    "http" => Some(reqwest::Proxy::http(url.as_str())),
                    "https" => Some(reqwest::Proxy::https(url.as_str())),
                    _ => None,
                };

                if let Some(Ok(proxy)) = proxy {
                    builder = builder.proxy(proxy);
                }
            }
        }
    }

    Ok(builder.build()?)
}

/// A release asset in the GitHub releases API.
#[derive(Clone, Debug, Deserialize)]
pub struct GitHubReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A release in the GitHub releases API.
#[derive(Clone, Debug, Deserialize)]
pub struct GitHubRelease {
    #[serde(default)]
    pub tag_name: Option<String>,
    pub assets: Vec<GitHubReleaseAsset>,
}

impl GitHubRelease {
    /// Resolve the download URL of the asset with the given name.
    pub fn asset_url(&self, name: &str) -> Result<&str> {
        self.assets
            .iter()
            .find(|asset| asset.name == name)
            .map(|asset| asset.browser_download_url.as_str())
            .ok_or(VsWhereError::ReleaseAssetMissing)
    }
}

fn fetch(client: &Client, url: &str) -> Result<reqwest::blocking::Response> {
    let url = Url::parse(url)?;
    let response = client.get(url.clone()).send()?;

    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(VsWhereError::HttpStatus(url.to_string(), status))
    }
}

/// Fetch the description of the latest vswhere release.
pub fn fetch_latest_release(client: &Client) -> Result<GitHubRelease> {
    debug!("fetching {}", LATEST_RELEASE_ENDPOINT);
    Ok(fetch(client, LATEST_RELEASE_ENDPOINT)?.json()?)
}

/// Resolve the URL vswhere.exe should be downloaded from.
///
/// A mirror URL is used verbatim. Otherwise the GitHub API is queried for the
/// latest release.
pub fn resolve_download_url(client: &Client, mirror: Option<&str>) -> Result<String> {
    if let Some(mirror) = mirror {
        Url::parse(mirror)?;
        return Ok(mirror.to_string());
    }

    let release = fetch_latest_release(client)?;
    if let Some(tag) = &release.tag_name {
        debug!("latest vswhere release is {}", tag);
    }

    Ok(release.asset_url(VSWHERE_ASSET_NAME)?.to_string())
}

/// Compute the hex encoded SHA-256 of data.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);

    hex::encode(hasher.finalize())
}

/// Verify data matches an optional expected SHA-256.
pub fn verify_digest(url: &str, data: &[u8], expected: Option<&str>) -> Result<()> {
    if let Some(expected) = expected {
        let got = sha256_hex(data);

        if !got.eq_ignore_ascii_case(expected) {
            return Err(VsWhereError::DigestMismatch {
                url: url.to_string(),
                expected: expected.to_lowercase(),
                got,
            });
        }
    }

    Ok(())
}

/// Download a URL to a local path.
///
/// An exclusive lock on a sibling `.lock` file is held for the duration, and
/// the destination is written atomically. If the destination appears while
/// waiting on the lock, no download is performed. This makes it safe to call
/// concurrently from different threads or processes.
pub fn download_to_path(
    client: &Client,
    url: &str,
    sha256: Option<&str>,
    dest: &Path,
) -> Result<()> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| VsWhereError::InvalidOption(format!("{} has no parent", dest.display())))?;
    std::fs::create_dir_all(dest_dir)
        .map_err(|e| VsWhereError::IoPath(dest_dir.to_path_buf(), e))?;

    let lock_path = dest.with_extension("lock");
    let lock = std::fs::File::create(&lock_path)
        .map_err(|e| VsWhereError::IoPath(lock_path.clone(), e))?;
    lock.lock_exclusive()
        .map_err(|e| VsWhereError::IoPath(lock_path.clone(), e))?;

    let res = if dest.exists() {
        debug!("{} appeared while waiting on lock", dest.display());
        Ok(())
    } else {
        download_locked(client, url, sha256, dest_dir, dest)
    };

    // The lock is released when the file is closed regardless.
    if let Err(e) = lock.unlock() {
        warn!("failed to unlock {}: {}", lock_path.display(), e);
    }

    res
}

fn download_locked(
    client: &Client,
    url: &str,
    sha256: Option<&str>,
    dest_dir: &Path,
    dest: &Path,
) -> Result<()> {
    warn!("downloading {}", url);

    let mut response = fetch(client, url)?;
    let mut data = vec![];
    response.read_to_end(&mut data)?;

    verify_digest(url, &data, sha256)?;

    let mut temp = tempfile::NamedTempFile::new_in(dest_dir)
        .map_err(|e| VsWhereError::IoPath(dest_dir.to_path_buf(), e))?;
    temp.write_all(&data)?;
    temp.flush()?;

    temp.persist(dest)
        .map_err(|e| VsWhereError::IoPath(dest.to_path_buf(), e.error))?;

    warn!("wrote {} ({} bytes)", dest.display(), data.len());

    Ok(())
}
