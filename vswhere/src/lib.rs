// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Interface to Microsoft's Visual Studio locator tool, vswhere.

If Visual Studio 15.2 or later is installed, the vswhere.exe installed with
Visual Studio is used. Otherwise the latest release of vswhere is downloaded
from <https://github.com/Microsoft/vswhere> into a cache directory the first
time it is needed.

[VsWhere] is the main entry point. The free functions in this crate operate on
a process-wide configuration which can be adjusted with [set_vswhere_path] and
[set_download_mirror].

```no_run
use vswhere::{FindOptions, VsWhere};

let vswhere = VsWhere::from_env();
let mut options = FindOptions::new();
options
    .product("*")
    .require("Microsoft.VisualStudio.Component.VC.Tools.x86.x64");

if let Some(path) = vswhere.get_latest_path(&options)? {
    println!("MSVC tools are installed in {}", path.display());
}
# Ok::<(), vswhere::VsWhereError>(())
```
*/

mod config;
pub use config::{
    default_cache_dir, default_config, set_download_mirror, set_vswhere_path, VsWhereConfig,
    ENV_CACHE_DIR, ENV_DOWNLOAD_MIRROR, ENV_DOWNLOAD_SHA256, ENV_NO_DOWNLOAD, ENV_VSWHERE_PATH,
};
mod error;
pub use error::{Result, VsWhereError};
pub mod http;
mod instance;
pub use instance::{VsInstance, VsPackage};
mod locate;
pub use locate::{
    default_install_paths, download_path, download_vswhere, download_vswhere_from,
    find_local_vswhere, find_vswhere, VSWHERE_EXE,
};
mod options;
pub use options::{FindOptions, ALL_PRODUCTS};
mod query;
pub use query::{parse_output, QueryOutput, QueryResult, VsWhere};
pub mod version;
pub use version::{InstallationVersion, VersionRange};

#[cfg(test)]
mod testutil;

use std::path::PathBuf;

fn default_vswhere() -> VsWhere {
    VsWhere::new(default_config())
}

/// Get the path to vswhere.exe using the process-wide configuration.
///
/// If vswhere is not installed as part of Visual Studio and no alternate path
/// is set with [set_vswhere_path], the latest release is downloaded.
pub fn get_vswhere_path() -> Result<PathBuf> {
    find_vswhere(&default_config())
}

/// Call vswhere with raw arguments. See [VsWhere::execute].
pub fn execute(args: &[String]) -> Result<QueryOutput> {
    default_vswhere().execute(args)
}

/// Call vswhere and return the results. See [VsWhere::find].
pub fn find(options: &FindOptions) -> Result<QueryOutput> {
    default_vswhere().find(options)
}

/// Call vswhere and return only the first result. See [VsWhere::find_first].
pub fn find_first(options: &FindOptions) -> Result<Option<QueryResult>> {
    default_vswhere().find_first(options)
}

/// Get the latest installed Visual Studio instance. See [VsWhere::get_latest].
pub fn get_latest(options: &FindOptions) -> Result<Option<VsInstance>> {
    default_vswhere().get_latest(options)
}

/// Get the path of the latest installed Visual Studio. See [VsWhere::get_latest_path].
pub fn get_latest_path(options: &FindOptions) -> Result<Option<PathBuf>> {
    default_vswhere().get_latest_path(options)
}

/// Get the version of the latest installed Visual Studio. See [VsWhere::get_latest_version].
pub fn get_latest_version(options: &FindOptions) -> Result<Option<String>> {
    default_vswhere().get_latest_version(options)
}

/// Get the major version of the latest installed Visual Studio, or 0.
pub fn get_latest_major_version(options: &FindOptions) -> Result<u32> {
    default_vswhere().get_latest_major_version(options)
}
