// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{error::Result, version::InstallationVersion},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{collections::BTreeMap, path::PathBuf},
};

/// A package reference, present when `-include packages` is used.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VsPackage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_extension: Option<bool>,
}

/// A Visual Studio instance as reported by vswhere.
///
/// Legacy instances (Visual Studio 2015 and older) only carry the instance ID,
/// installation path and installation version.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VsInstance {
    pub instance_id: String,
    pub installation_path: PathBuf,
    pub installation_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_launchable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_prerelease: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reboot_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_party_notices: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub catalog: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<VsPackage>>,

    /// Keys not modeled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl VsInstance {
    /// Parse the installation version.
    pub fn version(&self) -> Result<InstallationVersion> {
        self.installation_version.parse()
    }

    /// Whether this is a Visual Studio 2015 or older instance.
    ///
    /// Those lack the product metadata newer installers record.
    pub fn is_legacy(&self) -> bool {
        self.product_id.is_none() && self.engine_path.is_none()
    }

    /// Look up a property by name, the way `vswhere -property` does.
    ///
    /// Object and property names are separated by `.`, `/` or `_`, e.g.
    /// `properties.nickname` or `catalog/productDisplayVersion`. Top-level names
    /// are the camelCase JSON keys. Matching is case-insensitive.
    ///
    /// Scalars are converted to strings. Returns `None` for unknown names and
    /// for objects or arrays.
    pub fn property(&self, name: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;

        let mut current = &value;
        for part in name.split(|c| c == '.' || c == '/' || c == '_') {
            let object = current.as_object()?;
            current = object
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(part))
                .map(|(_, v)| v)?;
        }

        match current {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
