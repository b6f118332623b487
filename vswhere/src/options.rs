// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Selection and output options for a vswhere invocation. */

use {
    crate::{
        error::{Result, VsWhereError},
        version::VersionRange,
    },
    std::path::{Path, PathBuf},
};

/// Product ID matching every installed product.
pub const ALL_PRODUCTS: &str = "*";

/// Options controlling which instances vswhere finds and what it prints.
///
/// See <https://aka.ms/vs/workloads> for product, workload and component IDs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FindOptions {
    find: Option<String>,
    all: bool,
    latest: bool,
    legacy: Option<bool>,
    path: Option<PathBuf>,
    prerelease: bool,
    products: Vec<String>,
    property: Option<String>,
    requires: Vec<String>,
    requires_any: bool,
    sort: bool,
    version: Option<String>,
    include_packages: bool,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return file paths matching a glob pattern under the installation path.
    ///
    /// `?` matches any one character except `\`, `*` matches zero or more
    /// characters except `\` and `**` searches the current directory and
    /// subdirectories for the remaining pattern.
    ///
    /// Activates the `-find` flag.
    pub fn find(&mut self, pattern: impl ToString) -> &mut Self {
        self.find = Some(pattern.to_string());
        self
    }

    /// Find all instances even if they are incomplete and may not launch.
    ///
    /// Activates the `-all` flag.
    pub fn all(&mut self) -> &mut Self {
        self.all = true;
        self
    }

    /// Return only the newest version and last installed.
    ///
    /// Activates the `-latest` flag.
    pub fn latest(&mut self) -> &mut Self {
        self.latest = true;
        self
    }

    /// Also search Visual Studio 2015 and older products.
    ///
    /// Information is limited. Cannot be combined with products or requires.
    pub fn legacy(&mut self, legacy: bool) -> &mut Self {
        self.legacy = Some(legacy);
        self
    }

    /// Get the instance for the given file path.
    ///
    /// Not compatible with any other selection option.
    pub fn path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Also search prereleases.
    pub fn prerelease(&mut self) -> &mut Self {
        self.prerelease = true;
        self
    }

    /// Add a product ID to find.
    ///
    /// Defaults to Community, Professional, and Enterprise if none are given.
    /// Use [ALL_PRODUCTS] to search every installed product.
    pub fn product(&mut self, product: impl ToString) -> &mut Self {
        self.products.push(product.to_string());
        self
    }

    /// Add several product IDs to find.
    pub fn products(&mut self, products: impl IntoIterator<Item = impl ToString>) -> &mut Self {
        self.products
            .extend(products.into_iter().map(|p| p.to_string()));
        self
    }

    /// Return the value of a named property instead of full instance details.
    ///
    /// Use `.`, `/` or `_` to separate object and property names, e.g.
    /// `properties.nickname`.
    pub fn property(&mut self, name: impl ToString) -> &mut Self {
        self.property = Some(name.to_string());
        self
    }

    /// Add a workload or component ID that must be installed.
    pub fn require(&mut self, id: impl ToString) -> &mut Self {
        self.requires.push(id.to_string());
        self
    }

    /// Add several workload or component IDs that must be installed.
    pub fn requires(&mut self, ids: impl IntoIterator<Item = impl ToString>) -> &mut Self {
        self.requires.extend(ids.into_iter().map(|id| id.to_string()));
        self
    }

    /// Match instances having any one of the required IDs instead of all of them.
    pub fn requires_any(&mut self) -> &mut Self {
        self.requires_any = true;
        self
    }

    /// Sort instances from newest version and last installed to oldest.
    ///
    /// With `find`, instances are sorted first and then files lexicographically.
    pub fn sort(&mut self) -> &mut Self {
        self.sort = true;
        self
    }

    /// Restrict to a version range like `[15.0,16.0)`.
    pub fn version(&mut self, range: impl ToString) -> &mut Self {
        self.version = Some(range.to_string());
        self
    }

    /// Include package references in instance records.
    ///
    /// Activates `-include packages`.
    pub fn include_packages(&mut self) -> &mut Self {
        self.include_packages = true;
        self
    }

    /// The requested property, if any.
    pub fn get_property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The requested find pattern, if any.
    pub fn get_find(&self) -> Option<&str> {
        self.find.as_deref()
    }

    /// Whether products or requirements were specified.
    pub fn has_products_or_requires(&self) -> bool {
        !self.products.is_empty() || !self.requires.is_empty()
    }

    /// Whether legacy products should be searched by the `latest` helpers.
    ///
    /// An explicit value wins. Otherwise legacy instances are searched unless
    /// products or requirements were specified, which vswhere rejects with `-legacy`.
    pub fn effective_legacy(&self) -> bool {
        self.legacy
            .unwrap_or_else(|| !self.has_products_or_requires())
    }

    /// Reject option combinations vswhere refuses.
    pub fn validate(&self) -> Result<()> {
        if self.legacy == Some(true) && self.has_products_or_requires() {
            return Err(VsWhereError::InvalidOption(
                "legacy cannot be combined with products or requires".to_string(),
            ));
        }

        if self.path.is_some()
            && (self.all
                || self.latest
                || self.legacy == Some(true)
                || self.prerelease
                || self.has_products_or_requires()
                || self.requires_any
                || self.version.is_some())
        {
            return Err(VsWhereError::InvalidOption(
                "path is not compatible with any other selection option".to_string(),
            ));
        }

        if let Some(version) = &self.version {
            version.parse::<VersionRange>()?;
        }

        Ok(())
    }

    /// Convert to vswhere arguments.
    ///
    /// Does not include the `-utf8` and `-format` flags, which are added at execution.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![];

        if let Some(pattern) = &self.find {
            args.push("-find".to_string());
            args.push(pattern.clone());
        }

        if self.all {
            args.push("-all".to_string());
        }

        if self.latest {
            args.push("-latest".to_string());
        }

        if self.legacy == Some(true) {
            args.push("-legacy".to_string());
        }

        if let Some(path) = &self.path {
            args.push("-path".to_string());
            args.push(path.display().to_string());
        }

        if self.prerelease {
            args.push("-prerelease".to_string());
        }

        if !self.products.is_empty() {
            args.push("-products".to_string());
            args.extend(self.products.iter().cloned());
        }

        if let Some(property) = &self.property {
            args.push("-property".to_string());
            args.push(property.clone());
        }

        if !self.requires.is_empty() {
            args.push("-requires".to_string());
            args.extend(self.requires.iter().cloned());
        }

        if self.requires_any {
            args.push("-requiresAny".to_string());
        }

        if self.sort {
            args.push("-sort".to_string());
        }

        if let Some(version) = &self.version {
            args.push("-version".to_string());
            args.push(version.clone());
        }

        if self.include_packages {
            args.push("-include".to_string());
            args.push("packages".to_string());
        }

        args
    }
}
