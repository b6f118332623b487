// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Visual Studio version numbers and vswhere version ranges. */

use {
    crate::error::{Result, VsWhereError},
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    std::{
        cmp::Ordering,
        fmt::{Display, Formatter},
        str::FromStr,
    },
};

/// A Visual Studio installation version.
///
/// Visual Studio 2017 and newer report 4 components, e.g. `15.8.28010.2003`.
/// Legacy products only report the major version with a zero minor, e.g. `14.0`.
///
/// Components absent from the string compare as zero, so `16.0` equals `16.0.0.0`.
#[derive(Clone, Debug, Eq)]
pub struct InstallationVersion {
    components: Vec<u64>,
}

impl InstallationVersion {
    /// Construct an instance from explicit components.
    pub fn new(components: impl Into<Vec<u64>>) -> Result<Self> {
        let components = components.into();

        if components.is_empty() || components.len() > 4 {
            return Err(VsWhereError::VersionParse(format!(
                "expected 1 to 4 components, got {}",
                components.len()
            )));
        }

        Ok(Self { components })
    }

    /// The major version. e.g. `15` for Visual Studio 2017.
    pub fn major(&self) -> u64 {
        self.components[0]
    }

    /// The minor version, or 0 if not present.
    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    /// Obtain the components as parsed.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for InstallationVersion {
    type Err = VsWhereError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        let components = s
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| VsWhereError::VersionParse(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(components).map_err(|_| VsWhereError::VersionParse(s.to_string()))
    }
}

impl Display for InstallationVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts = self
            .components
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        f.write_str(&parts.join("."))
    }
}

impl PartialEq for InstallationVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for InstallationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InstallationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (0..4)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl Serialize for InstallationVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstallationVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One end of a [VersionRange].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Bound {
    Unbounded,
    Inclusive(InstallationVersion),
    Exclusive(InstallationVersion),
}

/// A version range as accepted by `vswhere -version`.
///
/// Uses interval notation: `[15.0,16.0)` matches all 15.x versions, `(,16.0]`
/// matches anything up to and including 16.0, `[15.0]` matches exactly 15.0.
/// A bare version like `15.0` is a minimum version.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionRange {
    pub min: Bound,
    pub max: Bound,
}

impl VersionRange {
    /// Whether a version falls within this range.
    pub fn contains(&self, version: &InstallationVersion) -> bool {
        let above_min = match &self.min {
            Bound::Unbounded => true,
            Bound::Inclusive(v) => version >= v,
            Bound::Exclusive(v) => version > v,
        };

        let below_max = match &self.max {
            Bound::Unbounded => true,
            Bound::Inclusive(v) => version <= v,
            Bound::Exclusive(v) => version < v,
        };

        above_min && below_max
    }
}

fn parse_bound_version(s: &str, range: &str) -> Result<Option<InstallationVersion>> {
    let s = s.trim();

    if s.is_empty() {
        Ok(None)
    } else {
        s.parse()
            .map(Some)
            .map_err(|_| VsWhereError::VersionRangeParse(range.to_string()))
    }
}

impl FromStr for VersionRange {
    type Err = VsWhereError;

    fn from_str(s: &str) -> Result<Self> {
        let range = s.trim();
        let bad = || VsWhereError::VersionRangeParse(s.to_string());

        if range.is_empty() {
            return Err(bad());
        }

        let first = range.chars().next().ok_or_else(bad)?;

        if first != '[' && first != '(' {
            let min = parse_bound_version(range, s)?.ok_or_else(bad)?;

            return Ok(Self {
                min: Bound::Inclusive(min),
                max: Bound::Unbounded,
            });
        }

        let last = range.chars().last().ok_or_else(bad)?;
        if range.len() < 2 || (last != ']' && last != ')') {
            return Err(bad());
        }

        let min_inclusive = first == '[';
        let max_inclusive = last == ']';
        let inner = &range[1..range.len() - 1];

        match inner.split_once(',') {
            Some((min, max)) => {
                if max.contains(',') {
                    return Err(bad());
                }

                let min = parse_bound_version(min, s)?;
                let max = parse_bound_version(max, s)?;

                if min.is_none() && max.is_none() {
                    return Err(bad());
                }

                if let (Some(min), Some(max)) = (&min, &max) {
                    if min > max {
                        return Err(bad());
                    }
                }

                Ok(Self {
                    min: match min {
                        None => Bound::Unbounded,
                        Some(v) if min_inclusive => Bound::Inclusive(v),
                        Some(v) => Bound::Exclusive(v),
                    },
                    max: match max {
                        None => Bound::Unbounded,
                        Some(v) if max_inclusive => Bound::Inclusive(v),
                        Some(v) => Bound::Exclusive(v),
                    },
                })
            }
            None => {
                // Exact match only makes sense with both ends inclusive.
                if !(min_inclusive && max_inclusive) {
                    return Err(bad());
                }

                let v = parse_bound_version(inner, s)?.ok_or_else(bad)?;

                Ok(Self {
                    min: Bound::Inclusive(v.clone()),
                    max: Bound::Inclusive(v),
                })
            }
        }
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let (Bound::Inclusive(min), Bound::Inclusive(max)) = (&self.min, &self.max) {
            if min.components() == max.components() {
                return write!(f, "[{}]", min);
            }
        }

        match &self.min {
            Bound::Unbounded => f.write_str("(,")?,
            Bound::Inclusive(v) => write!(f, "[{},", v)?,
            Bound::Exclusive(v) => write!(f, "({},", v)?,
        }

        match &self.max {
            Bound::Unbounded => f.write_str(")"),
            Bound::Inclusive(v) => write!(f, "{}]", v),
            Bound::Exclusive(v) => write!(f, "{})", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> InstallationVersion {
        s.parse().unwrap()
    }

    #[test]
    fn parse_installation_version() -> Result<()> {
        let version = InstallationVersion::from_str("15.8.28010.2003")?;
        assert_eq!(version.components(), &[15, 8, 28010, 2003]);
        assert_eq!(version.major(), 15);
        assert_eq!(version.minor(), 8);
        assert_eq!(version.to_string(), "15.8.28010.2003");

        let legacy = InstallationVersion::from_str("14.0")?;
        assert_eq!(legacy.major(), 14);

        assert!(InstallationVersion::from_str("").is_err());
        assert!(InstallationVersion::from_str("15.x").is_err());
        assert!(InstallationVersion::from_str("1.2.3.4.5").is_err());

        Ok(())
    }

    #[test]
    fn version_ordering() {
        assert!(v("16.0") > v("15.9.28307.1585"));
        assert!(v("15.10") > v("15.9"));
        assert_eq!(v("16.0"), v("16.0.0.0"));

        let mut versions = vec![v("17.4.33205.214"), v("14.0"), v("16.11.5")];
        versions.sort();
        assert_eq!(
            versions.iter().map(|v| v.major()).collect::<Vec<_>>(),
            vec![14, 16, 17]
        );
    }

    #[test]
    fn version_serde() -> anyhow::Result<()> {
        let version: InstallationVersion = serde_json::from_str("\"17.4.33205.214\"")?;
        assert_eq!(version.major(), 17);
        assert_eq!(serde_json::to_string(&version)?, "\"17.4.33205.214\"");
        assert!(serde_json::from_str::<InstallationVersion>("\"latest\"").is_err());

        Ok(())
    }

    #[test]
    fn parse_version_ranges() -> Result<()> {
        let range = VersionRange::from_str("[15.0,16.0)")?;
        assert!(range.contains(&v("15.0")));
        assert!(range.contains(&v("15.9.28307.1585")));
        assert!(!range.contains(&v("16.0")));
        assert!(!range.contains(&v("14.0")));
        assert_eq!(range.to_string(), "[15.0,16.0)");

        let range = VersionRange::from_str("(,16.0]")?;
        assert_eq!(range.min, Bound::Unbounded);
        assert!(range.contains(&v("16.0")));
        assert!(range.contains(&v("10.0")));
        assert!(!range.contains(&v("16.1")));

        let range = VersionRange::from_str("[17.0,)")?;
        assert!(range.contains(&v("17.4.33205.214")));
        assert!(!range.contains(&v("16.11")));

        let range = VersionRange::from_str("[15.0]")?;
        assert!(range.contains(&v("15.0.0.0")));
        assert!(!range.contains(&v("15.1")));
        assert_eq!(range.to_string(), "[15.0]");

        let range = VersionRange::from_str("16.0")?;
        assert!(range.contains(&v("16.0")));
        assert!(range.contains(&v("17.0")));
        assert!(!range.contains(&v("15.9")));

        Ok(())
    }

    #[test]
    fn reject_bad_version_ranges() {
        for bad in [
            "", "[", "[]", "[,]", "(15.0)", "[16.0,15.0)", "[15.0,16.0", "[a,b)", "[1,2,3]",
        ] {
            assert!(VersionRange::from_str(bad).is_err(), "{} should not parse", bad);
        }
    }
}
