// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Running vswhere and interpreting its output. */

use {
    crate::{
        config::VsWhereConfig,
        error::{Result, VsWhereError},
        instance::VsInstance,
        locate::find_vswhere,
        options::FindOptions,
    },
    log::debug,
    once_cell::sync::OnceCell,
    std::path::PathBuf,
};

/// Parsed output of a vswhere invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutput {
    /// Full instance records. Produced by default.
    Instances(Vec<VsInstance>),

    /// One property value per instance. Produced by `-property`.
    Properties(Vec<String>),

    /// Matching file paths. Produced by `-find`.
    Files(Vec<PathBuf>),
}

impl QueryOutput {
    /// Number of results.
    pub fn len(&self) -> usize {
        match self {
            Self::Instances(v) => v.len(),
            Self::Properties(v) => v.len(),
            Self::Files(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retain only the first result.
    pub fn first(self) -> Option<QueryResult> {
        match self {
            Self::Instances(v) => v.into_iter().next().map(QueryResult::Instance),
            Self::Properties(v) => v.into_iter().next().map(QueryResult::Property),
            Self::Files(v) => v.into_iter().next().map(QueryResult::File),
        }
    }

    /// Render as JSON, the way vswhere would for the same arguments.
    ///
    /// Properties are rendered as a JSON array of strings.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(match self {
            Self::Instances(v) => serde_json::to_string_pretty(v)?,
            Self::Properties(v) => serde_json::to_string_pretty(v)?,
            Self::Files(v) => serde_json::to_string_pretty(v)?,
        })
    }
}

/// A single result of a vswhere invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    Instance(VsInstance),
    Property(String),
    File(PathBuf),
}

/// Switches whose following argument is a value rather than another switch.
const VALUE_SWITCHES: &[&str] = &["find", "format", "path", "property", "version"];

/// Whether `args` contain the named switch, spelled `-name` or `/name`.
///
/// Values of switches taking a single argument are never matched.
fn has_switch(args: &[String], name: &str) -> bool {
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if let Some(switch) = arg.strip_prefix('-').or_else(|| arg.strip_prefix('/')) {
            if switch.eq_ignore_ascii_case(name) {
                return true;
            }

            if VALUE_SWITCHES.iter().any(|s| switch.eq_ignore_ascii_case(s)) {
                iter.next();
            }
        }
    }

    false
}

/// Parse the standard output of vswhere invoked with `args`.
pub fn parse_output(args: &[String], stdout: &[u8]) -> Result<QueryOutput> {
    let stdout = String::from_utf8(stdout.to_vec())?;
    // vswhere -utf8 may emit a byte order mark.
    let stdout = stdout.trim_start_matches('\u{feff}');

    if has_switch(args, "property") {
        Ok(QueryOutput::Properties(
            stdout.lines().map(|l| l.to_string()).collect(),
        ))
    } else if stdout.trim().is_empty() {
        // Nothing matched.
        Ok(if has_switch(args, "find") {
            QueryOutput::Files(vec![])
        } else {
            QueryOutput::Instances(vec![])
        })
    } else if has_switch(args, "find") {
        Ok(QueryOutput::Files(serde_json::from_str(stdout)?))
    } else {
        Ok(QueryOutput::Instances(serde_json::from_str(stdout)?))
    }
}

/// Interface to a vswhere executable.
///
/// The executable is resolved on first use according to the [VsWhereConfig].
#[derive(Debug)]
pub struct VsWhere {
    config: VsWhereConfig,
    exe: OnceCell<PathBuf>,
}

impl VsWhere {
    /// Construct an instance from explicit settings.
    pub fn new(config: VsWhereConfig) -> Self {
        Self {
            config,
            exe: OnceCell::new(),
        }
    }

    /// Construct an instance configured by `VSWHERE_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(VsWhereConfig::from_env())
    }

    /// The settings this instance was constructed with.
    pub fn config(&self) -> &VsWhereConfig {
        &self.config
    }

    /// Resolve the path to vswhere.exe, downloading it if necessary.
    pub fn vswhere_path(&self) -> Result<&PathBuf> {
        self.exe.get_or_try_init(|| find_vswhere(&self.config))
    }

    /// Run vswhere with raw arguments and parse the results.
    ///
    /// If the arguments contain `-property`, property values are returned one per
    /// instance. Otherwise `-format json` is appended and the JSON output parsed
    /// into instances, or into file paths if `-find` is present.
    pub fn execute(&self, args: &[String]) -> Result<QueryOutput> {
        let exe = self.vswhere_path()?;

        let mut full_args = vec!["-utf8".to_string()];
        full_args.extend(args.iter().cloned());

        if !has_switch(args, "property") {
            full_args.push("-format".to_string());
            full_args.push("json".to_string());
        }

        debug!("running {} {}", exe.display(), full_args.join(" "));

        let output = duct::cmd(exe.clone(), &full_args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| VsWhereError::IoPath(exe.clone(), e))?;

        if !output.status.success() {
            return Err(VsWhereError::ProcessFailed {
                status: output.status.to_string(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        parse_output(args, &output.stdout)
    }

    /// Find Visual Studio instances, files or properties.
    pub fn find(&self, options: &FindOptions) -> Result<QueryOutput> {
        options.validate()?;
        self.execute(&options.to_args())
    }

    /// Find full instance records.
    ///
    /// Errors if `options` select a property or file pattern.
    pub fn find_instances(&self, options: &FindOptions) -> Result<Vec<VsInstance>> {
        match self.find(options)? {
            QueryOutput::Instances(v) => Ok(v),
            _ => Err(VsWhereError::InvalidOption(
                "instance records are not returned when property or find is set".to_string(),
            )),
        }
    }

    /// Find values of a single property.
    pub fn find_properties(&self, options: &FindOptions, property: &str) -> Result<Vec<String>> {
        let mut options = options.clone();
        options.property(property);

        match self.find(&options)? {
            QueryOutput::Properties(v) => Ok(v),
            _ => Err(VsWhereError::InvalidOption(
                "expected property output".to_string(),
            )),
        }
    }

    /// Find files matching a glob pattern under installation paths.
    pub fn find_files(&self, options: &FindOptions, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut options = options.clone();
        options.find(pattern);

        match self.find(&options)? {
            QueryOutput::Files(v) => Ok(v),
            _ => Err(VsWhereError::InvalidOption(
                "file output is not returned when property is set".to_string(),
            )),
        }
    }

    /// Find and return only the first result, or `None` if there are no results.
    pub fn find_first(&self, options: &FindOptions) -> Result<Option<QueryResult>> {
        Ok(self.find(options)?.first())
    }

    fn latest_options(options: &FindOptions) -> FindOptions {
        let mut options = options.clone();
        let legacy = options.effective_legacy();
        options.latest().legacy(legacy);

        options
    }

    fn latest_property(&self, options: &FindOptions, property: &str) -> Result<Option<String>> {
        let mut options = Self::latest_options(options);
        options.property(property);

        Ok(match self.find_first(&options)? {
            Some(QueryResult::Property(value)) => Some(value),
            _ => None,
        })
    }

    /// Get the latest installed version of Visual Studio.
    ///
    /// Legacy products are considered unless `options` set products or
    /// requirements or explicitly disable legacy.
    pub fn get_latest(&self, options: &FindOptions) -> Result<Option<VsInstance>> {
        let options = Self::latest_options(options);

        Ok(match self.find_first(&options)? {
            Some(QueryResult::Instance(instance)) => Some(instance),
            _ => None,
        })
    }

    /// Get the installation path of the latest installed version of Visual Studio.
    pub fn get_latest_path(&self, options: &FindOptions) -> Result<Option<PathBuf>> {
        Ok(self
            .latest_property(options, "installationPath")?
            .map(PathBuf::from))
    }

    /// Get the version string of the latest installed version of Visual Studio.
    ///
    /// This is the full version for Visual Studio 2017 and newer, e.g.
    /// `15.8.28010.2003`, and only the major version with a zero minor for older
    /// products, e.g. `14.0`.
    pub fn get_latest_version(&self, options: &FindOptions) -> Result<Option<String>> {
        self.latest_property(options, "installationVersion")
    }

    /// Get the major version of the latest installed version of Visual Studio.
    ///
    /// Returns 0 if no installations could be found.
    pub fn get_latest_major_version(&self, options: &FindOptions) -> Result<u32> {
        match self.get_latest_version(options)? {
            Some(version) => {
                let major = version
                    .parse::<crate::version::InstallationVersion>()?
                    .major();

                u32::try_from(major).map_err(|_| VsWhereError::VersionParse(version))
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_property_output() -> Result<()> {
        let output = parse_output(
            &args(&["-property", "installationPath"]),
            b"C:\\VS\\2022\\Community\r\nC:\\VS\\2019\\BuildTools\r\n",
        )?;

        assert_eq!(
            output,
            QueryOutput::Properties(vec![
                r"C:\VS\2022\Community".to_string(),
                r"C:\VS\2019\BuildTools".to_string()
            ])
        );

        assert_eq!(
            parse_output(&args(&["-property", "x"]), b"")?,
            QueryOutput::Properties(vec![])
        );

        Ok(())
    }

    #[test]
    fn parse_instance_output() -> Result<()> {
        let output = parse_output(
            &args(&["-latest"]),
            br#"[{"instanceId": "VisualStudio.14.0", "installationPath": "C:\\VS14\\", "installationVersion": "14.0"}]"#,
        )?;

        match output.first() {
            Some(QueryResult::Instance(instance)) => {
                assert_eq!(instance.instance_id, "VisualStudio.14.0");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(parse_output(&args(&[]), b"[]")?.is_empty());
        assert!(parse_output(&args(&[]), b"")?.is_empty());
        assert!(parse_output(&args(&[]), "\u{feff}[]".as_bytes())?.is_empty());

        Ok(())
    }

    #[test]
    fn parse_find_output() -> Result<()> {
        let output = parse_output(
            &args(&["-find", "**\\cl.exe"]),
            br#"["C:\\VS\\VC\\Tools\\MSVC\\14.34.31933\\bin\\Hostx64\\x64\\cl.exe"]"#,
        )?;

        assert_eq!(
            output,
            QueryOutput::Files(vec![PathBuf::from(
                r"C:\VS\VC\Tools\MSVC\14.34.31933\bin\Hostx64\x64\cl.exe"
            )])
        );

        Ok(())
    }

    #[test]
    fn switch_values_not_mistaken_for_switches() -> Result<()> {
        // A file pattern that looks like a switch is still a file pattern.
        assert_eq!(
            parse_output(&args(&["-find", "-property"]), br#"["C:\\VS\\x"]"#)?,
            QueryOutput::Files(vec![PathBuf::from(r"C:\VS\x")])
        );

        assert_eq!(
            parse_output(&args(&["/property", "installationPath"]), b"C:\\VS\r\n")?,
            QueryOutput::Properties(vec![r"C:\VS".to_string()])
        );
        assert_eq!(
            parse_output(&args(&["/Find", "*.exe"]), b"[]")?,
            QueryOutput::Files(vec![])
        );

        assert!(has_switch(&args(&["-products", "*", "-PROPERTY", "x"]), "property"));
        assert!(!has_switch(&args(&["-path", "-property"]), "property"));

        Ok(())
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            parse_output(&args(&[]), b"not json"),
            Err(VsWhereError::JsonParse(_))
        ));
        assert!(matches!(
            parse_output(&args(&[]), &[0xff, 0xfe, 0x00]),
            Err(VsWhereError::Utf8(_))
        ));
    }

    #[test]
    fn missing_vswhere() {
        let vswhere = VsWhere::new(
            VsWhereConfig::default()
                .cache_dir(crate::testutil::DEFAULT_TEMP_DIR.path().join("query_missing"))
                .allow_download(false),
        );

        if crate::locate::default_install_paths()
            .iter()
            .all(|p| !p.exists())
        {
            assert!(matches!(
                vswhere.find(&FindOptions::new()),
                Err(VsWhereError::NotFound)
            ));
        }
    }

    #[test]
    fn invalid_options_rejected_before_running() {
        // Validation happens before the executable is resolved.
        let vswhere = VsWhere::new(VsWhereConfig::default().allow_download(false));
        let mut options = FindOptions::new();
        options.legacy(true).product("*");

        assert!(matches!(
            vswhere.find(&options),
            Err(VsWhereError::InvalidOption(_))
        ));
    }

    #[cfg(unix)]
    mod fake_vswhere {
        use {super::*, crate::testutil::fake_vswhere};

        #[test]
        fn execute_passes_utf8_and_format() -> Result<()> {
            let (vswhere, log) = fake_vswhere("execute_args", "[]", 0)?;

            vswhere.find(FindOptions::new().latest().product("*"))?;

            assert_eq!(
                std::fs::read_to_string(&log)?.trim(),
                "-utf8 -latest -products * -format json"
            );

            Ok(())
        }

        #[test]
        fn property_omits_format() -> Result<()> {
            let (vswhere, log) = fake_vswhere("property_args", "C:\\VS\n", 0)?;

            let values = vswhere.find_properties(&FindOptions::new(), "installationPath")?;
            assert_eq!(values, vec![r"C:\VS".to_string()]);

            assert_eq!(
                std::fs::read_to_string(&log)?.trim(),
                "-utf8 -property installationPath"
            );

            Ok(())
        }

        #[test]
        fn nonzero_exit_is_process_failure() -> Result<()> {
            let (vswhere, _) = fake_vswhere("failure", "", 87)?;

            match vswhere.find(&FindOptions::new()) {
                Err(VsWhereError::ProcessFailed { stderr, .. }) => {
                    assert!(stderr.contains("fake vswhere failure"));
                }
                other => panic!("unexpected result: {:?}", other),
            }

            Ok(())
        }

        #[test]
        fn latest_helpers() -> Result<()> {
            let (vswhere, log) = fake_vswhere("latest_version", "17.4.33110.190\n", 0)?;

            assert_eq!(
                vswhere.get_latest_version(&FindOptions::new())?.as_deref(),
                Some("17.4.33110.190")
            );
            assert_eq!(
                std::fs::read_to_string(&log)?.trim(),
                "-utf8 -latest -legacy -property installationVersion"
            );

            assert_eq!(
                vswhere.get_latest_major_version(FindOptions::new().product("*"))?,
                17
            );
            assert_eq!(
                std::fs::read_to_string(&log)?.trim(),
                "-utf8 -latest -products * -property installationVersion"
            );

            Ok(())
        }

        #[test]
        fn latest_instance() -> Result<()> {
            let (vswhere, log) = fake_vswhere(
                "latest_instance",
                r#"[{"instanceId": "VisualStudio.14.0", "installationPath": "C:\\VS14\\", "installationVersion": "14.0"}]"#,
                0,
            )?;

            let instance = vswhere
                .get_latest(&FindOptions::new())?
                .expect("instance returned");
            assert_eq!(instance.instance_id, "VisualStudio.14.0");
            assert!(instance.is_legacy());

            assert_eq!(
                std::fs::read_to_string(&log)?.trim(),
                "-utf8 -latest -legacy -format json"
            );

            Ok(())
        }

        #[test]
        fn find_files_parses_paths() -> Result<()> {
            let (vswhere, log) = fake_vswhere(
                "find_files",
                r#"["C:\\VS\\MSBuild\\Current\\Bin\\MSBuild.exe"]"#,
                0,
            )?;

            let files =
                vswhere.find_files(FindOptions::new().latest(), "MSBuild/**/Bin/MSBuild.exe")?;
            assert_eq!(
                files,
                vec![PathBuf::from(r"C:\VS\MSBuild\Current\Bin\MSBuild.exe")]
            );

            assert_eq!(
                std::fs::read_to_string(&log)?.trim(),
                "-utf8 -find MSBuild/**/Bin/MSBuild.exe -latest -format json"
            );

            Ok(())
        }

        #[test]
        fn major_version_out_of_range() -> Result<()> {
            let (vswhere, _) = fake_vswhere("major_overflow", "5000000000.0\n", 0)?;

            assert!(matches!(
                vswhere.get_latest_major_version(&FindOptions::new()),
                Err(VsWhereError::VersionParse(_))
            ));

            Ok(())
        }

        #[test]
        fn latest_none_when_empty() -> Result<()> {
            let (vswhere, _) = fake_vswhere("latest_empty", "", 0)?;

            assert_eq!(vswhere.get_latest_path(&FindOptions::new())?, None);
            assert_eq!(vswhere.get_latest_version(&FindOptions::new())?, None);
            assert_eq!(vswhere.get_latest_major_version(&FindOptions::new())?, 0);

            Ok(())
        }
    }
}
