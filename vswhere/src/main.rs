// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::{anyhow, Context, Result},
    clap::{Arg, ArgAction, ArgMatches, Command},
    log::LevelFilter,
    std::path::PathBuf,
    vswhere::{
        download_path, download_vswhere_from, http::get_http_client, http::resolve_download_url,
        FindOptions, QueryResult, VsWhere, VsWhereConfig,
    },
};

const FIND_ABOUT: &str = "\
Find Visual Studio instances.

By default this prints the JSON records of instances vswhere finds. When
--property is given, the value of that property is printed for each
instance, one per line. When --find is given, matching file paths under the
installation directories are printed as a JSON array.

Products default to Community, Professional, and Enterprise. Use
`--products '*'` to search all installed products. See
https://aka.ms/vs/workloads for product, workload and component IDs.
";

const LOCATE_ABOUT: &str = "\
Print the path to vswhere.exe.

Lookup order is: the --vswhere-path argument (or VSWHERE_PATH), the copy
installed with Visual Studio, a previously downloaded copy. If none exist,
vswhere.exe is downloaded unless downloading is disabled.
";

const DOWNLOAD_ABOUT: &str = "\
Download vswhere.exe into the cache directory.

The latest GitHub release is used unless --download-mirror (or
VSWHERE_DOWNLOAD_MIRROR) is set. An existing cached copy is kept.
";

fn selection_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("products")
                .long("products")
                .action(ArgAction::Append)
                .num_args(1..)
                .value_name("ID")
                .help("Product IDs to find"),
        )
        .arg(
            Arg::new("requires")
                .long("requires")
                .action(ArgAction::Append)
                .num_args(1..)
                .value_name("ID")
                .help("Workload or component IDs required when finding instances"),
        )
        .arg(
            Arg::new("requires_any")
                .long("requires-any")
                .action(ArgAction::SetTrue)
                .help("Find instances with any one or more of the required IDs"),
        )
        .arg(
            Arg::new("prerelease")
                .long("prerelease")
                .action(ArgAction::SetTrue)
                .help("Also search prereleases"),
        )
        .arg(
            Arg::new("version_range")
                .long("version-range")
                .value_name("RANGE")
                .help("Version range of instances to find, e.g. [15.0,16.0)"),
        )
}

fn legacy_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("legacy")
                .long("legacy")
                .action(ArgAction::SetTrue)
                .conflicts_with("no_legacy")
                .help("Also search Visual Studio 2015 and older products"),
        )
        .arg(
            Arg::new("no_legacy")
                .long("no-legacy")
                .action(ArgAction::SetTrue)
                .help("Do not search Visual Studio 2015 and older products"),
        )
}

fn options_from_args(args: &ArgMatches) -> FindOptions {
    let mut options = FindOptions::new();

    if let Some(products) = args.get_many::<String>("products") {
        options.products(products);
    }
    if let Some(requires) = args.get_many::<String>("requires") {
        options.requires(requires);
    }
    if args.get_flag("requires_any") {
        options.requires_any();
    }
    if args.get_flag("prerelease") {
        options.prerelease();
    }
    if let Some(version) = args.get_one::<String>("version_range") {
        options.version(version);
    }
    if args.get_flag("legacy") {
        options.legacy(true);
    } else if args.get_flag("no_legacy") {
        options.legacy(false);
    }

    options
}

fn print_result(result: Option<QueryResult>) -> Result<()> {
    match result {
        Some(QueryResult::Instance(instance)) => {
            println!("{}", serde_json::to_string_pretty(&instance)?);
        }
        Some(QueryResult::Property(value)) => println!("{}", value),
        Some(QueryResult::File(path)) => println!("{}", path.display()),
        None => {}
    }

    Ok(())
}

fn command_find(vswhere: &VsWhere, args: &ArgMatches) -> Result<()> {
    let mut options = options_from_args(args);

    if let Some(pattern) = args.get_one::<String>("find") {
        options.find(pattern);
    }
    if args.get_flag("all") {
        options.all();
    }
    if args.get_flag("latest") {
        options.latest();
    }
    if let Some(path) = args.get_one::<PathBuf>("path") {
        options.path(path);
    }
    if let Some(property) = args.get_one::<String>("property") {
        options.property(property);
    }
    if args.get_flag("sort") {
        options.sort();
    }
    if args.get_flag("include_packages") {
        options.include_packages();
    }

    let output = vswhere.find(&options)?;

    if args.get_flag("first") {
        return print_result(output.first());
    }

    match &output {
        vswhere::QueryOutput::Properties(values) => {
            for value in values {
                println!("{}", value);
            }
        }
        _ => println!("{}", output.to_json_pretty()?),
    }

    Ok(())
}

fn command_latest(vswhere: &VsWhere, args: &ArgMatches) -> Result<()> {
    let instance = vswhere
        .get_latest(&options_from_args(args))?
        .ok_or_else(|| anyhow!("no Visual Studio installation found"))?;

    print_result(Some(QueryResult::Instance(instance)))
}

fn command_latest_path(vswhere: &VsWhere, args: &ArgMatches) -> Result<()> {
    let path = vswhere
        .get_latest_path(&options_from_args(args))?
        .ok_or_else(|| anyhow!("no Visual Studio installation found"))?;

    println!("{}", path.display());

    Ok(())
}

fn command_latest_version(vswhere: &VsWhere, args: &ArgMatches) -> Result<()> {
    let version = vswhere
        .get_latest_version(&options_from_args(args))?
        .ok_or_else(|| anyhow!("no Visual Studio installation found"))?;

    println!("{}", version);

    Ok(())
}

fn command_latest_major(vswhere: &VsWhere, args: &ArgMatches) -> Result<()> {
    println!(
        "{}",
        vswhere.get_latest_major_version(&options_from_args(args))?
    );

    Ok(())
}

fn command_locate(vswhere: &VsWhere) -> Result<()> {
    let path = vswhere.vswhere_path().context("locating vswhere.exe")?;
    println!("{}", path.display());

    Ok(())
}

fn command_download(config: &VsWhereConfig) -> Result<()> {
    let cached = download_path(config);

    let path = if cached.exists() {
        log::info!("using cached {}", cached.display());
        cached
    } else {
        let client = get_http_client()?;
        let url = resolve_download_url(&client, config.download_mirror.as_deref())
            .context("resolving vswhere download URL")?;

        download_vswhere_from(config, &client, &url).context("downloading vswhere.exe")?
    };
    println!("{}", path.display());

    Ok(())
}

fn config_from_args(matches: &ArgMatches) -> VsWhereConfig {
    let mut config = VsWhereConfig::from_env();

    if let Some(path) = matches.get_one::<PathBuf>("vswhere_path") {
        config.vswhere_path = Some(path.clone());
    }
    if let Some(url) = matches.get_one::<String>("download_mirror") {
        config.download_mirror = Some(url.clone());
    }
    if let Some(digest) = matches.get_one::<String>("download_sha256") {
        config.download_sha256 = Some(digest.to_lowercase());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("cache_dir") {
        config.cache_dir = dir.clone();
    }
    if matches.get_flag("no_download") {
        config.allow_download = false;
    }

    config
}

fn main_impl() -> Result<()> {
    let app = Command::new("rvswhere")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Locate Visual Studio installations using vswhere")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
        .arg(
            Arg::new("vswhere_path")
                .long("vswhere-path")
                .global(true)
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to vswhere.exe, overriding the copy installed with Visual Studio"),
        )
        .arg(
            Arg::new("download_mirror")
                .long("download-mirror")
                .global(true)
                .value_name("URL")
                .help("URL to download vswhere.exe from instead of the latest GitHub release"),
        )
        .arg(
            Arg::new("download_sha256")
                .long("download-sha256")
                .global(true)
                .value_name("DIGEST")
                .help("Expected SHA-256 of a downloaded vswhere.exe"),
        )
        .arg(
            Arg::new("cache_dir")
                .long("cache-dir")
                .global(true)
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory holding downloaded vswhere executables"),
        )
        .arg(
            Arg::new("no_download")
                .long("no-download")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Never download vswhere.exe"),
        );

    let app = app.subcommand(legacy_args(selection_args(
        Command::new("find")
            .about("Find Visual Studio instances")
            .long_about(FIND_ABOUT)
            .arg(
                Arg::new("find")
                    .long("find")
                    .value_name("PATTERN")
                    .help("Print file paths matching this glob pattern under installation paths"),
            )
            .arg(
                Arg::new("all")
                    .long("all")
                    .action(ArgAction::SetTrue)
                    .help("Find all instances even if they are incomplete and may not launch"),
            )
            .arg(
                Arg::new("latest")
                    .long("latest")
                    .action(ArgAction::SetTrue)
                    .help("Return only the newest version and last installed"),
            )
            .arg(
                Arg::new("path")
                    .long("path")
                    .value_name("PATH")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Get the instance for the given file path"),
            )
            .arg(
                Arg::new("property")
                    .long("property")
                    .value_name("NAME")
                    .help("Print the value of this property instead of instance details"),
            )
            .arg(
                Arg::new("sort")
                    .long("sort")
                    .action(ArgAction::SetTrue)
                    .help("Sort instances from newest version and last installed to oldest"),
            )
            .arg(
                Arg::new("include_packages")
                    .long("include-packages")
                    .action(ArgAction::SetTrue)
                    .help("Include package references in instance records"),
            )
            .arg(
                Arg::new("first")
                    .long("first")
                    .action(ArgAction::SetTrue)
                    .help("Print only the first result"),
            ),
    )));

    let app = app.subcommand(legacy_args(selection_args(
        Command::new("latest").about("Print the record of the latest Visual Studio instance"),
    )));
    let app = app.subcommand(legacy_args(selection_args(
        Command::new("latest-path")
            .about("Print the installation path of the latest Visual Studio instance"),
    )));
    let app = app.subcommand(legacy_args(selection_args(
        Command::new("latest-version")
            .about("Print the version of the latest Visual Studio instance"),
    )));
    let app = app.subcommand(legacy_args(selection_args(
        Command::new("latest-major").about(
            "Print the major version of the latest Visual Studio instance, or 0 if none",
        ),
    )));
    let app = app.subcommand(
        Command::new("locate")
            .about("Print the path to vswhere.exe")
            .long_about(LOCATE_ABOUT),
    );
    let app = app.subcommand(
        Command::new("download")
            .about("Download vswhere.exe into the cache directory")
            .long_about(DOWNLOAD_ABOUT),
    );

    let matches = app.get_matches();

    // Global arguments are propagated to the subcommand's matches.
    let (command, args) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("invalid sub-command"))?;

    let log_level = match args.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();

    let config = config_from_args(args);
    let vswhere = VsWhere::new(config.clone());

    match command {
        "find" => command_find(&vswhere, args),
        "latest" => command_latest(&vswhere, args),
        "latest-path" => command_latest_path(&vswhere, args),
        "latest-version" => command_latest_version(&vswhere, args),
        "latest-major" => command_latest_major(&vswhere, args),
        "locate" => command_locate(&vswhere),
        "download" => command_download(&config),
        _ => Err(anyhow!("invalid sub-command")),
    }
}

fn main() {
    let exit_code = match main_impl() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };

    std::process::exit(exit_code)
}
