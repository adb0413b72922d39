//! `corral`: a community package registry client for rolling-release
//! distributions (C10 CLI entry point).
use std::collections::HashSet;
use std::env;
use std::sync::Mutex;

use log::LevelFilter;
use serde::Deserialize;

use corral::aggregate::aggregate;
use corral::config::Config;
use corral::localdb::AlpmLocalDb;
use corral::pool::run as run_pool;
use corral::registry::QueryKind;
use corral::render::{render_custom_format, render_info, render_search};
use corral::shell::{ColorConfig, MultiShell, Verbosity};
use corral::task::{Task, WorkList};
use corral::{flags_from_args, handle_error, human, version, CliError, CliResult};

const USAGE: &str = "
corral: a command-line client for the community package registry.

Usage:
    corral (-s|--search) [options] <target>...
    corral (-i|--info)... [options] <target>...
    corral (-d|--download)... [options] <target>...
    corral (-m|--msearch) [options] <target>...
    corral -u [-d] [options]
    corral -h | --version

Options:
    -s, --search               search for packages by name/description
    -i, --info                 show package details (repeat for extended info)
    -d, --download             download and extract a package's source
    -m, --msearch               list packages maintained by <target>
    -u                          check installed foreign packages for updates
    -f, --force                 overwrite an existing download destination
    --ignore PKG                comma-separated package names to ignore when checking updates
    --ignorerepo REPO           comma-separated binary repo names to skip when registering sync DBs
    --nossl                     use plain HTTP instead of HTTPS
    -t, --target DIR            download destination directory
    --threads N                 worker pool size
    --timeout N                 per-request timeout, in seconds
    -b, --brief                 brief, machine-parsable per-target markers
    -c, --color WHEN            auto, always, or never [default: auto]
    --debug                     enable debug-level logging
    --format STR                custom output template (see docs)
    -o, --ignore-ood            drop out-of-date records before aggregation
    --no-ignore-ood             keep out-of-date records
    --listdelim STR             delimiter used between custom-format list items
    -q, --quiet                 only the essentials
    -v, --verbose                full cause chains on error
    -h, --help                  show this screen
    -V, --version                show version information
";

#[derive(Debug, Deserialize)]
struct Flags {
    flag_search: bool,
    flag_info: u32,
    flag_download: u32,
    flag_msearch: bool,
    #[serde(rename = "flag_u")]
    flag_update: bool,
    flag_force: bool,
    flag_ignore: Option<String>,
    flag_ignorerepo: Option<String>,
    flag_nossl: bool,
    flag_target: Option<String>,
    flag_threads: Option<usize>,
    flag_timeout: Option<u64>,
    flag_brief: bool,
    flag_color: String,
    flag_debug: bool,
    flag_format: Option<String>,
    flag_ignore_ood: bool,
    flag_no_ignore_ood: bool,
    flag_listdelim: Option<String>,
    flag_quiet: bool,
    flag_verbose: bool,
    flag_version: bool,
    arg_target: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default()).init();

    let args: Vec<String> = env::args().collect();
    let result = flags_from_args::<Flags>(USAGE, &args).and_then(run);

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let mut shell = MultiShell::new(Verbosity::Normal, ColorConfig::Auto);
            handle_error(e, &mut shell);
        }
    }
}

fn run(flags: Flags) -> CliResult<i32> {
    if flags.flag_version {
        println!("{}", version());
        return Ok(2);
    }

    let verbosity = if flags.flag_quiet {
        Verbosity::Quiet
    } else if flags.flag_verbose || flags.flag_debug {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    let color: ColorConfig = flags
        .flag_color
        .parse()
        .map_err(|e: Box<dyn corral::CorralError>| CliError::new(e, 1))?;
    let shell = Mutex::new(MultiShell::new(verbosity, color));

    if flags.flag_debug {
        log::set_max_level(LevelFilter::Debug);
    }

    let op_count = [flags.flag_search, flags.flag_info > 0, flags.flag_download > 0, flags.flag_msearch, flags.flag_update]
        .iter()
        .filter(|&&b| b)
        .count();
    if op_count > 1 && !(flags.flag_update && flags.flag_download > 0) {
        return Err(CliError::new(human("only one operation may be given at a time"), 2));
    }
    if op_count == 0 {
        return Err(CliError::new(human("no operation specified; see --help"), 3));
    }

    let mut config = Config::load().map_err(|e| CliError::new(e, 1))?;
    if flags.flag_nossl {
        config.secure = false;
    }
    if let Some(threads) = flags.flag_threads {
        config.max_threads = threads;
    }
    if let Some(timeout) = flags.flag_timeout {
        config.timeout_secs = timeout;
    }
    if flags.flag_force {
        config.force = true;
    }
    if flags.flag_download > 1 {
        config.get_deps = true;
    }
    if flags.flag_info > 1 {
        config.extended_info = true;
    }
    if flags.flag_ignore_ood {
        config.ignore_out_of_date = true;
    }
    if flags.flag_no_ignore_ood {
        config.ignore_out_of_date = false;
    }
    if let Some(delim) = flags.flag_listdelim {
        config.list_delim = delim;
    }
    config.format = flags.flag_format;
    if let Some(value) = &flags.flag_ignore {
        config.ignore_pkgs.extend(value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string));
    }
    if let Some(value) = &flags.flag_ignorerepo {
        config.ignore_repos.extend(value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string));
    }
    if let Some(target_dir) = &flags.flag_target {
        config.resolve_target_dir(target_dir).map_err(|e| CliError::new(e, 1))?;
    }

    std::env::set_current_dir(&config.target_dir)
        .map_err(|e| CliError::new(human(format!("cannot enter target directory: {}", e)), 1))?;

    let synced = config.load_synced_dbs().map_err(|e| CliError::new(e, 1))?;
    let local_db = AlpmLocalDb::new("/", "/var/lib/pacman/", &synced).map_err(|e| CliError::new(e, 1))?;

    let update_alone = flags.flag_update && flags.flag_download == 0;

    let (task, targets) = if flags.flag_update {
        (
            Task::Update { also_download: flags.flag_download > 0 },
            local_db.list_foreign().map_err(|e| CliError::new(e, 1))?,
        )
    } else if flags.flag_search {
        (Task::Query(QueryKind::Search), dedup_preserve_order(&flags.arg_target))
    } else if flags.flag_msearch {
        (Task::Query(QueryKind::Msearch), dedup_preserve_order(&flags.arg_target))
    } else if flags.flag_download > 0 {
        (Task::Download, dedup_preserve_order(&flags.arg_target))
    } else {
        (Task::Query(QueryKind::Info), dedup_preserve_order(&flags.arg_target))
    };

    let work_list = WorkList::new(targets);
    let partials = run_pool(task, work_list, &local_db, &config, &shell).map_err(|e| CliError::new(e, 1))?;

    let search_targets: &[String] = if flags.flag_search { &flags.arg_target } else { &[] };
    let mut records = aggregate(partials, search_targets);
    if config.ignore_out_of_date {
        records.retain(|r| !r.out_of_date);
    }

    render(&records, &flags, &config, &local_db)?;

    let aggregated_empty = records.is_empty();
    let nonzero = aggregated_empty ^ update_alone;
    Ok(if nonzero { 1 } else { 0 })
}

fn render(records: &[corral::package::PackageRecord], flags: &Flags, config: &Config, local_db: &dyn corral::localdb::LocalDb) -> CliResult<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let width = term_width();

    for record in records {
        let installed = local_db
            .installed(&record.name)
            .map_err(|e| CliError::new(e, 1))?
            .map(|(_, version)| version);

        if let Some(format) = &config.format {
            let line = render_custom_format(record, format, &config.list_delim);
            print!("{}", line);
        } else if flags.flag_search || flags.flag_msearch {
            render_search(record, flags.flag_quiet, installed.as_deref(), &mut handle).map_err(|e| CliError::new(e, 1))?;
        } else {
            render_info(record, width, installed.as_deref(), &mut handle).map_err(|e| CliError::new(e, 1))?;
        }
    }

    Ok(())
}

fn term_width() -> usize {
    80
}

fn dedup_preserve_order(targets: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    targets
        .iter()
        .filter(|t| seen.insert((*t).clone()))
        .cloned()
        .collect()
}
