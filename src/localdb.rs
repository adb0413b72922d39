//! Local-DB adapter (C5): everything the task set needs to know about
//! what's already installed and what the distro's binary repos can
//! satisfy, backed by `alpm` and the distro's own `pacmanconf`-parsed
//! `/etc/pacman.conf` — the same crates real Rust AUR helpers (e.g. `paru`)
//! use for this, rather than shelling out to `pacman`.
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Mutex;

use alpm::{Alpm, SigLevel};

use crate::util::{human, CorralResult};

pub trait LocalDb {
    /// Packages present locally but provided by no registered synced DB.
    fn list_foreign(&self) -> CorralResult<Vec<String>>;
    /// Installed `(name, version)`, if any.
    fn installed(&self, name: &str) -> CorralResult<Option<(String, String)>>;
    /// First synced DB name that satisfies `dep`.
    fn satisfied_by(&self, dep: &str) -> CorralResult<Option<String>>;
    fn vercmp(&self, a: &str, b: &str) -> Ordering;
}

pub struct AlpmLocalDb {
    handle: Alpm,
    /// `alpm`'s database handle is not guaranteed thread-safe for lookups
    /// (§4.5); `satisfied_by` is the one call made concurrently by pool
    /// workers, so it alone takes this lock.
    satisfied_lock: Mutex<()>,
}

/// Synced (binary) repo names to register, and the union of `IgnorePkg`
/// entries gathered from the distro config and the client's own config
/// file.
#[derive(Clone, Debug, Default)]
pub struct SyncedDbConfig {
    pub names: Vec<String>,
    pub ignore_pkgs: HashSet<String>,
}

impl AlpmLocalDb {
    pub fn new(root: &str, dbpath: &str, synced: &SyncedDbConfig) -> CorralResult<Self> {
        let handle = Alpm::new(root, dbpath)
            .map_err(|e| human(format!("failed to open local package database: {}", e)))?;
        for name in &synced.names {
            handle
                .register_syncdb(name.as_str(), SigLevel::USE_DEFAULT)
                .map_err(|e| human(format!("failed to register sync db `{}`: {}", name, e)))?;
        }
        Ok(AlpmLocalDb {
            handle,
            satisfied_lock: Mutex::new(()),
        })
    }
}

impl LocalDb for AlpmLocalDb {
    fn list_foreign(&self) -> CorralResult<Vec<String>> {
        let synced_names: HashSet<String> = self
            .handle
            .syncdbs()
            .into_iter()
            .flat_map(|db| db.pkgs().into_iter().map(|pkg| pkg.name().to_string()))
            .collect();

        Ok(self
            .handle
            .localdb()
            .pkgs()
            .into_iter()
            .map(|pkg| pkg.name().to_string())
            .filter(|name| !synced_names.contains(name))
            .collect())
    }

    fn installed(&self, name: &str) -> CorralResult<Option<(String, String)>> {
        match self.handle.localdb().pkg(name) {
            Ok(pkg) => Ok(Some((pkg.name().to_string(), pkg.version().to_string()))),
            Err(_) => Ok(None),
        }
    }

    fn satisfied_by(&self, dep: &str) -> CorralResult<Option<String>> {
        let _guard = self.satisfied_lock.lock().unwrap();
        for db in self.handle.syncdbs() {
            if db.pkgs().find_satisfier(dep).is_some() {
                return Ok(Some(db.name().to_string()));
            }
        }
        Ok(None)
    }

    fn vercmp(&self, a: &str, b: &str) -> Ordering {
        alpm::vercmp(a, b)
    }
}

/// Read `/etc/pacman.conf` for synced-DB names and `IgnorePkg` entries
/// (§4.5/§4.13). `skip_repos` or a name present in `ignore_repos` drops
/// that repo from registration entirely; its `IgnorePkg` entries, if any,
/// are still folded into the result since they apply regardless of
/// whether the repo itself is queried.
pub fn load_synced_db_config(
    skip_repos: bool,
    ignore_repos: &HashSet<String>,
) -> CorralResult<SyncedDbConfig> {
    let conf = pacmanconf::Config::new()
        .map_err(|e| human(format!("failed to read distro package manager config: {}", e)))?;

    let mut ignore_pkgs: HashSet<String> = conf.ignore_pkg.iter().cloned().collect();
    let mut names = Vec::new();

    for repo in &conf.repos {
        ignore_pkgs.extend(repo.ignore_pkg.iter().cloned());
        if skip_repos || ignore_repos.contains(&repo.name) {
            continue;
        }
        names.push(repo.name.clone());
    }

    Ok(SyncedDbConfig { names, ignore_pkgs })
}
