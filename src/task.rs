//! Task set (C6): the three units of work a pool worker runs against a
//! single target.
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::archive::{extract, pkgbuild_path};
use crate::config::Config;
use crate::localdb::LocalDb;
use crate::package::PackageRecord;
use crate::recipe::parse_recipe;
use crate::registry::{QueryKind, RegistrySession};
use crate::search::registry_prefilter;
use crate::shell::MultiShell;
use crate::util::{human, read, CorralResult};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Task {
    Query(QueryKind),
    Update { also_download: bool },
    Download,
}

/// Shared, mutex-guarded target queue (§4.7/§5). Workers pop the head and
/// `task_download` may append newly discovered dependency names.
pub struct WorkList {
    inner: Mutex<VecDeque<String>>,
    seen: Mutex<HashSet<String>>,
}

impl WorkList {
    pub fn new(targets: Vec<String>) -> Self {
        let seen = targets.iter().cloned().collect();
        WorkList {
            inner: Mutex::new(targets.into_iter().collect()),
            seen: Mutex::new(seen),
        }
    }

    /// Number of targets queued right now (§4.7: used to size the pool
    /// against the initial target count before any worker starts popping).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn pop(&self) -> Option<String> {
        self.inner.lock().unwrap().pop_front()
    }

    /// Appends `name` only if it has never been queued before. Returns
    /// `true` if it was newly added.
    pub fn push_new(&self, name: String) -> bool {
        let mut seen = self.seen.lock().unwrap();
        if seen.contains(&name) {
            return false;
        }
        seen.insert(name.clone());
        self.inner.lock().unwrap().push_back(name);
        true
    }
}

/// `task_query`: invoke C1 with the op-mask's kind. A `search` target is
/// first narrowed to the substring the registry's RPC will actually accept
/// (§4.9); a target with no such substring never reaches the network.
pub fn task_query(
    session: &mut RegistrySession,
    kind: QueryKind,
    target: &str,
) -> CorralResult<Vec<PackageRecord>> {
    if kind == QueryKind::Search {
        let narrowed = registry_prefilter(target)
            .ok_or_else(|| human(format!("{}: search target too short or has no usable substring", target)))?;
        return session.query(kind, narrowed);
    }
    session.query(kind, target)
}

/// `task_update`: compare the registry's version against what's
/// installed, emitting a record only when the remote is strictly newer
/// and the target isn't ignored.
pub fn task_update(
    session: &mut RegistrySession,
    local_db: &dyn LocalDb,
    config: &Config,
    also_download: bool,
    target: &str,
    shell: &mut MultiShell,
) -> CorralResult<Vec<PackageRecord>> {
    let records = task_query(session, QueryKind::Info, target)?;
    let Some(record) = records.into_iter().next() else {
        return Ok(Vec::new());
    };

    let Some((_, local_version)) = local_db.installed(target)? else {
        shell.warn(format!("{} is not installed", target))?;
        return Ok(Vec::new());
    };

    if local_db.vercmp(&record.version, &local_version) != std::cmp::Ordering::Greater {
        return Ok(Vec::new());
    }

    if config.ignore_pkgs.contains(target) {
        shell.warn(format!("{}: ignoring package upgrade ({} => {})", target, local_version, record.version))?;
        return Ok(Vec::new());
    }

    if also_download {
        return task_download(session, local_db, config, target, shell);
    }

    shell.status("update", format!("{} {} -> {}", target, local_version, record.version))?;
    Ok(vec![record])
}

/// `task_download`: fetch, extract, and (when `getDeps` is set) recurse
/// into declared dependencies via the shared work list.
#[allow(clippy::too_many_arguments)]
pub fn task_download(
    session: &mut RegistrySession,
    local_db: &dyn LocalDb,
    config: &Config,
    target: &str,
    shell: &mut MultiShell,
) -> CorralResult<Vec<PackageRecord>> {
    task_download_into(session, local_db, config, target, shell, None)
}

pub fn task_download_into(
    session: &mut RegistrySession,
    local_db: &dyn LocalDb,
    config: &Config,
    target: &str,
    shell: &mut MultiShell,
    work_list: Option<&WorkList>,
) -> CorralResult<Vec<PackageRecord>> {
    if let Some(repo) = local_db.satisfied_by(target)? {
        shell.warn(format!("{} is available in binary repo `{}`", target, repo))?;
        return Ok(Vec::new());
    }

    let records = task_query(session, QueryKind::Info, target)?;
    let Some(record) = records.into_iter().next() else {
        return Ok(Vec::new());
    };

    let dest = std::path::Path::new(target);
    if dest.exists() && !config.force {
        return Err(human(format!("{}: directory exists (use --force to overwrite)", target)));
    }

    let bytes = session.download(&record.url_path)?;
    let mut warnings = Vec::new();
    let top_level_dir = extract(bytes.as_slice(), &mut |msg| warnings.push(msg))?;
    for msg in warnings {
        shell.warn(msg)?;
    }
    shell.status("downloaded", &top_level_dir)?;

    if config.get_deps {
        if let Some(work_list) = work_list {
            let pkgbuild = pkgbuild_path(&top_level_dir);
            if let Ok(body) = read(&pkgbuild) {
                let fields = parse_recipe(&body);
                for dep in fields.depends.iter().chain(fields.makedepends.iter()) {
                    let name = strip_version_constraint(dep);
                    if local_db.installed(name)?.is_some() {
                        continue;
                    }
                    if let Some(repo) = local_db.satisfied_by(name)? {
                        shell.warn(format!("{} is available in binary repo `{}`", name, repo))?;
                        continue;
                    }
                    work_list.push_new(name.to_string());
                }
            }
        }
    }

    Ok(vec![record])
}

/// Strip trailing `<`, `>`, `=` version constraints from a dependency
/// string (e.g. `glibc>=2.30` → `glibc`).
fn strip_version_constraint(dep: &str) -> &str {
    dep.split(['<', '>', '=']).next().unwrap_or(dep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_version_constraints() {
        assert_eq!(strip_version_constraint("glibc>=2.30"), "glibc");
        assert_eq!(strip_version_constraint("zlib=1.2.11"), "zlib");
        assert_eq!(strip_version_constraint("cmake"), "cmake");
    }

    #[test]
    fn work_list_dedupes_pushes() {
        let list = WorkList::new(vec!["a".to_string()]);
        assert!(!list.push_new("a".to_string()));
        assert!(list.push_new("b".to_string()));
        assert!(!list.push_new("b".to_string()));
    }
}
