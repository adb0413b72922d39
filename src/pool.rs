//! Worker pool (C7): a bounded set of OS threads draining a shared work
//! list, each owning its own HTTP session. Scoped threads let each worker
//! borrow the shared `Config`/`LocalDb`/`MultiShell` without `Arc`, and
//! guarantee every worker has joined before the scope returns.
use std::sync::Mutex;

use crate::config::Config;
use crate::localdb::LocalDb;
use crate::package::PackageRecord;
use crate::registry::RegistrySession;
use crate::shell::MultiShell;
use crate::task::{task_download_into, task_query, task_update, Task, WorkList};
use crate::util::CorralResult;

/// Run `task` against every target in `work_list`, fanning out across
/// `min(len(targets), max_threads)` workers (§4.7). The worklist may grow
/// during execution (dependency discovery from `task_download`); a worker
/// that observes an empty list exits immediately rather than waiting for
/// peers, matching the source's best-effort (not exhaustive) dependency
/// resolution trade-off.
pub fn run(
    task: Task,
    work_list: WorkList,
    local_db: &dyn LocalDb,
    config: &Config,
    shell: &Mutex<MultiShell>,
) -> CorralResult<Vec<Vec<PackageRecord>>> {
    let worker_count = work_list.len().min(config.max_threads.max(1));
    let results: Mutex<Vec<Vec<PackageRecord>>> = Mutex::new(Vec::new());

    crossbeam::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|_| {
                let partial = run_worker(task, &work_list, local_db, config, shell);
                results.lock().unwrap().push(partial);
            });
        }
    })
    .expect("worker thread panicked");

    Ok(results.into_inner().unwrap())
}

fn run_worker(
    task: Task,
    work_list: &WorkList,
    local_db: &dyn LocalDb,
    config: &Config,
    shell: &Mutex<MultiShell>,
) -> Vec<PackageRecord> {
    let mut session = match RegistrySession::new(config.host.clone(), config.secure, config.timeout_secs, config.extended_info) {
        Ok(session) => session,
        Err(e) => {
            shell.lock().unwrap().brief_error("<worker>", &e);
            return Vec::new();
        }
    };

    let mut partial = Vec::new();
    while let Some(target) = work_list.pop() {
        let outcome = match task {
            Task::Query(kind) => task_query(&mut session, kind, &target),
            Task::Update { also_download } => {
                let mut shell_guard = shell.lock().unwrap();
                task_update(&mut session, local_db, config, also_download, &target, &mut shell_guard)
            }
            Task::Download => {
                let mut shell_guard = shell.lock().unwrap();
                task_download_into(&mut session, local_db, config, &target, &mut shell_guard, Some(work_list))
            }
        };

        match outcome {
            Ok(records) => partial.extend(records),
            Err(e) => shell.lock().unwrap().brief_error(&target, &e),
        }
    }
    partial
}
