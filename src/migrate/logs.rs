use tracing::{debug, debug_span, error, info, warn};

use super::Report;
use crate::error::{Error, Result};
use crate::storage::{ObjectStore, object_key};
use crate::store::row::{self, Lookup};
use crate::store::SqliteStore;
use crate::types::{Log, LogV0, StepV0};

/// Progress is logged once per this many steps on the object storage path.
pub const LOG_PROGRESS_INTERVAL: usize = 1000;

const STEP_IMPORT_QUERY: &str = "
SELECT procs.*
FROM procs
INNER JOIN builds ON procs.proc_build_id = builds.build_id
INNER JOIN repos ON builds.build_repo_id = repos.repo_id
WHERE procs.proc_ppid != 0
  AND repos.repo_user_id > 0
  AND builds.build_id > ?1
ORDER BY procs.proc_id ASC
";

const LOG_QUERY: &str = "SELECT * FROM logs WHERE log_job_id = ?1";

fn load_steps(source: &SqliteStore, after_build: i64) -> Result<Vec<StepV0>> {
    row::query_all(&source.connection(), STEP_IMPORT_QUERY, [after_build])
}

/// Fetches the log body of a step. Missing or unreadable logs are skipped.
fn load_log(source: &SqliteStore, step: &StepV0) -> Option<LogV0> {
    match row::query_one::<LogV0, _>(&source.connection(), LOG_QUERY, [step.id]) {
        Ok(Lookup::Found(log)) => Some(log),
        Ok(Lookup::NotFound) => {
            debug!("no logs for step {}", step.id);
            None
        }
        Err(e) => {
            warn!("cannot find logs for step {}: {e}", step.id);
            None
        }
    }
}

/// Migrates step logs into the target `logs` table, for builds after
/// `after_build`. Logs already present in the target are left alone.
pub fn migrate_logs(
    source: &SqliteStore,
    target: &SqliteStore,
    after_build: i64,
) -> Result<Report> {
    if std::ptr::eq(source, target) {
        return Err(Error::Config(
            "source and target must be different stores".to_string(),
        ));
    }

    let steps = load_steps(source, after_build)?;

    info!("migrating {} logs", steps.len());

    let report = target.transaction(|tx| {
        let mut report = Report::new(steps.len());

        for step in &steps {
            let span = debug_span!("step", id = step.id, build = step.build_id);
            let _enter = span.enter();

            let Some(log) = load_log(source, step) else {
                report.skipped += 1;
                continue;
            };

            if row::find_by_id::<Log>(tx, log.proc_id)?.is_found() {
                debug!("logs already migrated");
                report.skipped += 1;
                continue;
            }

            let record = Log {
                id: log.proc_id,
                data: log.data,
            };
            row::insert(tx, &record).inspect_err(|e| error!("migration failed: {e}"))?;
            report.inserted += 1;
        }

        Ok(report)
    })?;

    info!("migration complete");
    Ok(report)
}

/// Uploads step logs to object storage under `/<prefix>/<step-id>`.
///
/// Each upload stands alone: a failed upload is collected and the remaining
/// steps are still processed.
pub fn migrate_logs_to_object_storage(
    source: &SqliteStore,
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    after_build: i64,
) -> Result<Report> {
    let steps = load_steps(source, after_build)?;

    info!("migrating {} logs", steps.len());

    let mut report = Report::new(steps.len());

    for (i, step) in steps.iter().enumerate() {
        let span = debug_span!("step", id = step.id, build = step.build_id);
        let _enter = span.enter();

        let Some(log) = load_log(source, step) else {
            report.skipped += 1;
            continue;
        };
        if log.data.is_empty() {
            warn!("skipping empty logs for step {}", step.id);
            report.skipped += 1;
            continue;
        }

        debug!("uploading logs for step {}", step.id);

        let key = object_key(prefix, log.proc_id);
        match store.put(bucket, &key, &log.data, true) {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                error!("upload of {key} failed: {e}");
                report.failures.push(format!("step {}", step.id), e.into());
            }
        }

        if i % LOG_PROGRESS_INTERVAL == 0 {
            info!("uploaded: {}", step.id);
        }
    }

    info!("migration complete");
    Ok(report)
}
