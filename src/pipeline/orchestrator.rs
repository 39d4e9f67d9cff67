// Phase 12: 全ジョブ実行

use tracing::{info, info_span, warn};

use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};

/// ジョブを順に実行する。失敗したジョブはログに出して続行する。
pub fn run_all_jobs(jobs: &[JobConfig]) -> Vec<crate::error::Result<JobResult>> {
    let results: Vec<_> = jobs
        .iter()
        .enumerate()
        .map(|(i, job)| {
            let _span = info_span!("job", index = i, output = %job.output_path.display()).entered();
            let result = run_job(job);
            if let Err(e) = &result {
                warn!(error = %e, "job failed");
            }
            result
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(jobs = jobs.len(), failed, "batch finished");
    results
}
