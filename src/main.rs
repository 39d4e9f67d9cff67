use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use pdf_redaction::config::job::JobFile;
use pdf_redaction::config::merged::MergedConfig;
use pdf_redaction::config::{self};
use pdf_redaction::pipeline::job_runner::JobConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: pdf_redaction <jobs.yaml>...");
        eprintln!("  Redact PDF files as described by YAML job files.");
        eprintln!("  settings.yaml next to a job file is picked up automatically.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_redaction {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut job_configs: Vec<JobConfig> = Vec::new();

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = match MergedConfig::new(&settings, job) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("ERROR: {job_file_arg}: {e}");
                    return ExitCode::FAILURE;
                }
            };

            job_configs.push(JobConfig {
                input_paths: job
                    .input
                    .paths()
                    .into_iter()
                    .map(|p| resolve_path(&job_dir, p))
                    .collect(),
                output_path: resolve_path(&job_dir, &job.output),
                pages: job.pages.clone(),
                patterns: job.patterns.clone(),
                boxes: job.boxes.clone(),
                merged,
            });
        }
    }

    run(&job_configs)
}

#[cfg(feature = "pdfium")]
fn run(job_configs: &[JobConfig]) -> ExitCode {
    use pdf_redaction::pipeline::orchestrator::run_all_jobs;

    let results = run_all_jobs(job_configs);

    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(job_result) => {
                eprintln!(
                    "OK: {} -> {} ({} pages, {} masks)",
                    display_inputs(&job_result.input_paths),
                    job_result.output_path.display(),
                    job_result.pages_exported,
                    job_result.masks
                );
                if let Some(report) = &job_result.detection {
                    for page in report.failed_pages() {
                        eprintln!(
                            "WARN: detection skipped page {}: {}",
                            page.page,
                            page.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    display_inputs(&job_configs[i].input_paths),
                    job_configs[i].output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(not(feature = "pdfium"))]
fn run(_job_configs: &[JobConfig]) -> ExitCode {
    eprintln!("ERROR: built without the `pdfium` feature; no page renderer available");
    ExitCode::FAILURE
}

#[cfg_attr(not(feature = "pdfium"), allow(dead_code))]
fn display_inputs(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
