pub mod job_runner;
#[cfg(feature = "pdfium")]
pub mod orchestrator;
