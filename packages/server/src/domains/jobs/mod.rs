// Jobs domain - the asynchronous bulk generation subsystem
//
// Admission validates and prices a request, reserves credits, and persists a
// queued job. The worker claims queued jobs one at a time (global FIFO) and
// runs the processor for the job's kind. Failures refund the reserved cost.

pub mod admission;
pub mod mapper;
pub mod models;
pub mod processors;
pub mod prompts;
pub mod worker;

pub use admission::{submit_job, AdmissionError, CreateJobRequest, SettingsInput};
pub use mapper::{map_bulk_job, map_bulk_jobs, BulkJobView};
pub use models::bulk_job::{BulkJob, GenerationSettings, ImageScope, JobConfig, JobKind, JobStatus};
pub use worker::{BulkJobWorker, BulkJobWorkerConfig};
