pub mod bulk_job;
