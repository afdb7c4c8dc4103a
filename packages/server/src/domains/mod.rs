// Domain modules - business logic lives here, infrastructure in kernel

pub mod credits;
pub mod jobs;
