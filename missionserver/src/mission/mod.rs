pub mod generator;
pub mod rollback;
pub mod submission;
pub mod task_name;
