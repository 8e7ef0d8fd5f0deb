pub mod conf;
pub mod my_log;
