pub mod config_io;
pub mod git;
pub mod project_io;
pub mod scanner;
