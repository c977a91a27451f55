pub mod args;
pub mod load_data;
pub mod runner;
