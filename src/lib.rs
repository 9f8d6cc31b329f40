pub mod actions;
pub mod cli;
pub mod config_file_manager;
pub mod db_manager;
pub mod seed_generator;
