pub mod user_config;
