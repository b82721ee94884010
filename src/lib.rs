pub mod api_connection;
pub mod catalogue;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod customize;
pub mod data_types;
pub mod fallback;
pub mod normalizer;
pub mod plan_generator;
pub mod plan_session;
pub mod shopping_list;
