pub mod apis;
pub mod arguments;
pub mod broadcast;
pub mod bundles;
pub mod config;
pub mod errors;
pub mod logger;
pub mod paths;
pub mod pipeline;
pub mod pricing;
pub mod run;
pub mod services;
pub mod storage;
pub mod tokens;
pub mod users;
#[cfg(feature = "web")]
pub mod webserver;
