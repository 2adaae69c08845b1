pub mod batch;
pub mod config;
pub mod history;
pub mod report;
pub mod routes;
pub mod sentiment;
pub mod session;
pub mod shutdown;
