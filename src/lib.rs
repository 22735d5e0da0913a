pub mod add;
pub mod error;
pub mod init;
pub mod models;
pub mod queue;
pub mod review;
pub mod session;
pub mod sm2;
pub mod stats;
pub mod store;
mod utils;
