pub mod assistant;
pub mod server;
pub mod storage;
