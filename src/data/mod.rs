pub mod deviation;
pub mod loader;
pub mod models;
pub mod parser;
pub mod table;
pub mod utils;
