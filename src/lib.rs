pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod tree;
pub mod vault;
