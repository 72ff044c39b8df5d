pub mod cli;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod harvest;
pub mod sources;
pub mod storage;
