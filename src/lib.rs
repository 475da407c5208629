pub mod argsets;
pub mod command;
pub mod config;
pub mod constants;
pub mod export;
pub mod helpers;
pub mod portal;
pub mod pvoutput;
pub mod storage;
