pub mod align;
pub mod classify;
pub mod config;
pub mod download;
pub mod export;
pub mod extract;
pub mod filter;
pub mod normalize;
pub mod run;
pub mod tools;
pub mod tree;
