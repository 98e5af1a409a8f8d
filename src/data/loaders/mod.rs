// mod.rs - File loaders

pub mod tsv;

pub use tsv::{load_call_table, parse_call, LoadOptions};
