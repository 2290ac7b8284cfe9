pub mod cache;
pub mod error;
pub mod grouping;
pub mod params;
pub mod raw_table;
pub mod table_reader;
pub mod types;
