pub mod merge;
pub mod reader;
pub mod writer;
