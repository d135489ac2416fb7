// src/logfile/mod.rs
pub mod decode;
pub mod parser;

pub use decode::{decode, read_log, DecodedText};
pub use parser::{parse_line, LineFormat, LineRecord, LogParser, ParseReport};
