// Corpus access — filename lists per subcorpus and the line-based reader.

pub mod fnames;
pub mod format;
pub mod reader;
