// The modelling pipeline, one module per stage. Each stage reads what the
// previous one saved under the output directory, so stages can be rerun on
// their own.

pub mod candidates;
pub mod colloc;
pub mod freq;
pub mod model;
