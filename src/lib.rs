// diasem: token-level distributional models of spelling variants across
// historical subcorpora.
//
// This is the library root. Each module corresponds to a stage or a data
// structure of the modelling pipeline.

pub mod assoc;
pub mod config;
pub mod corpus;
pub mod count;
pub mod matrix;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod token_level;
pub mod variants;
pub mod vocab;
