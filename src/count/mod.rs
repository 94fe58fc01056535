// Counting over the corpus: frequency lists, co-occurrence matrices and
// token retrieval. All three walk the corpus sentence by sentence through
// CorpusReader.

pub mod col_freq;
pub mod item_freq;
pub mod tokens;
