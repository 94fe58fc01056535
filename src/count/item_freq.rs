use anyhow::Result;
use tracing::info;

use crate::corpus::reader::CorpusReader;
use crate::vocab::Vocab;

/// Count every type item in the given corpus files.
pub fn build_item_freq(reader: &CorpusReader, fnames: &[String]) -> Result<Vocab> {
    let mut vocab = Vocab::default();
    reader.for_each_sentence(fnames, "Counting", |_, sentence| {
        for token in sentence {
            vocab.increment(&token.type_item, 1);
        }
    })?;

    info!(
        files = fnames.len(),
        types = vocab.len(),
        tokens = vocab.total(),
        "Built frequency list"
    );
    Ok(vocab)
}
