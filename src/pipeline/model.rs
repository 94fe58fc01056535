// Stage 4: the token-level model of one subcorpus.
//
// Steps, in order:
//   1. retrieve all tokens of the variants and draw a reproducible sample
//   2. first-order frequencies: variant rows x frequent word forms, summed
//      per lemma and copied back to every variant
//   3. weight the lemma rows with an association measure against the full
//      corpus marginals, keep context words of the sample above the cut-off
//   4. token weights: each token's context words weighted by that matrix
//   5. second-order matrix: association between the context words and the
//      mid-frequency word forms (skip the most frequent, take the next N)
//   6. token vectors = token weights x second-order matrix
//   7. token distances, and the context words each token ended up with

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assoc::{compute_association, Measure};
use crate::config::Config;
use crate::corpus::reader::CorpusReader;
use crate::count::tokens::{retrieve_tokens, sample_tokens};
use crate::matrix::{Axis, TypeTokenMatrix};
use crate::token_level::cws::{list_cws, write_cws_tsv};
use crate::token_level::distance::{compute_distance, Metric};
use crate::token_level::vectors::{compute_token_vectors, Composition};
use crate::token_level::weights::compute_token_weights;
use crate::variants::{expand, LemmaMarginal, VariantSet};
use crate::vocab::Vocab;

use super::{colloc, freq};

/// Tunable parts of a model run. Defaults come from the configuration;
/// the CLI can override some of them per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions {
    pub period: String,
    pub token_span: usize,
    pub sample_size: usize,
    pub seed: u64,
    pub foc_min_freq: u64,
    pub assoc_cutoff: f64,
    pub soc_skip: usize,
    pub soc_take: usize,
    pub word_pattern: Option<String>,
    pub measure: Measure,
    #[serde(default)]
    pub lemma_marginal: LemmaMarginal,
    pub metric: Metric,
    pub composition: Composition,
}

impl ModelOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            period: config.model_period.clone(),
            token_span: config.token_span,
            sample_size: config.sample_size,
            seed: config.seed,
            foc_min_freq: config.foc_min_freq,
            assoc_cutoff: config.assoc_cutoff,
            soc_skip: config.soc_skip,
            soc_take: config.soc_take,
            word_pattern: config.word_pattern.clone(),
            measure: config.measure,
            lemma_marginal: config.lemma_marginal,
            metric: config.metric,
            composition: Composition::default(),
        }
    }
}

/// The saved inputs a model is built from.
pub struct ModelInputs {
    /// Frequency list of the period
    pub vocab: Vocab,
    /// Co-occurrence matrix with the first-order window
    pub foc_freq: TypeTokenMatrix,
    /// Co-occurrence matrix with the second-order window
    pub soc_freq: TypeTokenMatrix,
}

impl ModelInputs {
    pub fn load(config: &Config, period: &str) -> Result<Self> {
        Ok(Self {
            vocab: freq::load(config, period)?,
            foc_freq: colloc::load(config, period, config.foc_window)?,
            soc_freq: colloc::load(config, period, config.soc_window)?,
        })
    }
}

/// Counts describing a finished model, saved next to it as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub period: String,
    pub created_at: DateTime<Utc>,
    pub tokens_found: usize,
    pub tokens_sampled: usize,
    pub tokens_without_context: usize,
    pub first_order_context_words: usize,
    pub second_order_dimensions: usize,
    pub options: ModelOptions,
    pub outputs: Vec<PathBuf>,
}

/// Everything a model run produces.
pub struct Model {
    /// Variants x first-order context words, lemma-level frequencies
    pub lemma_freq: TypeTokenMatrix,
    /// Variants x context words, association after the cut-off
    pub weighter: TypeTokenMatrix,
    /// Tokens x context words with a second-order vector
    pub weights: TypeTokenMatrix,
    /// Context words x second-order dimensions
    pub soc: TypeTokenMatrix,
    pub token_vectors: TypeTokenMatrix,
    pub token_distances: TypeTokenMatrix,
    pub summary: ModelSummary,
}

/// Build the token-level model from loaded inputs.
pub fn build(
    inputs: &ModelInputs,
    reader: &CorpusReader,
    fnames: &[String],
    set: &VariantSet,
    options: &ModelOptions,
) -> Result<Model> {
    let word_re = options
        .word_pattern
        .as_deref()
        .map(|p| Regex::new(p).with_context(|| format!("Invalid word pattern {p:?}")))
        .transpose()?;
    let queries = set.queries_flat();

    // 1. Tokens
    let query = inputs.vocab.subvocab(&queries);
    if query.is_empty() {
        anyhow::bail!(
            "None of the {} variants occur in period {}",
            queries.len(),
            options.period
        );
    }
    info!(forms = query.len(), occurrences = query.total(), "Variants found in frequency list");
    let all_tokens = retrieve_tokens(reader, fnames, &query, options.token_span)?;
    let tokens_found = all_tokens.shape().0;
    let tokens = sample_tokens(&all_tokens, options.sample_size, options.seed);

    // 2. Lemma-level first-order frequencies
    let focs: Vec<String> = word_forms(&inputs.vocab, word_re.as_ref())
        .filter_freq(options.foc_min_freq)
        .item_list();
    let foc_freq = inputs
        .foc_freq
        .submatrix(Some(queries.as_slice()), Some(focs.as_slice()));
    let collapsed = set.collapse(&foc_freq);
    let lemma_freq = expand(&collapsed)?;

    // 3. Association with the full-corpus marginals
    let nfreq = inputs.foc_freq.row_sums();
    let cfreq = inputs.foc_freq.col_sums();
    let total: f64 = nfreq.values().sum();
    let lemma_nfreq = set.lemma_marginals(&nfreq, options.lemma_marginal);
    let associated = collapsed
        .iter()
        .map(|row| row.associate(&lemma_nfreq, &cfreq, total, options.measure))
        .collect::<Result<Vec<_>>>()?;
    let cutoff = options.assoc_cutoff;
    let weighter = expand(&associated)?
        .submatrix(None, Some(tokens.col_items()))
        .retain_values(|v| v > cutoff)
        .drop_empty(Axis::Col);
    info!(
        context_words = weighter.shape().1,
        cutoff, "Selected first-order context words"
    );

    // 4. Token weights
    let tokens_sub = tokens.submatrix(None, Some(weighter.col_items()));
    let weights = compute_token_weights(&tokens_sub, &weighter)?;

    // 5. Second-order matrix
    let soc_items = word_forms(&inputs.vocab, word_re.as_ref())
        .slice(options.soc_skip, options.soc_take)
        .item_list();
    let soc_freq = inputs
        .soc_freq
        .submatrix(Some(soc_items.as_slice()), Some(soc_items.as_slice()));
    let soc_assoc = compute_association(
        &soc_freq,
        &soc_freq.row_sums(),
        &soc_freq.col_sums(),
        options.measure,
    )?;
    let soc = soc_assoc
        .submatrix(Some(weights.col_items()), None)
        .drop_empty(Axis::Col);

    // 6. Token vectors, from context words that have a second-order vector
    let weights = weights.submatrix(None, Some(soc.row_items()));
    let token_vectors = compute_token_vectors(&weights, &soc, options.composition)?;

    // 7. Distances
    let token_distances = compute_distance(&token_vectors, options.metric)?;

    let tokens_without_context = (0..weights.shape().0)
        .filter(|&r| weights.row_entries(r).next().is_none())
        .count();

    let summary = ModelSummary {
        period: options.period.clone(),
        created_at: Utc::now(),
        tokens_found,
        tokens_sampled: weights.shape().0,
        tokens_without_context,
        first_order_context_words: weights.shape().1,
        second_order_dimensions: soc.shape().1,
        options: options.clone(),
        outputs: Vec::new(),
    };

    Ok(Model {
        lemma_freq,
        weighter,
        weights,
        soc,
        token_vectors,
        token_distances,
        summary,
    })
}

fn word_forms(vocab: &Vocab, pattern: Option<&Regex>) -> Vocab {
    match pattern {
        Some(re) => vocab.filter_items(re),
        None => vocab.filter_word_forms(),
    }
}

/// Load the period's inputs, build its model and save every output under `token-level/`.
pub fn run(
    config: &Config,
    reader: &CorpusReader,
    fnames: &[String],
    set: &VariantSet,
    options: &ModelOptions,
) -> Result<ModelSummary> {
    let inputs = ModelInputs::load(config, &options.period)?;
    let mut model = build(&inputs, reader, fnames, set, options)?;
    let outputs = save(config, &mut model)?;
    info!(period = options.period.as_str(), files = outputs.len(), "Saved token-level model");
    Ok(model.summary)
}

/// Write a model's matrices, context words and summary. Returns the paths written.
pub fn save(config: &Config, model: &mut Model) -> Result<Vec<PathBuf>> {
    let dir = config.token_level_dir();
    let p = model.summary.period.clone();
    let mut outputs = Vec::new();

    let lemma_freq_path = dir.join(format!("lemmafreq{p}.wcmx.pac"));
    model.lemma_freq.save(&lemma_freq_path)?;
    outputs.push(lemma_freq_path);

    let weights_path = dir.join(format!("tokweights{p}.ttmx.pac"));
    model.weights.save(&weights_path)?;
    outputs.push(weights_path);

    let vectors_path = dir.join(format!("tokvecs{p}.ttmx.{}.pac", model.summary.options.measure));
    model.token_vectors.save(&vectors_path)?;
    outputs.push(vectors_path);

    let dists_path = dir.join(format!("tokdists{p}.ttmx.pac"));
    model.token_distances.save(&dists_path)?;
    outputs.push(dists_path);

    let dists_tsv = dir.join(format!("tokdists{p}.tsv"));
    model.token_distances.write_tsv(&dists_tsv)?;
    outputs.push(dists_tsv);

    let cws_path = dir.join(format!("cws_model{p}.tsv"));
    write_cws_tsv(&list_cws(&model.weights), &cws_path)?;
    outputs.push(cws_path);

    let summary_path = summary_path(config, &p);
    model.summary.outputs = outputs.clone();
    let json = serde_json::to_string_pretty(&model.summary)?;
    std::fs::write(&summary_path, json)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;
    outputs.push(summary_path);

    Ok(outputs)
}

/// Where the JSON summary of a period's model is saved.
pub fn summary_path(config: &Config, period: &str) -> PathBuf {
    config.token_level_dir().join(format!("model{period}.json"))
}
