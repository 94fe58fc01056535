// Composition tests — running the stages end to end on a tiny corpus.
//
// These tests exercise the data flow between modules:
//   corpus files -> frequency lists -> co-occurrence matrices -> token model
// with everything written under a scratch directory in the system temp dir.

use std::path::PathBuf;

use diasem::config::Config;
use diasem::corpus::fnames::FileLists;
use diasem::corpus::reader::CorpusReader;
use diasem::count::tokens::token_type;
use diasem::matrix::TypeTokenMatrix;
use diasem::pipeline::model::{self, ModelInputs, ModelOptions, ModelSummary};
use diasem::pipeline::{candidates, colloc, freq};
use diasem::variants::VariantSet;
use diasem::vocab::Vocab;

const SENTENCES_16: &[&str] = &[
    "de vijand vernielt de stad met vuur",
    "het vuur vernielt de kerk",
    "de soldaten vernielden de muren van de stad",
    "de storm vernielt het dak van de kerk",
    "de raad wil het verdrag vernietigen",
];

const SENTENCES_17: &[&str] = &[
    "de koning vernietigt het verdrag met de stad",
    "de rechter vernietigd het vonnis",
    "de vijand vernielt de muren met vuur",
    "het hof vernietigt het vonnis van de raad",
    "de soldaten vernielen het dak",
    "de raad vernietigt het oude verdrag",
];

/// One token per line (`word<TAB>pos<TAB>lemma`), `</s>` after each sentence.
fn corpus_text(sentences: &[&str]) -> String {
    let mut text = String::from("<doc>\n");
    for sentence in sentences {
        for word in sentence.split_whitespace() {
            text.push_str(&format!("{word}\tX\t{word}\n"));
        }
        text.push_str("</s>\n");
    }
    text.push_str("</doc>\n");
    text
}

fn variant_count(sentences: &[&str]) -> usize {
    let set = VariantSet::default();
    sentences
        .iter()
        .flat_map(|s| s.split_whitespace())
        .filter(|w| set.lemma_of(w).is_some())
        .count()
}

/// Write the corpus and filename lists, and return a config pointing at them.
fn setup(name: &str) -> (Config, PathBuf) {
    let root = std::env::temp_dir().join(format!("diasem-comp-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    let corpus = root.join("corpus");
    std::fs::create_dir_all(&corpus).unwrap();
    std::fs::write(corpus.join("brief_1550.txt"), corpus_text(SENTENCES_16)).unwrap();
    std::fs::write(corpus.join("kroniek_1650.txt"), corpus_text(SENTENCES_17)).unwrap();

    let config = Config {
        corpus_path: corpus,
        output_path: root.join("output"),
        periods: vec!["16".to_string(), "17".to_string()],
        windows: vec![2, 4],
        foc_window: 4,
        soc_window: 2,
        token_span: 4,
        sample_size: 5,
        foc_min_freq: 1,
        assoc_cutoff: 0.0,
        soc_skip: 0,
        soc_take: 100,
        ..Config::default()
    };

    let fdir = config.filenames_dir();
    std::fs::create_dir_all(&fdir).unwrap();
    std::fs::write(fdir.join("fnames_16.txt"), "brief_1550.txt\n").unwrap();
    std::fs::write(fdir.join("fnames_17.txt"), "kroniek_1650.txt\n").unwrap();

    (config, root)
}

fn build_inputs(config: &Config) -> (CorpusReader, FileLists) {
    config.require_corpus().unwrap();
    let reader = CorpusReader::from_config(config).unwrap();
    let lists = FileLists::load(config).unwrap();
    freq::run(config, &reader, &lists).unwrap();
    colloc::run(config, &reader, &lists).unwrap();
    (reader, lists)
}

// ============================================================
// Frequency lists and co-occurrence matrices
// ============================================================

#[test]
fn merged_period_frequencies_are_sums_of_parts() {
    let (config, root) = setup("freq");
    build_inputs(&config);

    let v16 = Vocab::load(&config.freqlist_path("16")).unwrap();
    let v17 = Vocab::load(&config.freqlist_path("17")).unwrap();
    let merged = Vocab::load(&config.freqlist_path("1617")).unwrap();

    assert_eq!(v16.get("vernielt"), Some(3));
    assert_eq!(
        merged.get("de").unwrap(),
        v16.get("de").unwrap() + v17.get("de").unwrap()
    );
    assert_eq!(merged.total(), v16.total() + v17.total());
    // Markup lines are not tokens
    assert!(!merged.contains("<doc>"));
    assert!(!merged.contains("</s>"));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn cooccurrence_is_symmetric_and_stays_within_sentences() {
    let (config, root) = setup("colloc");
    build_inputs(&config);

    // Only the merged period is modelled
    assert!(config.freq_matrix_path("1617", 2).exists());
    assert!(config.freq_matrix_path("1617", 4).exists());
    assert!(!config.freq_matrix_path("16", 2).exists());

    let m = colloc::load(&config, "1617", 2).unwrap();
    assert_eq!(m.get("vernielt", "vijand"), m.get("vijand", "vernielt"));
    assert_eq!(m.get("vuur", "vernielt"), m.get("vernielt", "vuur"));
    // "vonnis" ends a sentence and "de" starts the next: never in one window
    assert_eq!(m.get("vonnis", "vijand"), 0.0);

    let wide = colloc::load(&config, "1617", 4).unwrap();
    assert!(wide.total() > m.total());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn missing_inputs_point_to_the_stage_to_run() {
    let (config, root) = setup("missing");
    let err = freq::load(&config, "1617").unwrap_err().to_string();
    assert!(err.contains("diasem freq"));
    let err = colloc::load(&config, "1617", 10).unwrap_err().to_string();
    assert!(err.contains("diasem colloc"));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn candidates_worklist_lists_prefixed_forms() {
    let (config, root) = setup("candidates");
    build_inputs(&config);

    let set = VariantSet::default();
    let found = candidates::run(&config, &set, "1617").unwrap();
    assert_eq!(found.len(), 2);
    let forms: Vec<&str> = found[0].1.iter().map(|(f, _)| f.as_str()).collect();
    assert_eq!(forms[0], "vernielt");
    assert!(forms.contains(&"vernielden"));

    let text = std::fs::read_to_string(config.candidates_path()).unwrap();
    assert!(text.lines().any(|l| l == "vernietigt"));

    let _ = std::fs::remove_dir_all(&root);
}

// ============================================================
// Token-level model
// ============================================================

#[test]
fn model_run_writes_consistent_outputs() {
    let (config, root) = setup("model");
    let (reader, lists) = build_inputs(&config);
    let set = VariantSet::default();
    let options = ModelOptions::from_config(&config);

    let summary =
        model::run(&config, &reader, lists.get("1617").unwrap(), &set, &options).unwrap();

    let found = variant_count(SENTENCES_16) + variant_count(SENTENCES_17);
    assert_eq!(summary.tokens_found, found);
    assert_eq!(summary.tokens_sampled, options.sample_size);
    assert!(summary.first_order_context_words > 0);

    let dir = config.token_level_dir();
    let dists = TypeTokenMatrix::load(&dir.join("tokdists1617.ttmx.pac")).unwrap();
    assert_eq!(dists.shape(), (options.sample_size, options.sample_size));
    for a in dists.row_items() {
        assert_eq!(dists.get(a, a), 0.0);
        assert!(set.lemma_of(token_type(a)).is_some());
        for b in dists.row_items() {
            assert_eq!(dists.get(a, b), dists.get(b, a));
        }
    }

    let vectors = TypeTokenMatrix::load(&dir.join("tokvecs1617.ttmx.ppmi.pac")).unwrap();
    assert_eq!(vectors.row_items(), dists.row_items());

    let cws = std::fs::read_to_string(dir.join("cws_model1617.tsv")).unwrap();
    let mut lines = cws.lines();
    assert_eq!(lines.next(), Some("tokid\tcws"));
    assert_eq!(lines.count(), options.sample_size);

    let json = std::fs::read_to_string(model::summary_path(&config, "1617")).unwrap();
    let saved: ModelSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(saved.tokens_found, summary.tokens_found);
    assert_eq!(saved.outputs.len(), 6);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn same_seed_gives_same_model() {
    let (config, root) = setup("seed");
    let (reader, lists) = build_inputs(&config);
    let set = VariantSet::default();
    let options = ModelOptions::from_config(&config);
    let fnames = lists.get("1617").unwrap();

    let inputs = ModelInputs::load(&config, "1617").unwrap();
    let a = model::build(&inputs, &reader, fnames, &set, &options).unwrap();
    let b = model::build(&inputs, &reader, fnames, &set, &options).unwrap();
    assert_eq!(a.token_distances, b.token_distances);
    assert_eq!(a.weights.row_items(), b.weights.row_items());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn lemma_rows_are_shared_by_all_variants() {
    let (config, root) = setup("lemma");
    let (reader, lists) = build_inputs(&config);
    let set = VariantSet::default();
    let options = ModelOptions::from_config(&config);

    let inputs = ModelInputs::load(&config, "1617").unwrap();
    let built = model::build(&inputs, &reader, lists.get("1617").unwrap(), &set, &options).unwrap();

    let lemma_freq = &built.lemma_freq;
    let a = lemma_freq.row_position("vernielt").unwrap();
    let b = lemma_freq.row_position("vernielen").unwrap();
    assert_eq!(lemma_freq.dense_row(a), lemma_freq.dense_row(b));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn model_without_variants_fails() {
    let (config, root) = setup("novariants");
    let (reader, lists) = build_inputs(&config);
    let set: VariantSet = serde_json::from_str(
        r#"{"lemmas": [{"lemma": "verwoesten", "variants": ["verwoest"]}]}"#,
    )
    .unwrap();
    let options = ModelOptions::from_config(&config);

    let result = model::run(&config, &reader, lists.get("1617").unwrap(), &set, &options);
    assert!(result.is_err());

    let _ = std::fs::remove_dir_all(&root);
}
