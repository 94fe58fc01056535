// Colored terminal output for frequency lists, matrices and models.
//
// main.rs prints stage progress itself and delegates anything tabular here.

use colored::Colorize;

use crate::matrix::TypeTokenMatrix;
use crate::pipeline::model::ModelSummary;
use crate::vocab::Vocab;

/// Display a frequency list's size and its most frequent items.
pub fn display_vocab(title: &str, vocab: &Vocab, top: usize) {
    println!(
        "\n{}",
        format!("=== {title} ({} types, {} tokens) ===", vocab.len(), vocab.total()).bold()
    );
    for (i, (item, freq)) in vocab.items_by_freq().into_iter().take(top).enumerate() {
        println!("  {:>4}. {:<30} {:>10}", i + 1, item, freq);
    }
}

/// Display a matrix's shape, density and the first few rows.
pub fn display_matrix(title: &str, matrix: &TypeTokenMatrix, preview_rows: usize) {
    let (rows, cols) = matrix.shape();
    let nnz = matrix.nnz();
    let density = if rows * cols > 0 {
        nnz as f64 / (rows * cols) as f64
    } else {
        0.0
    };

    println!("\n{}", format!("=== {title} ===").bold());
    println!("  Shape:    {rows} x {cols}");
    println!("  Non-zero: {nnz} ({:.4}% dense)", density * 100.0);

    for r in 0..rows.min(preview_rows) {
        let mut entries: Vec<(&str, f64)> = matrix
            .row_entries(r)
            .map(|(c, v)| (matrix.col_items()[c].as_str(), v))
            .collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let preview = entries
            .iter()
            .take(6)
            .map(|(c, v)| format!("{c}:{v:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "  {:<32} {}",
            super::truncate_chars(&matrix.row_items()[r], 30),
            super::truncate_chars(&preview, 90).dimmed()
        );
    }
    if rows > preview_rows {
        println!("  {}", format!("... {} more rows", rows - preview_rows).dimmed());
    }
}

/// Display candidate spellings per lemma.
pub fn display_candidates(candidates: &[(String, Vec<(String, u64)>)]) {
    for (lemma, forms) in candidates {
        println!(
            "\n{}",
            format!("=== Candidates for {lemma} ({} forms) ===", forms.len()).bold()
        );
        if forms.is_empty() {
            println!("  {}", "none found".yellow());
            continue;
        }
        for (form, freq) in forms {
            println!("  {:<30} {:>8}", form, freq);
        }
    }
    println!(
        "\n{}",
        "Check these by hand and put the confirmed forms in the variants file.".dimmed()
    );
}

/// Display the summary of a finished model.
pub fn display_model_summary(summary: &ModelSummary) {
    println!(
        "\n{}",
        format!("=== Token-level model, period {} ===", summary.period).bold()
    );
    println!(
        "  Tokens:                  {} sampled of {} found",
        summary.tokens_sampled, summary.tokens_found
    );
    let without = if summary.tokens_without_context > 0 {
        summary.tokens_without_context.to_string().yellow()
    } else {
        summary.tokens_without_context.to_string().green()
    };
    println!("  Without context words:   {without}");
    println!("  First-order context:     {} words", summary.first_order_context_words);
    println!("  Second-order dimensions: {}", summary.second_order_dimensions);
    println!(
        "  Measure / metric:        {} / {} ({} composition)",
        summary.options.measure, summary.options.metric, summary.options.composition
    );
    if !summary.outputs.is_empty() {
        println!("\n  Written:");
        for path in &summary.outputs {
            println!("    {}", path.display().to_string().dimmed());
        }
    }
}
