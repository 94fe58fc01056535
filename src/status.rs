// Pipeline status display — which artifacts exist under the output directory.

use std::path::Path;

use colored::Colorize;

use crate::config::Config;
use crate::pipeline::model::summary_path;

/// Display which stage outputs exist, with their sizes.
pub fn show(config: &Config) {
    println!("Output directory: {}", config.output_path.display());
    if !config.output_path.exists() {
        println!("\nNothing built yet. Run `diasem run` to build everything.");
        return;
    }

    println!("\n{}", "Frequency lists:".bold());
    for period in config.all_periods() {
        show_file(&format!("period {period}"), &config.freqlist_path(&period));
    }

    println!("\n{}", "Co-occurrence matrices:".bold());
    for period in config.modelled_periods() {
        for &window in &config.windows {
            show_file(
                &format!("period {period}, window {window}"),
                &config.freq_matrix_path(&period, window),
            );
        }
    }

    println!("\n{}", "Candidate spellings:".bold());
    show_file("worklist", &config.candidates_path());

    println!("\n{}", "Token-level models:".bold());
    for period in config.modelled_periods() {
        show_file(&format!("period {period}"), &summary_path(config, &period));
    }
}

fn show_file(label: &str, path: &Path) {
    match std::fs::metadata(path) {
        Ok(meta) => println!("  {:<28} {}", label, format_bytes(meta.len()).green()),
        Err(_) => println!("  {:<28} {}", label, "missing".dimmed()),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
