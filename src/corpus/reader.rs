// Line-based corpus reader.
//
// Corpus files hold one token per line. A line is a token when it matches the
// line regex; a line matching the separator regex ends the current sentence;
// anything else (headers, markup) is skipped. The end of a file always ends a
// sentence, so no context window ever spans two files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex_lite::Regex;
use tracing::{debug, warn};

use super::format::ItemFormat;
use crate::config::Config;

/// One token read from a corpus file.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusToken {
    /// The item this token instantiates (rendered from the type format)
    pub type_item: String,
    /// The item this token contributes as context (rendered from the colloc format)
    pub colloc_item: String,
    /// 1-based line number in its file
    pub line: usize,
}

/// Tokens between two sentence boundaries.
pub type Sentence = Vec<CorpusToken>;

/// Reads corpus files according to the configured line layout.
pub struct CorpusReader {
    corpus_path: PathBuf,
    line_machine: Regex,
    separator: Option<Regex>,
    type_format: ItemFormat,
    colloc_format: ItemFormat,
    lowercase: bool,
}

impl CorpusReader {
    pub fn from_config(config: &Config) -> Result<Self> {
        let line_machine = Regex::new(&config.line_machine)
            .with_context(|| format!("Invalid DIASEM_LINE_MACHINE {:?}", config.line_machine))?;
        let separator = config
            .separator_line_machine
            .as_deref()
            .map(|s| {
                Regex::new(s).with_context(|| format!("Invalid DIASEM_SEPARATOR_LINE_MACHINE {s:?}"))
            })
            .transpose()?;
        let type_format = ItemFormat::parse(&config.type_format, &line_machine)
            .context("DIASEM_TYPE_FORMAT")?;
        let colloc_format = ItemFormat::parse(&config.colloc_format, &line_machine)
            .context("DIASEM_COLLOC_FORMAT")?;

        Ok(Self {
            corpus_path: config.corpus_path.clone(),
            line_machine,
            separator,
            type_format,
            colloc_format,
            lowercase: config.lowercase,
        })
    }

    /// Parse already-loaded file contents into sentences.
    pub fn parse_text(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut current = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if self.separator.as_ref().is_some_and(|sep| sep.is_match(line)) {
                if !current.is_empty() {
                    sentences.push(std::mem::take(&mut current));
                }
                continue;
            }
            if let Some(caps) = self.line_machine.captures(line) {
                let mut type_item = self.type_format.render(&caps);
                let mut colloc_item = self.colloc_format.render(&caps);
                if self.lowercase {
                    type_item = type_item.to_lowercase();
                    colloc_item = colloc_item.to_lowercase();
                }
                current.push(CorpusToken {
                    type_item,
                    colloc_item,
                    line: i + 1,
                });
            }
        }
        if !current.is_empty() {
            sentences.push(current);
        }
        sentences
    }

    /// Read one corpus file, relative to the corpus directory.
    pub fn read_file(&self, fname: &str) -> Result<Vec<Sentence>> {
        let path = self.corpus_path.join(fname);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), "Corpus file is not valid UTF-8, replacing bad bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        let sentences = self.parse_text(&text);
        debug!(file = fname, sentences = sentences.len(), "Read corpus file");
        Ok(sentences)
    }

    /// Run `visit` over every sentence of every file, with a progress bar.
    ///
    /// `visit` receives the file id (the file name without extension) and the sentence.
    pub fn for_each_sentence<F>(&self, fnames: &[String], label: &str, mut visit: F) -> Result<()>
    where
        F: FnMut(&str, &[CorpusToken]),
    {
        let pb = ProgressBar::new(fnames.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!("  {label} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})"))?,
        );

        for fname in fnames {
            let fid = file_id(fname);
            for sentence in self.read_file(fname)? {
                visit(&fid, &sentence);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }
}

/// The id used for a corpus file in token ids: its name without directories or extension.
pub fn file_id(fname: &str) -> String {
    Path::new(fname)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fname.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> CorpusReader {
        CorpusReader::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_parse_text_splits_sentences() {
        let text = "<doc id=\"1\">\nDe\tDET\tde\nstad\tNOU\tstad\n</s>\nVernielt\tVRB\tvernielen\n</doc>\n";
        let sentences = reader().parse_text(text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].len(), 2);
        assert_eq!(sentences[0][0].type_item, "de");
        assert_eq!(sentences[0][1].line, 3);
        // Lowercased by default
        assert_eq!(sentences[1][0].type_item, "vernielt");
        assert_eq!(sentences[1][0].line, 5);
    }

    #[test]
    fn test_invalid_line_machine() {
        let config = Config {
            line_machine: "(".to_string(),
            ..Config::default()
        };
        assert!(CorpusReader::from_config(&config).is_err());
    }

    #[test]
    fn test_file_id_strips_extension() {
        assert_eq!(file_id("sub/brief_1650.conll"), "brief_1650");
        assert_eq!(file_id("plain"), "plain");
    }
}
