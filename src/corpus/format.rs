// Item templates such as `{word}` or `{lemma}/{pos}`.
//
// A template is compiled once against the line regex so that a placeholder
// naming a group the regex does not have is reported at startup instead of
// silently producing empty items.

use anyhow::Result;
use regex_lite::{Captures, Regex};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Group(String),
}

/// A compiled item template.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFormat {
    segments: Vec<Segment>,
}

impl ItemFormat {
    /// Compile `template` and check its placeholders against `line_machine`'s groups.
    pub fn parse(template: &str, line_machine: &Regex) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| anyhow::anyhow!("Unclosed placeholder in item format {template:?}"))?;
            let name = &after[..close];
            if !line_machine.capture_names().flatten().any(|g| g == name) {
                anyhow::bail!(
                    "Item format {template:?} uses {{{name}}}, but the line regex has no group named {name:?}"
                );
            }
            segments.push(Segment::Group(name.to_string()));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        if !segments.iter().any(|s| matches!(s, Segment::Group(_))) {
            anyhow::bail!("Item format {template:?} has no placeholder");
        }

        Ok(Self { segments })
    }

    /// Fill in the template from a matched corpus line.
    pub fn render(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Group(name) => {
                    if let Some(m) = caps.name(name) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LINE_MACHINE;

    #[test]
    fn test_render_lemma_pos() {
        let re = Regex::new(DEFAULT_LINE_MACHINE).unwrap();
        let fmt = ItemFormat::parse("{lemma}/{pos}", &re).unwrap();
        let caps = re.captures("vernielde\tVRB\tvernielen").unwrap();
        assert_eq!(fmt.render(&caps), "vernielen/VRB");
    }

    #[test]
    fn test_unknown_group_rejected() {
        let re = Regex::new(DEFAULT_LINE_MACHINE).unwrap();
        assert!(ItemFormat::parse("{form}", &re).is_err());
        assert!(ItemFormat::parse("{word", &re).is_err());
        assert!(ItemFormat::parse("word", &re).is_err());
    }
}
