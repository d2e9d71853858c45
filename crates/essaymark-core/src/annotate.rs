//! CEFR vocabulary annotator.
//!
//! Splits essay text into word and delimiter segments and tags each word with
//! the CEFR level the agent listed it under. Concatenating the segment texts
//! always gives back the original essay.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{CefrBreakdown, CefrLevel, EvaluationResult, WordsByLevel};

/// Punctuation that separates words and is ignored when matching.
pub const PUNCTUATION: [char; 8] = ['.', ',', '!', '?', ';', ':', '"', '\''];

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || PUNCTUATION.contains(&c)
}

/// Lower-case a word and strip surrounding whitespace and punctuation.
pub fn normalize_word(word: &str) -> String {
    word.trim_matches(is_delimiter).to_lowercase()
}

/// Lookup from normalized word to its highest listed level.
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    levels: HashMap<String, CefrLevel>,
}

impl VocabularyIndex {
    /// Build from the six per-level lists, highest level first.
    pub fn from_lists(words: &WordsByLevel) -> Self {
        let mut levels = HashMap::new();
        for level in CefrLevel::BY_PRIORITY {
            for word in words.get(level) {
                let key = normalize_word(word);
                if key.is_empty() {
                    continue;
                }
                levels.entry(key).or_insert(level);
            }
        }
        tracing::debug!(entries = levels.len(), "built vocabulary index");
        Self { levels }
    }

    pub fn from_breakdown(cefr: &CefrBreakdown) -> Self {
        Self::from_lists(&cefr.words_by_level)
    }

    /// Level for `token`, or `None` for "other".
    pub fn classify(&self, token: &str) -> Option<CefrLevel> {
        let key = normalize_word(token);
        if key.is_empty() {
            return None;
        }
        self.levels.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// A run of non-delimiter characters.
    Word,
    /// A run of whitespace and punctuation, never looked up.
    Delimiter,
}

/// A verbatim slice of the essay with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub kind: SegmentKind,
    /// `None` means "other".
    pub level: Option<CefrLevel>,
}

impl Segment {
    pub fn is_word(&self) -> bool {
        self.kind == SegmentKind::Word
    }

    /// CSS class for rendering: `a1` … `c2`, or `other`.
    pub fn css_class(&self) -> &'static str {
        self.level.map(CefrLevel::css_class).unwrap_or("other")
    }
}

/// Split `text` into word and delimiter runs and classify the words.
pub fn annotate(text: &str, index: &VocabularyIndex) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut run_start = 0;
    let mut run_is_delimiter: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let delimiter = is_delimiter(c);
        match run_is_delimiter {
            Some(current) if current != delimiter => {
                segments.push(make_segment(&text[run_start..i], current, index));
                run_start = i;
                run_is_delimiter = Some(delimiter);
            }
            Some(_) => {}
            None => run_is_delimiter = Some(delimiter),
        }
    }

    if let Some(current) = run_is_delimiter {
        segments.push(make_segment(&text[run_start..], current, index));
    }

    segments
}

/// Annotate an essay against the word lists of an evaluation.
pub fn annotate_essay(text: &str, result: &EvaluationResult) -> Vec<Segment> {
    annotate(text, &VocabularyIndex::from_breakdown(&result.cefr))
}

fn make_segment(text: &str, delimiter: bool, index: &VocabularyIndex) -> Segment {
    if delimiter {
        Segment {
            text: text.to_string(),
            kind: SegmentKind::Delimiter,
            level: None,
        }
    } else {
        Segment {
            text: text.to_string(),
            kind: SegmentKind::Word,
            level: index.classify(text),
        }
    }
}

/// Per-level counts of word segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelTally {
    pub by_level: BTreeMap<CefrLevel, usize>,
    pub other: usize,
}

impl LevelTally {
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut tally = LevelTally::default();
        for segment in segments.iter().filter(|s| s.is_word()) {
            match segment.level {
                Some(level) => *tally.by_level.entry(level).or_insert(0) += 1,
                None => tally.other += 1,
            }
        }
        tally
    }

    pub fn count(&self, level: CefrLevel) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }

    pub fn total_words(&self) -> usize {
        self.by_level.values().sum::<usize>() + self.other
    }
}
