//! Evaluation result data model.
//!
//! The scoring agent answers with Chinese attribute names. Each attribute is
//! mapped onto a named field here, so a document missing one of them fails to
//! parse instead of showing up as a hole at render time. Serializing a result
//! writes the agent's original names back out.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A complete essay evaluation as produced by the scoring agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Overall score for the essay.
    #[serde(rename = "总体评分")]
    pub overall_score: f64,
    /// Vocabulary usage.
    #[serde(rename = "词汇运用")]
    pub vocabulary: DimensionScore,
    /// Sentence structure.
    #[serde(rename = "句子结构")]
    pub sentence_structure: DimensionScore,
    /// Essay (paragraph-level) structure.
    #[serde(rename = "文章结构")]
    pub essay_structure: DimensionScore,
    /// Relevance of the content to the prompt.
    #[serde(rename = "内容相关性")]
    pub content_relevance: DimensionScore,
    /// Language complexity statistics.
    #[serde(rename = "语言复杂度统计")]
    pub complexity: ComplexityStats,
    /// CEFR vocabulary breakdown.
    #[serde(rename = "CEFR词汇等级")]
    pub cefr: CefrBreakdown,
    /// Paragraph label → sentence label → commentary, in the agent's order.
    #[serde(rename = "逐句点评")]
    pub sentence_comments: LabeledMap<LabeledMap<SentenceComment>>,
}

impl EvaluationResult {
    /// The four scored dimensions with their display labels.
    pub fn dimensions(&self) -> [(&'static str, &DimensionScore); 4] {
        [
            ("词汇", &self.vocabulary),
            ("句子", &self.sentence_structure),
            ("篇章结构", &self.essay_structure),
            ("内容相关性", &self.content_relevance),
        ]
    }
}

/// A score with its commentary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    #[serde(rename = "得分")]
    pub score: f64,
    #[serde(rename = "评价")]
    pub commentary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityStats {
    #[serde(rename = "总词数")]
    pub total_words: u64,
    #[serde(rename = "总句子数")]
    pub total_sentences: u64,
    /// Display string; the agent sometimes sends a bare number.
    #[serde(rename = "平均单词长度", deserialize_with = "text_or_number")]
    pub avg_word_length: String,
    #[serde(rename = "平均句子长度", deserialize_with = "text_or_number")]
    pub avg_sentence_length: String,
}

/// Share of A/B/C level vocabulary plus the per-level word lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CefrBreakdown {
    #[serde(rename = "A级词汇占比", deserialize_with = "text_or_number")]
    pub percent_a: String,
    #[serde(rename = "B级词汇占比", deserialize_with = "text_or_number")]
    pub percent_b: String,
    #[serde(rename = "C级词汇占比", deserialize_with = "text_or_number")]
    pub percent_c: String,
    #[serde(rename = "词汇评价")]
    pub vocabulary_commentary: String,
    #[serde(flatten)]
    pub words_by_level: WordsByLevel,
}

/// The six per-level word lists. All six must be present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordsByLevel {
    #[serde(rename = "作文中使用到的C2词汇")]
    pub c2: Vec<String>,
    #[serde(rename = "作文中使用到的C1词汇")]
    pub c1: Vec<String>,
    #[serde(rename = "作文中使用到的B2词汇")]
    pub b2: Vec<String>,
    #[serde(rename = "作文中使用到的B1词汇")]
    pub b1: Vec<String>,
    #[serde(rename = "作文中使用到的A2词汇")]
    pub a2: Vec<String>,
    #[serde(rename = "作文中使用到的A1词汇")]
    pub a1: Vec<String>,
}

impl WordsByLevel {
    /// Words listed for `level`.
    pub fn get(&self, level: CefrLevel) -> &[String] {
        match level {
            CefrLevel::A1 => &self.a1,
            CefrLevel::A2 => &self.a2,
            CefrLevel::B1 => &self.b1,
            CefrLevel::B2 => &self.b2,
            CefrLevel::C1 => &self.c1,
            CefrLevel::C2 => &self.c2,
        }
    }

    /// Mutable access to the list for `level`.
    pub fn get_mut(&mut self, level: CefrLevel) -> &mut Vec<String> {
        match level {
            CefrLevel::A1 => &mut self.a1,
            CefrLevel::A2 => &mut self.a2,
            CefrLevel::B1 => &mut self.b1,
            CefrLevel::B2 => &mut self.b2,
            CefrLevel::C1 => &mut self.c1,
            CefrLevel::C2 => &mut self.c2,
        }
    }

    pub fn is_empty(&self) -> bool {
        CefrLevel::ALL.iter().all(|l| self.get(*l).is_empty())
    }
}

/// Commentary on a single sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceComment {
    #[serde(rename = "句子")]
    pub sentence_text: String,
    #[serde(rename = "评论")]
    pub comments: Vec<String>,
    #[serde(
        rename = "修改建议",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub suggestion: Option<String>,
}

/// CEFR proficiency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// All levels, lowest first.
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// All levels, highest first. A word listed under several levels takes
    /// the first one it meets in this order.
    pub const BY_PRIORITY: [CefrLevel; 6] = [
        CefrLevel::C2,
        CefrLevel::C1,
        CefrLevel::B2,
        CefrLevel::B1,
        CefrLevel::A2,
        CefrLevel::A1,
    ];

    /// Lower-case CSS class name (`a1` … `c2`).
    pub fn css_class(self) -> &'static str {
        match self {
            CefrLevel::A1 => "a1",
            CefrLevel::A2 => "a2",
            CefrLevel::B1 => "b1",
            CefrLevel::B2 => "b2",
            CefrLevel::C1 => "c1",
            CefrLevel::C2 => "c2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        };
        f.write_str(s)
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            other => Err(format!("unknown CEFR level: {other}")),
        }
    }
}

/// Display band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Good
        } else if score >= 60.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::Fair => "fair",
            ScoreBand::Poor => "poor",
        }
    }
}

// ---------------------------------------------------------------------------
// Ordered label map
// ---------------------------------------------------------------------------

/// A JSON object whose keys are free-form labels ("第1段", "句子1", ...),
/// kept in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMap<T>(Vec<(String, T)>);

impl<T> LabeledMap<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, label: impl Into<String>, value: T) {
        self.0.push((label.into(), value));
    }

    pub fn get(&self, label: &str) -> Option<&T> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for LabeledMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize> Serialize for LabeledMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for LabeledMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LabeledMapVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for LabeledMapVisitor<T> {
            type Value = LabeledMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, value)) = access.next_entry::<String, T>()? {
                    entries.push((label, value));
                }
                Ok(LabeledMap(entries))
            }
        }

        deserializer.deserialize_map(LabeledMapVisitor(PhantomData))
    }
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(x) => x.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::SAMPLE_RESULT;
    use super::*;

    #[test]
    fn parse_agent_document() {
        let result: EvaluationResult = serde_json::from_str(SAMPLE_RESULT).unwrap();
        assert_eq!(result.overall_score, 82.0);
        assert_eq!(result.vocabulary.score, 78.0);
        assert_eq!(result.complexity.avg_word_length, "4.1");
        assert_eq!(result.complexity.avg_sentence_length, "3.5");
        assert_eq!(result.cefr.words_by_level.get(CefrLevel::A1), ["like", "apples"]);
        assert!(result.cefr.words_by_level.get(CefrLevel::C2).is_empty());
    }

    #[test]
    fn sentence_comments_keep_document_order() {
        let result: EvaluationResult = serde_json::from_str(SAMPLE_RESULT).unwrap();
        let paragraph = result.sentence_comments.get("第1段").unwrap();
        let labels: Vec<&str> = paragraph.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["句子1", "句子2"]);
        assert!(paragraph.get("句子1").unwrap().suggestion.is_none());
        assert_eq!(
            paragraph.get("句子2").unwrap().suggestion.as_deref(),
            Some("Running every morning is fun.")
        );
    }

    #[test]
    fn missing_level_bucket_is_rejected() {
        let mut doc: serde_json::Value = serde_json::from_str(SAMPLE_RESULT).unwrap();
        doc["CEFR词汇等级"]
            .as_object_mut()
            .unwrap()
            .remove("作文中使用到的B2词汇");
        let err = serde_json::from_value::<EvaluationResult>(doc).unwrap_err();
        assert!(err.to_string().contains("B2"), "got: {err}");
    }

    #[test]
    fn serialization_restores_agent_keys() {
        let result: EvaluationResult = serde_json::from_str(SAMPLE_RESULT).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("总体评分").is_some());
        assert!(value["CEFR词汇等级"].get("作文中使用到的A1词汇").is_some());
        assert!(value["逐句点评"]["第1段"]["句子1"].get("修改建议").is_none());

        let reparsed: EvaluationResult = serde_json::from_value(value).unwrap();
        assert_eq!(reparsed, result);
    }

    #[test]
    fn level_parsing_and_display() {
        assert_eq!("c1".parse::<CefrLevel>().unwrap(), CefrLevel::C1);
        assert_eq!(CefrLevel::B2.to_string(), "B2");
        assert!("D1".parse::<CefrLevel>().is_err());
        assert!(CefrLevel::C2 > CefrLevel::A1);
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::from_score(80.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(79.5), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(60.0), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(12.0), ScoreBand::Poor);
    }
}
