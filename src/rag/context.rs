//! Context assembly.
//!
//! Turns ranked search hits into the grounding text handed to the chat
//! model, keeping the accepted hits for side-channel display.

use crate::store::RecordHit;

/// Grounding text plus the hits that produced it.
#[derive(Debug, Clone)]
pub struct ContextAssembly {
    /// Concatenated passage blocks; empty when nothing cleared the
    /// threshold.
    pub grounding_text: String,
    /// Accepted hits in rank order, unmodified.
    pub accepted: Vec<RecordHit>,
}

/// Threshold filter over ranked hits.
pub struct ContextAssembler {
    similarity_threshold: f32,
}

impl ContextAssembler {
    pub fn new(similarity_threshold: f32) -> Self {
        Self {
            similarity_threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.similarity_threshold
    }

    /// Accept hits scoring strictly above the threshold, in rank order,
    /// and append one passage block per accepted hit.
    pub fn assemble(&self, hits: &[RecordHit]) -> ContextAssembly {
        let mut grounding_text = String::new();
        let mut accepted = Vec::new();

        for hit in hits {
            if hit.score > self.similarity_threshold {
                grounding_text.push_str(&format!("search result: {}\n\n", hit.record.merged_text));
                accepted.push(hit.clone());
            }
        }

        ContextAssembly {
            grounding_text,
            accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;

    fn hit(id: &str, merged_text: &str, score: f32) -> RecordHit {
        RecordHit {
            record: Record {
                id: id.to_string(),
                category: String::new(),
                question: String::new(),
                answer: String::new(),
                merged_text: merged_text.to_string(),
                keywords: Vec::new(),
                embedding: Vec::new(),
                searchable: true,
            },
            score,
        }
    }

    #[test]
    fn accepts_exactly_the_hits_above_threshold_in_rank_order() {
        let assembler = ContextAssembler::new(0.3);
        let hits = vec![
            hit("a", "first", 0.9),
            hit("b", "second", 0.42),
            hit("c", "third", 0.1),
        ];

        let assembly = assembler.assemble(&hits);

        let ids: Vec<&str> = assembly.accepted.iter().map(|h| h.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            assembly.grounding_text,
            "search result: first\n\nsearch result: second\n\n"
        );
    }

    #[test]
    fn threshold_is_strict() {
        let assembler = ContextAssembler::new(0.3);
        let hits = vec![hit("exact", "on the line", 0.3)];

        let assembly = assembler.assemble(&hits);
        assert!(assembly.accepted.is_empty());
        assert!(assembly.grounding_text.is_empty());
    }

    #[test]
    fn no_accepted_hits_yield_empty_grounding() {
        let assembler = ContextAssembler::new(0.3);
        let hits = vec![hit("a", "x", 0.2), hit("b", "y", 0.05)];

        let assembly = assembler.assemble(&hits);
        assert_eq!(assembly.grounding_text, "");
        assert!(assembly.accepted.is_empty());
    }

    #[test]
    fn assembly_is_deterministic() {
        let assembler = ContextAssembler::new(0.3);
        let hits = vec![hit("a", "first", 0.8), hit("b", "second", 0.5)];

        let first = assembler.assemble(&hits);
        let second = assembler.assemble(&hits);
        assert_eq!(first.grounding_text, second.grounding_text);
        assert_eq!(first.accepted.len(), second.accepted.len());
    }

    #[test]
    fn accepted_hits_keep_their_scores() {
        let assembler = ContextAssembler::new(0.0);
        let hits = vec![hit("a", "x", 0.77)];

        let assembly = assembler.assemble(&hits);
        assert_eq!(assembly.accepted[0].score, 0.77);
    }
}
