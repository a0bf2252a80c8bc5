//! Corpus-level aggregation of per-document grading results.

use crate::grade::EvaluatedDocument;

/// Aggregated counts over a set of evaluated documents, with derived
/// precision/recall/F1. A value object: computed on demand, never mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusMetrics {
    pub correct: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Total ground-truth titles scored (correct + false negatives).
    pub true_total: usize,
    /// Total extractor output scored (correct + false positives).
    pub extracted_total: usize,
}

impl CorpusMetrics {
    /// Sum per-document counts. A commutative fold: document order does
    /// not matter, and an empty input yields all zeros.
    pub fn aggregate(docs: &[EvaluatedDocument]) -> Self {
        let mut metrics = Self::default();
        for doc in docs {
            metrics.correct += doc.correct().len();
            metrics.false_positives += doc.false_positives().len();
            metrics.false_negatives += doc.false_negatives().len();
            metrics.true_total += doc.correct().len() + doc.false_negatives().len();
            metrics.extracted_total += doc.correct().len() + doc.false_positives().len();
        }
        metrics
    }

    /// `None` when nothing was extracted at all — "undefined" rather than
    /// zero, so extractors with no coverage are not conflated with
    /// extractors that produced output scoring zero.
    pub fn precision(&self) -> Option<f64> {
        (self.extracted_total > 0).then(|| self.correct as f64 / self.extracted_total as f64)
    }

    /// `None` when the corpus contains no scored ground-truth titles.
    pub fn recall(&self) -> Option<f64> {
        (self.true_total > 0).then(|| self.correct as f64 / self.true_total as f64)
    }

    /// Zero whenever nothing was correct; otherwise the harmonic mean of
    /// precision and recall (both denominators are nonzero once
    /// `correct > 0`).
    pub fn f1(&self) -> f64 {
        if self.correct == 0 {
            return 0.0;
        }
        let p = self.correct as f64 / self.extracted_total as f64;
        let r = self.correct as f64 / self.true_total as f64;
        2.0 * p * r / (p + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::{DEFAULT_EXCLUDED_NAMES, grade_extraction};
    use crate::matching::SectionTitle;
    use crate::AnnotatedDocument;
    use std::path::PathBuf;

    fn evaluated(id: &str, true_titles: &[&str], extracted: &[&str]) -> EvaluatedDocument {
        let doc = AnnotatedDocument {
            doc_id: id.to_string(),
            url: format!("http://example.org/{id}.pdf"),
            pdf_path: PathBuf::from(format!("{id}.pdf")),
            sections: Some(true_titles.iter().map(|s| SectionTitle::new(*s)).collect()),
        };
        let extracted: Vec<SectionTitle> =
            extracted.iter().map(|s| SectionTitle::new(*s)).collect();
        grade_extraction(&doc, &extracted, DEFAULT_EXCLUDED_NAMES).unwrap()
    }

    #[test]
    fn empty_corpus_is_safe() {
        let metrics = CorpusMetrics::aggregate(&[]);
        assert_eq!(metrics.precision(), None);
        assert_eq!(metrics.recall(), None);
        assert_eq!(metrics.f1(), 0.0);
    }

    #[test]
    fn documents_with_nothing_scored_are_safe() {
        let docs = vec![evaluated("a", &[], &[]), evaluated("b", &[], &[])];
        let metrics = CorpusMetrics::aggregate(&docs);
        assert_eq!(metrics.precision(), None);
        assert_eq!(metrics.recall(), None);
        assert_eq!(metrics.f1(), 0.0);
    }

    #[test]
    fn precision_undefined_when_nothing_extracted() {
        let docs = vec![evaluated("a", &["Introduction"], &[])];
        let metrics = CorpusMetrics::aggregate(&docs);
        assert_eq!(metrics.precision(), None);
        assert_eq!(metrics.recall(), Some(0.0));
        assert_eq!(metrics.f1(), 0.0);
    }

    #[test]
    fn recall_undefined_when_no_truth() {
        let docs = vec![evaluated("a", &[], &["Spurious"])];
        let metrics = CorpusMetrics::aggregate(&docs);
        assert_eq!(metrics.precision(), Some(0.0));
        assert_eq!(metrics.recall(), None);
        assert_eq!(metrics.f1(), 0.0);
    }

    #[test]
    fn three_document_corpus() {
        // Doc A has a near-miss ("Method" vs "Methods"), doc B is perfect,
        // doc C is pure noise against an empty annotation.
        let docs = vec![
            evaluated(
                "a",
                &["Introduction", "Method", "Results", "Conclusion"],
                &["Introduction", "Methods", "Results", "Conclusion"],
            ),
            evaluated("b", &["Introduction"], &["Introduction"]),
            evaluated("c", &[], &["Spurious"]),
        ];
        let metrics = CorpusMetrics::aggregate(&docs);
        assert_eq!(metrics.correct, 4);
        assert_eq!(metrics.false_negatives, 1);
        assert_eq!(metrics.false_positives, 2);
        assert_eq!(metrics.true_total, 5);
        assert_eq!(metrics.extracted_total, 6);

        let p = metrics.precision().unwrap();
        let r = metrics.recall().unwrap();
        assert!((p - 4.0 / 6.0).abs() < 1e-9);
        assert!((r - 0.8).abs() < 1e-9);
        assert!((metrics.f1() - 2.0 * p * r / (p + r)).abs() < 1e-9);
        assert!((metrics.f1() - 0.727).abs() < 1e-3);
    }

    #[test]
    fn aggregation_is_order_insensitive() {
        let a = evaluated("a", &["X", "Y"], &["X"]);
        let b = evaluated("b", &["Z"], &["Z", "W"]);
        let fwd = CorpusMetrics::aggregate(&[a.clone(), b.clone()]);
        let rev = CorpusMetrics::aggregate(&[b, a]);
        assert_eq!(fwd, rev);
    }
}
