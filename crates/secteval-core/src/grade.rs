//! Per-document grading: multiset matching of annotated section titles
//! against extractor output.

use std::collections::HashMap;

use thiserror::Error;

use crate::AnnotatedDocument;
use crate::matching::SectionTitle;

/// Section names excluded from scoring by default. Abstracts are handled
/// too inconsistently across extractors and annotations to grade fairly.
pub const DEFAULT_EXCLUDED_NAMES: &[&str] = &["abstract"];

#[derive(Error, Debug)]
pub enum GradeError {
    /// A post-condition count mismatch. Indicates a defect in the matcher,
    /// not a data problem.
    #[error("count invariant violated while grading {doc_id}: {detail}")]
    CountInvariant { doc_id: String, detail: String },
    /// The document carries no annotation; callers must exclude such
    /// documents from scoring instead of grading them.
    #[error("document {doc_id} has no annotation and cannot be graded")]
    Unannotated { doc_id: String },
}

/// Per-document verdict: the three disjoint partitions produced by
/// [`grade_extraction`]. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct EvaluatedDocument {
    doc_id: String,
    url: String,
    correct: Vec<SectionTitle>,
    false_negatives: Vec<SectionTitle>,
    false_positives: Vec<SectionTitle>,
}

impl EvaluatedDocument {
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// True positives: annotated titles the extractor found.
    pub fn correct(&self) -> &[SectionTitle] {
        &self.correct
    }

    /// Annotated titles the extractor missed.
    pub fn false_negatives(&self) -> &[SectionTitle] {
        &self.false_negatives
    }

    /// Extractor output matching no annotated title.
    pub fn false_positives(&self) -> &[SectionTitle] {
        &self.false_positives
    }

    /// All ground-truth titles that were scored (correct + missed).
    pub fn true_sections(&self) -> Vec<SectionTitle> {
        let mut all = self.correct.clone();
        all.extend(self.false_negatives.iter().cloned());
        all
    }

    /// All extractor output that was scored (spurious + correct).
    pub fn extracted_sections(&self) -> Vec<SectionTitle> {
        let mut all = self.false_positives.clone();
        all.extend(self.correct.iter().cloned());
        all
    }

    pub fn is_all_correct(&self) -> bool {
        self.false_positives.is_empty() && self.false_negatives.is_empty()
    }
}

/// Whether a title's raw text, lower-cased, contains any excluded name as
/// a substring. Filtering is on the raw text, not the canonical key.
fn is_excluded(title: &SectionTitle, excluded_names: &[&str]) -> bool {
    let lower = title.raw().to_lowercase();
    excluded_names.iter().any(|e| lower.contains(e))
}

/// Grade one document's extraction against its annotation.
///
/// Both lists are first filtered through `excluded_names`. Matching is
/// multiset semantics on canonical keys: each extracted occurrence can
/// satisfy at most one annotated occurrence, so a title appearing twice in
/// the annotation and once in the extraction yields one true positive and
/// one false negative. Extracted occurrences left unconsumed become false
/// positives, in their original order.
pub fn grade_extraction(
    doc: &AnnotatedDocument,
    extracted: &[SectionTitle],
    excluded_names: &[&str],
) -> Result<EvaluatedDocument, GradeError> {
    let true_sections = doc.sections.as_deref().ok_or_else(|| GradeError::Unannotated {
        doc_id: doc.doc_id.clone(),
    })?;

    let filtered_true: Vec<&SectionTitle> = true_sections
        .iter()
        .filter(|t| !is_excluded(t, excluded_names))
        .collect();
    let filtered_extracted: Vec<&SectionTitle> = extracted
        .iter()
        .filter(|t| !is_excluded(t, excluded_names))
        .collect();

    let num_true = filtered_true.len();
    let num_extracted = filtered_extracted.len();

    // Remaining supply of extracted occurrences per canonical key. Each
    // match consumes exactly one unit, so duplicate titles are paired off
    // one-at-a-time rather than cross-multiplied.
    let mut supply: HashMap<&str, usize> = HashMap::new();
    for title in &filtered_extracted {
        *supply.entry(title.canonical()).or_insert(0) += 1;
    }

    let mut correct = Vec::new();
    let mut false_negatives = Vec::new();
    let mut consumed: HashMap<&str, usize> = HashMap::new();
    for title in &filtered_true {
        match supply.get_mut(title.canonical()) {
            Some(n) if *n > 0 => {
                *n -= 1;
                *consumed.entry(title.canonical()).or_insert(0) += 1;
                correct.push((*title).clone());
            }
            _ => false_negatives.push((*title).clone()),
        }
    }

    // What was not consumed is a false positive. Walking the extracted
    // list in order and skipping consumed units front-to-back keeps the
    // earliest occurrence of a key as the matched one.
    let mut false_positives = Vec::new();
    for title in &filtered_extracted {
        match consumed.get_mut(title.canonical()) {
            Some(n) if *n > 0 => *n -= 1,
            _ => false_positives.push((*title).clone()),
        }
    }

    if correct.len() + false_negatives.len() != num_true {
        return Err(GradeError::CountInvariant {
            doc_id: doc.doc_id.clone(),
            detail: format!(
                "correct ({}) + false negatives ({}) != filtered true count ({})",
                correct.len(),
                false_negatives.len(),
                num_true
            ),
        });
    }
    if correct.len() + false_positives.len() != num_extracted {
        return Err(GradeError::CountInvariant {
            doc_id: doc.doc_id.clone(),
            detail: format!(
                "correct ({}) + false positives ({}) != filtered extracted count ({})",
                correct.len(),
                false_positives.len(),
                num_extracted
            ),
        });
    }

    Ok(EvaluatedDocument {
        doc_id: doc.doc_id.clone(),
        url: doc.url.clone(),
        correct,
        false_negatives,
        false_positives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn titles(raw: &[&str]) -> Vec<SectionTitle> {
        raw.iter().map(|s| SectionTitle::new(*s)).collect()
    }

    fn raws(titles: &[SectionTitle]) -> Vec<&str> {
        titles.iter().map(|t| t.raw()).collect()
    }

    fn doc(id: &str, sections: Option<Vec<SectionTitle>>) -> AnnotatedDocument {
        AnnotatedDocument {
            doc_id: id.to_string(),
            url: format!("http://example.org/{id}.pdf"),
            pdf_path: PathBuf::from(format!("{id}.pdf")),
            sections,
        }
    }

    fn grade(
        true_titles: &[&str],
        extracted: &[&str],
    ) -> Result<EvaluatedDocument, GradeError> {
        grade_extraction(
            &doc("t1", Some(titles(true_titles))),
            &titles(extracted),
            DEFAULT_EXCLUDED_NAMES,
        )
    }

    #[test]
    fn exact_match() {
        let graded = grade(&["Introduction", "Results"], &["Introduction", "Results"]).unwrap();
        assert_eq!(raws(graded.correct()), ["Introduction", "Results"]);
        assert!(graded.false_negatives().is_empty());
        assert!(graded.false_positives().is_empty());
        assert!(graded.is_all_correct());
    }

    #[test]
    fn canonical_key_matching() {
        let graded = grade(&["3. Results"], &["3-Results"]).unwrap();
        assert_eq!(raws(graded.correct()), ["3. Results"]);
        assert!(graded.false_positives().is_empty());
    }

    #[test]
    fn duplicate_title_consumes_one_occurrence_per_match() {
        // Two in true, one in extracted: one TP, one FN, zero FPs.
        let graded = grade(&["Intro", "Intro"], &["Intro"]).unwrap();
        assert_eq!(raws(graded.correct()), ["Intro"]);
        assert_eq!(raws(graded.false_negatives()), ["Intro"]);
        assert!(graded.false_positives().is_empty());
    }

    #[test]
    fn duplicate_title_both_sides() {
        // Two and two pair off as exactly two TPs, not four.
        let graded = grade(&["Intro", "Intro"], &["Intro", "Intro"]).unwrap();
        assert_eq!(graded.correct().len(), 2);
        assert!(graded.false_negatives().is_empty());
        assert!(graded.false_positives().is_empty());
    }

    #[test]
    fn abstract_excluded_case_insensitively() {
        let graded = grade(&["Abstract", "Results"], &["ABSTRACT", "Results"]).unwrap();
        assert_eq!(raws(graded.correct()), ["Results"]);
        assert!(graded.false_negatives().is_empty());
        assert!(graded.false_positives().is_empty());
    }

    #[test]
    fn exclusion_is_substring_on_raw_text() {
        // "abstract" inside a longer phrase is still filtered out.
        let graded = grade(&["Extended Abstracts", "Methods"], &["Methods"]).unwrap();
        assert_eq!(raws(graded.correct()), ["Methods"]);
        assert!(graded.false_negatives().is_empty());
    }

    #[test]
    fn empty_true_list_yields_only_false_positives() {
        let graded = grade(&[], &["Spurious", "Sections"]).unwrap();
        assert!(graded.correct().is_empty());
        assert!(graded.false_negatives().is_empty());
        assert_eq!(raws(graded.false_positives()), ["Spurious", "Sections"]);
    }

    #[test]
    fn empty_extracted_list_yields_only_false_negatives() {
        let graded = grade(&["Introduction", "Results"], &[]).unwrap();
        assert!(graded.correct().is_empty());
        assert_eq!(raws(graded.false_negatives()), ["Introduction", "Results"]);
        assert!(graded.false_positives().is_empty());
    }

    #[test]
    fn both_empty_yields_all_empty() {
        let graded = grade(&[], &[]).unwrap();
        assert!(graded.correct().is_empty());
        assert!(graded.false_negatives().is_empty());
        assert!(graded.false_positives().is_empty());
        assert!(graded.is_all_correct());
    }

    #[test]
    fn false_positives_keep_extracted_order() {
        let graded = grade(&["B"], &["Z", "B", "A"]).unwrap();
        assert_eq!(raws(graded.false_positives()), ["Z", "A"]);
    }

    #[test]
    fn count_invariants_hold() {
        let cases: &[(&[&str], &[&str])] = &[
            (&["A", "B", "C"], &["B", "C", "D"]),
            (&["A", "A", "B"], &["A"]),
            (&["Abstract", "A"], &["abstract", "A", "B"]),
            (&[], &["X"]),
            (&["X"], &[]),
        ];
        for (t, e) in cases {
            let graded = grade(t, e).unwrap();
            let num_true = graded.correct().len() + graded.false_negatives().len();
            let num_extracted = graded.correct().len() + graded.false_positives().len();
            assert_eq!(graded.true_sections().len(), num_true);
            assert_eq!(graded.extracted_sections().len(), num_extracted);
        }
    }

    #[test]
    fn unannotated_document_is_rejected() {
        let err = grade_extraction(&doc("t2", None), &titles(&["A"]), DEFAULT_EXCLUDED_NAMES)
            .unwrap_err();
        assert!(matches!(err, GradeError::Unannotated { .. }));
    }
}
