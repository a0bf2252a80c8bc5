use std::io::Write;

use owo_colors::OwoColorize;
use secteval_core::{CorpusMetrics, EvaluatedDocument};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "undefined".to_string(),
    }
}

/// Print the corpus summary block.
pub fn print_summary(w: &mut dyn Write, metrics: &CorpusMetrics) -> std::io::Result<()> {
    writeln!(w, "Correct: {}", metrics.correct)?;
    writeln!(w, "FPs: {}", metrics.false_positives)?;
    writeln!(w, "FNs: {}", metrics.false_negatives)?;
    writeln!(w, "PRECISION: {}", ratio(metrics.precision()))?;
    writeln!(w, "RECALL: {}", ratio(metrics.recall()))?;
    writeln!(w, "F1: {:.3}", metrics.f1())?;
    Ok(())
}

fn print_heading_list(
    w: &mut dyn Write,
    label: &str,
    titles: &[secteval_core::SectionTitle],
) -> std::io::Result<()> {
    writeln!(w, "{label}")?;
    for title in titles {
        writeln!(w, "\t{title}")?;
    }
    Ok(())
}

/// Print one block per document: URL plus the three heading lists.
///
/// Documents are sorted by `(id contains '-', id)` so synthetic and
/// negative-control ids group after natural ones. With `only_errors`,
/// fully-correct documents collapse to a single line.
pub fn list_documents(
    w: &mut dyn Write,
    docs: &[EvaluatedDocument],
    only_errors: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let mut sorted: Vec<&EvaluatedDocument> = docs.iter().collect();
    sorted.sort_by_key(|d| (d.doc_id().contains('-'), d.doc_id().to_string()));

    for doc in sorted {
        writeln!(w)?;
        writeln!(w, "{} Paper: {} {}", "*".repeat(10), doc.doc_id(), "*".repeat(10))?;
        writeln!(w, "Url: {}", doc.url())?;
        if only_errors && doc.is_all_correct() {
            writeln!(w, "Everything correct ({} titles)", doc.correct().len())?;
            continue;
        }
        if color.enabled() {
            print_heading_list(w, &format!("{}", "Correct:".green()), doc.correct())?;
            print_heading_list(
                w,
                &format!("{}", "False Positives:".red()),
                doc.false_positives(),
            )?;
            print_heading_list(
                w,
                &format!("{}", "False Negatives:".yellow()),
                doc.false_negatives(),
            )?;
        } else {
            print_heading_list(w, "Correct:", doc.correct())?;
            print_heading_list(w, "False Positives:", doc.false_positives())?;
            print_heading_list(w, "False Negatives:", doc.false_negatives())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secteval_core::{AnnotatedDocument, SectionTitle, grade_extraction};
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
        grade_extraction(&doc, &extracted, &["abstract"]).unwrap()
    }

    fn render_summary(metrics: &CorpusMetrics) -> String {
        let mut buf = Vec::new();
        print_summary(&mut buf, metrics).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn summary_format() {
        let docs = vec![evaluated("a", &["Intro", "Missed"], &["Intro", "Extra"])];
        let metrics = CorpusMetrics::aggregate(&docs);
        let out = render_summary(&metrics);
        assert_eq!(
            out,
            "Correct: 1\nFPs: 1\nFNs: 1\nPRECISION: 0.500\nRECALL: 0.500\nF1: 0.500\n"
        );
    }

    #[test]
    fn summary_reports_undefined_ratios() {
        let metrics = CorpusMetrics::aggregate(&[]);
        let out = render_summary(&metrics);
        assert!(out.contains("PRECISION: undefined\n"));
        assert!(out.contains("RECALL: undefined\n"));
        assert!(out.contains("F1: 0.000\n"));
    }

    #[test]
    fn hyphenated_ids_sort_after_natural_ones() {
        let docs = vec![
            evaluated("neg-control", &[], &[]),
            evaluated("nips11_3", &[], &[]),
            evaluated("acl12_7", &[], &[]),
        ];
        let mut buf = Vec::new();
        list_documents(&mut buf, &docs, false, ColorMode(false)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let acl = out.find("Paper: acl12_7").unwrap();
        let nips = out.find("Paper: nips11_3").unwrap();
        let neg = out.find("Paper: neg-control").unwrap();
        assert!(acl < nips && nips < neg);
    }

    #[test]
    fn errors_only_collapses_clean_documents() {
        let docs = vec![
            evaluated("clean", &["Intro"], &["Intro"]),
            evaluated("dirty", &["Intro"], &["Wrong"]),
        ];
        let mut buf = Vec::new();
        list_documents(&mut buf, &docs, true, ColorMode(false)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Everything correct (1 titles)"));
        assert!(out.contains("\tWrong"));
        // The clean document's block has no heading lists.
        let clean_block = out.split("Paper: clean").nth(1).unwrap();
        let clean_block = clean_block.split("Paper:").next().unwrap();
        assert!(!clean_block.contains("Correct:"));
    }

    #[test]
    fn document_block_format() {
        let docs = vec![evaluated("a", &["Intro", "Missed"], &["Intro", "Extra"])];
        let mut buf = Vec::new();
        list_documents(&mut buf, &docs, false, ColorMode(false)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("********** Paper: a **********"));
        assert!(out.contains("Url: http://example.org/a.pdf"));
        assert!(out.contains("Correct:\n\tIntro\n"));
        assert!(out.contains("False Positives:\n\tExtra\n"));
        assert!(out.contains("False Negatives:\n\tMissed\n"));
    }
}
