use std::io::Write;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use secteval_core::{CorpusMetrics, EvaluatedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct MetricsRecord {
    correct: usize,
    false_positives: usize,
    false_negatives: usize,
    true_total: usize,
    extracted_total: usize,
    /// `null` when nothing was extracted (undefined, not zero).
    precision: Option<f64>,
    /// `null` when the corpus holds no scored ground truth.
    recall: Option<f64>,
    f1: f64,
}

#[derive(Serialize)]
struct DocumentRecord<'a> {
    doc_id: &'a str,
    url: &'a str,
    correct: Vec<&'a str>,
    false_positives: Vec<&'a str>,
    false_negatives: Vec<&'a str>,
}

#[derive(Serialize)]
struct Report<'a> {
    extractor: &'a str,
    metrics: MetricsRecord,
    documents: Vec<DocumentRecord<'a>>,
}

/// Export the run's results to `path` in the given format.
pub fn export_results(
    extractor: &str,
    docs: &[EvaluatedDocument],
    metrics: &CorpusMetrics,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let content = match format {
        ExportFormat::Json => export_json(extractor, docs, metrics)?,
        ExportFormat::Csv => export_csv(docs),
    };
    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::create(path).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    Ok(())
}

fn raws(titles: &[secteval_core::SectionTitle]) -> Vec<&str> {
    titles.iter().map(|t| t.raw()).collect()
}

fn export_json(
    extractor: &str,
    docs: &[EvaluatedDocument],
    metrics: &CorpusMetrics,
) -> Result<String, ExportError> {
    let report = Report {
        extractor,
        metrics: MetricsRecord {
            correct: metrics.correct,
            false_positives: metrics.false_positives,
            false_negatives: metrics.false_negatives,
            true_total: metrics.true_total,
            extracted_total: metrics.extracted_total,
            precision: metrics.precision(),
            recall: metrics.recall(),
            f1: metrics.f1(),
        },
        documents: docs
            .iter()
            .map(|d| DocumentRecord {
                doc_id: d.doc_id(),
                url: d.url(),
                correct: raws(d.correct()),
                false_positives: raws(d.false_positives()),
                false_negatives: raws(d.false_negatives()),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// One row per document: counts only. Heading lists belong in the JSON
/// export.
fn export_csv(docs: &[EvaluatedDocument]) -> String {
    let mut out = String::from("doc_id,url,correct,false_positives,false_negatives\n");
    for doc in docs {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_quote(doc.doc_id()),
            csv_quote(doc.url()),
            doc.correct().len(),
            doc.false_positives().len(),
            doc.false_negatives().len()
        ));
    }
    out
}

fn csv_quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
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

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out.json")),
            Some(ExportFormat::Json)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out.csv")),
            Some(ExportFormat::Csv)
        );
        assert_eq!(ExportFormat::from_path(Path::new("out.xml")), None);
        assert_eq!(ExportFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn json_report_shape() {
        let docs = vec![evaluated("a", &["Intro", "Missed"], &["Intro", "Extra"])];
        let metrics = CorpusMetrics::aggregate(&docs);
        let json = export_json("grobid", &docs, &metrics).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["extractor"], "grobid");
        assert_eq!(value["metrics"]["correct"], 1);
        assert_eq!(value["documents"][0]["doc_id"], "a");
        assert_eq!(value["documents"][0]["correct"][0], "Intro");
        assert_eq!(value["documents"][0]["false_positives"][0], "Extra");
        assert_eq!(value["documents"][0]["false_negatives"][0], "Missed");
    }

    #[test]
    fn undefined_precision_exports_as_null() {
        let docs = vec![evaluated("a", &["Intro"], &[])];
        let metrics = CorpusMetrics::aggregate(&docs);
        let json = export_json("grobid", &docs, &metrics).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["metrics"]["precision"].is_null());
        assert_eq!(value["metrics"]["recall"], 0.0);
    }

    #[test]
    fn csv_rows_and_quoting() {
        let docs = vec![evaluated("doc,1", &["Intro"], &["Intro"])];
        let csv = export_csv(&docs);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "doc_id,url,correct,false_positives,false_negatives"
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"doc,1\",\"http://example.org/doc,1.pdf\",1,0,0"
        );
    }

    #[test]
    fn writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let docs = vec![evaluated("a", &["Intro"], &["Intro"])];
        let metrics = CorpusMetrics::aggregate(&docs);
        export_results("parscit", &docs, &metrics, ExportFormat::Json, &path).unwrap();
        assert!(path.is_file());
    }
}
