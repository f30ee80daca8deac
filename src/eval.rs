use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::snapshot::SnapshotRecord;
use crate::catalog::Catalog;
use crate::models::ClassificationStatus;
use crate::search::classifier::Classifier;

/// A held-out query with its ground-truth building.
#[derive(Debug, Clone)]
pub struct LabelledQuery {
    pub image_id: String,
    pub building_id: String,
    pub embedding: Vec<f32>,
}

impl From<SnapshotRecord> for LabelledQuery {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            image_id: record.id,
            building_id: record.building_id,
            embedding: record.embedding,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub image_id: String,
    pub ground_truth: String,
    pub predicted: Option<String>,
    /// None when the query itself was rejected
    pub status: Option<ClassificationStatus>,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildingAccuracy {
    pub correct: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct_confident: usize,
    pub correct_any: usize,
    pub errors: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub per_building: BTreeMap<String, BuildingAccuracy>,
    pub outcomes: Vec<QueryOutcome>,
}

impl EvaluationReport {
    /// Share of queries predicted correctly with `confident` status.
    pub fn confident_accuracy(&self) -> f64 {
        ratio(self.correct_confident, self.total)
    }

    /// Share of queries predicted correctly at any tier.
    pub fn overall_accuracy(&self) -> f64 {
        ratio(self.correct_any, self.total)
    }
}

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

/// Classify every labelled query and measure how often the predicted
/// building matches the ground truth. Rejected queries count as wrong.
pub fn evaluate(
    classifier: &Classifier,
    catalog: &Catalog,
    queries: &[LabelledQuery],
) -> EvaluationReport {
    let mut report = EvaluationReport {
        total: queries.len(),
        ..Default::default()
    };

    for (i, query) in queries.iter().enumerate() {
        let outcome = match classifier.classify(catalog, &query.embedding) {
            Ok(result) => {
                let correct = result.building_id.as_deref() == Some(query.building_id.as_str());
                if correct {
                    report.correct_any += 1;
                    if result.status == ClassificationStatus::Confident {
                        report.correct_confident += 1;
                    }
                }
                *report
                    .status_counts
                    .entry(result.status.as_str().to_string())
                    .or_insert(0) += 1;
                QueryOutcome {
                    image_id: query.image_id.clone(),
                    ground_truth: query.building_id.clone(),
                    predicted: result.building_id,
                    status: Some(result.status),
                    correct,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Query {} rejected: {e}", query.image_id);
                report.errors += 1;
                QueryOutcome {
                    image_id: query.image_id.clone(),
                    ground_truth: query.building_id.clone(),
                    predicted: None,
                    status: None,
                    correct: false,
                    error: Some(e.to_string()),
                }
            }
        };

        let building = report
            .per_building
            .entry(query.building_id.clone())
            .or_default();
        building.total += 1;
        if outcome.correct {
            building.correct += 1;
        }
        report.outcomes.push(outcome);

        if (i + 1) % 10 == 0 {
            tracing::info!("Evaluated {}/{} queries", i + 1, queries.len());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::config::ClassifierConfig;

    fn query(building: &str, embedding: Vec<f32>) -> LabelledQuery {
        LabelledQuery {
            image_id: format!("{building}_q"),
            building_id: building.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_evaluate_counts_tiers_and_buildings() {
        let catalog = Catalog::from_entries(
            "v1",
            2,
            vec![
                CatalogEntry {
                    building_id: "a".to_string(),
                    image_id: None,
                    embedding: vec![1.0, 0.0],
                },
                CatalogEntry {
                    building_id: "b".to_string(),
                    image_id: None,
                    embedding: vec![0.0, 1.0],
                },
            ],
        )
        .unwrap();
        let classifier = Classifier::new(ClassifierConfig::default()).unwrap();

        let queries = vec![
            query("a", vec![1.0, 0.05]),  // confident a
            query("b", vec![0.05, 1.0]),  // confident b
            query("b", vec![1.0, 0.1]),   // confident a, wrong
            query("a", vec![-1.0, -1.0]), // no_match
            query("a", vec![1.0]),        // rejected
        ];
        let report = evaluate(&classifier, &catalog, &queries);

        assert_eq!(report.total, 5);
        assert_eq!(report.correct_confident, 2);
        assert_eq!(report.correct_any, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.status_counts["confident"], 3);
        assert_eq!(report.status_counts["no_match"], 1);
        assert_eq!(report.per_building["a"].total, 3);
        assert_eq!(report.per_building["a"].correct, 1);
        assert_eq!(report.per_building["b"].correct, 1);
        assert!((report.overall_accuracy() - 0.4).abs() < 1e-9);
        assert!(report.outcomes[4].error.is_some());
    }

    #[test]
    fn test_empty_report_has_zero_accuracy() {
        let report = EvaluationReport::default();
        assert_eq!(report.confident_accuracy(), 0.0);
        assert_eq!(report.overall_accuracy(), 0.0);
    }
}
