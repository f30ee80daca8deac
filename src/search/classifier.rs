use std::cmp::Ordering;

use crate::catalog::Catalog;
use crate::config::ClassifierConfig;
use crate::error::{ConfigError, IdentifyError};
use crate::models::{ClassificationResult, ClassificationStatus, MatchSummary};
use crate::search::similarity::{score_all, ScoredCandidate};

/// Ranking & voting classifier.
///
/// Pipeline for one query:
/// 1. Score every catalog entry (cosine similarity).
/// 2. Stable sort descending, keep the top K. Equal scores stay in catalog order.
/// 3. Entries at or above the backup threshold vote for their building.
/// 4. Plurality winner: most votes, then highest single score, then the
///    building whose first vote ranks highest in the top K.
/// 5. Tier: `confident` if the winner has a vote at or above the confidence
///    threshold, `uncertain` if it does not, `no_match` if nobody voted.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    config: ClassifierConfig,
}

/// Votes collected by one building among the top K.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteTally {
    pub building_id: String,
    pub votes: usize,
    pub best_score: f32,
    /// Position of the building's first vote within the top K
    pub first_vote: usize,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a query embedding against `catalog`.
    pub fn classify(
        &self,
        catalog: &Catalog,
        query: &[f32],
    ) -> Result<ClassificationResult, IdentifyError> {
        let top = self.rank(catalog, query)?;
        let result = self.decide(&top);
        tracing::debug!(
            status = result.status.as_str(),
            building_id = ?result.building_id,
            confidence = result.confidence,
            "classified query against catalog {}",
            catalog.version()
        );
        Ok(result)
    }

    /// The top-K scored entries for `query`, best first.
    pub fn rank<'a>(
        &self,
        catalog: &'a Catalog,
        query: &[f32],
    ) -> Result<Vec<ScoredCandidate<'a>>, IdentifyError> {
        let mut scored = score_all(query, catalog)?;
        // `sort_by` is stable, so ties keep catalog order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(self.config.top_k);
        Ok(scored)
    }

    /// Count votes per building among `top` entries at or above the backup
    /// threshold. Tallies come back in order of first vote.
    pub fn tally_votes(&self, top: &[ScoredCandidate<'_>]) -> Vec<VoteTally> {
        let mut tallies: Vec<VoteTally> = Vec::new();

        for (rank, candidate) in top
            .iter()
            .enumerate()
            .filter(|(_, c)| c.score >= self.config.backup_threshold)
        {
            let building_id = &candidate.entry.building_id;
            match tallies.iter_mut().find(|t| &t.building_id == building_id) {
                Some(tally) => {
                    tally.votes += 1;
                    tally.best_score = tally.best_score.max(candidate.score);
                }
                None => tallies.push(VoteTally {
                    building_id: building_id.clone(),
                    votes: 1,
                    best_score: candidate.score,
                    first_vote: rank,
                }),
            }
        }

        tallies
    }

    /// Turn ranked candidates into a classification decision.
    pub fn decide(&self, top: &[ScoredCandidate<'_>]) -> ClassificationResult {
        let matches = top
            .iter()
            .map(|c| MatchSummary {
                building_id: c.entry.building_id.clone(),
                similarity: c.score,
                image_id: c.entry.image_id.clone(),
            })
            .collect();

        let winner = self
            .tally_votes(top)
            .into_iter()
            .reduce(|best, next| {
                if beats(&next, &best) {
                    next
                } else {
                    best
                }
            });

        match winner {
            Some(winner) => {
                let status = if winner.best_score >= self.config.confidence_threshold {
                    ClassificationStatus::Confident
                } else {
                    ClassificationStatus::Uncertain
                };
                ClassificationResult {
                    status,
                    building_id: Some(winner.building_id),
                    confidence: winner.best_score,
                    matches,
                }
            }
            None => ClassificationResult {
                status: ClassificationStatus::NoMatch,
                building_id: None,
                // Best raw score, kept for diagnostics even though it is below threshold
                confidence: top.first().map_or(0.0, |c| c.score),
                matches,
            },
        }
    }
}

/// Plurality order: more votes, then higher best score, then earlier first vote.
fn beats(a: &VoteTally, b: &VoteTally) -> bool {
    match a.votes.cmp(&b.votes) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match a.best_score.partial_cmp(&b.best_score) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Less) => false,
            _ => a.first_vote < b.first_vote,
        },
    }
}
