use crate::catalog::{Catalog, CatalogEntry};
use crate::error::IdentifyError;

/// A catalog entry paired with its similarity to the current query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    /// Position of the entry in the catalog
    pub position: usize,
    pub entry: &'a CatalogEntry,
    pub score: f32,
}

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// Accumulates in f64 and clamps the result to absorb rounding. Unlike a
/// lenient search helper, a length mismatch or a zero-magnitude vector is
/// an error rather than a score of 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, IdentifyError> {
    if a.len() != b.len() {
        return Err(IdentifyError::DimensionMismatch {
            expected: b.len(),
            got: a.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(IdentifyError::InvalidVector(
            "similarity against a zero-magnitude vector is undefined".to_string(),
        ));
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(similarity.clamp(-1.0, 1.0) as f32)
}

/// Score `query` against one catalog entry.
pub fn score(query: &[f32], entry: &CatalogEntry) -> Result<f32, IdentifyError> {
    cosine_similarity(query, &entry.embedding)
}

/// Check a query embedding before any scoring happens.
pub fn validate_query(query: &[f32], dimension: usize) -> Result<(), IdentifyError> {
    if query.len() != dimension {
        return Err(IdentifyError::DimensionMismatch {
            expected: dimension,
            got: query.len(),
        });
    }
    if let Some(i) = query.iter().position(|x| !x.is_finite()) {
        return Err(IdentifyError::InvalidQuery(format!(
            "component {i} is not a finite number"
        )));
    }
    if query.iter().all(|x| *x == 0.0) {
        return Err(IdentifyError::InvalidVector(
            "query embedding has zero magnitude".to_string(),
        ));
    }
    Ok(())
}

/// Score `query` against every catalog entry, in catalog order.
///
/// Exhaustive O(N·D) scan; the query is validated up front so a bad query
/// never yields a partial result.
pub fn score_all<'a>(
    query: &[f32],
    catalog: &'a Catalog,
) -> Result<Vec<ScoredCandidate<'a>>, IdentifyError> {
    validate_query(query, catalog.dimension())?;

    catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            Ok(ScoredCandidate {
                position,
                entry,
                score: score(query, entry)?,
            })
        })
        .collect()
}
