//! Coverage classification: cosine similarity over the joint vector space.

use crate::error::{CoverageError, Result};
use crate::vectorize::VectorSpace;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Issue text attached to every missed requirement.
pub const MISSING_ISSUE: &str = "Requirement not found in design";

/// Calculate cosine similarity between two vectors
/// Returns 0.0 if dimensions don't match or either vector is all zeros
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        warn!(
            "cosine_similarity dimension mismatch: a={}, b={}",
            a.len(),
            b.len()
        );
        return 0.0;
    }
    if a.is_empty() {
        return 0.0;
    }
    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product / (norm_a * norm_b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    Present,
    Missing,
}

/// Verdict for a single requirement, in requirement order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageVerdict {
    pub requirement: String,
    pub coverage: CoverageStatus,
    /// Highest similarity against any design statement, 0.0 with no design.
    pub similarity_score: f64,
    /// Every design statement scoring at or above the threshold, in design order.
    pub matched_design_items: Vec<String>,
    /// Empty for covered requirements.
    pub issue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_requirements: usize,
    pub total_design_items: usize,
    pub covered_requirements: usize,
    pub missing_requirements: usize,
    pub coverage_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub verdicts: Vec<CoverageVerdict>,
    pub summary: AnalysisSummary,
}

/// Classify every requirement against the design set.
///
/// An empty design set makes every requirement Missing regardless of
/// threshold. The threshold itself must be within [0.0, 1.0].
pub fn classify(
    space: &VectorSpace,
    requirements: &[String],
    design: &[String],
    threshold: f64,
) -> Result<Vec<CoverageVerdict>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CoverageError::InvalidThreshold { value: threshold });
    }
    if space.requirement_vectors.len() != requirements.len()
        || space.design_vectors.len() != design.len()
    {
        return Err(CoverageError::Vectorization {
            message: format!(
                "vector space holds {}x{} vectors but {}x{} statements were given",
                space.requirement_vectors.len(),
                space.design_vectors.len(),
                requirements.len(),
                design.len()
            ),
        });
    }

    let verdicts = requirements
        .iter()
        .zip(space.requirement_vectors.iter())
        .map(|(requirement, req_vec)| {
            let scores: Vec<f64> = space
                .design_vectors
                .iter()
                .map(|design_vec| cosine_similarity(req_vec, design_vec))
                .collect();
            // TF-IDF weights are non-negative, so 0.0 is an exact floor.
            let max_score = scores.iter().copied().fold(0.0, f64::max);
            let covered = !design.is_empty() && max_score >= threshold;
            let matched_design_items: Vec<String> = design
                .iter()
                .zip(scores.iter())
                .filter(|&(_, &score)| score >= threshold)
                .map(|(item, _)| item.clone())
                .collect();

            CoverageVerdict {
                requirement: requirement.clone(),
                coverage: if covered {
                    CoverageStatus::Present
                } else {
                    CoverageStatus::Missing
                },
                similarity_score: max_score,
                matched_design_items,
                issue: if covered {
                    String::new()
                } else {
                    MISSING_ISSUE.to_string()
                },
            }
        })
        .collect();

    Ok(verdicts)
}

/// Build a fresh vector space, classify, and aggregate the summary.
pub fn analyze(
    requirements: &[String],
    design: &[String],
    threshold: f64,
) -> Result<AnalysisReport> {
    let space = VectorSpace::build(requirements, design);
    let verdicts = classify(&space, requirements, design, threshold)?;

    let covered = verdicts
        .iter()
        .filter(|v| v.coverage == CoverageStatus::Present)
        .count();
    let total = requirements.len();
    let summary = AnalysisSummary {
        total_requirements: total,
        total_design_items: design.len(),
        covered_requirements: covered,
        missing_requirements: total - covered,
        coverage_percent: if total == 0 {
            0.0
        } else {
            covered as f64 / total as f64 * 100.0
        },
    };

    Ok(AnalysisReport { verdicts, summary })
}
