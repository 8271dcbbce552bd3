//! Rating criteria and rated repository types.

use crate::fetcher::RepositorySummary;
use serde::{Deserialize, Serialize};

/// Highest rating a repository can get.
pub const MAX_RATING: u8 = 10;

/// One scored heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCriterion {
    /// Points awarded, in `0..=max_score`.
    pub score: u8,

    /// Points available.
    pub max_score: u8,

    /// Number of offending items, for criteria that count something.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl RatingCriterion {
    /// A criterion without a count.
    #[must_use]
    pub fn new(score: u8, max_score: u8) -> Self {
        Self {
            score: score.min(max_score),
            max_score,
            count: None,
        }
    }

    /// A criterion that counts offending items.
    #[must_use]
    pub fn counted(score: u8, max_score: u8, count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::new(score, max_score)
        }
    }
}

/// Scores for all four heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCriteria {
    pub description: RatingCriterion,
    pub readme: RatingCriterion,
    pub stale_branches: RatingCriterion,
    pub old_pull_requests: RatingCriterion,
}

impl RatingCriteria {
    fn all(&self) -> [&RatingCriterion; 4] {
        [
            &self.description,
            &self.readme,
            &self.stale_branches,
            &self.old_pull_requests,
        ]
    }

    /// Sum of awarded points.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.all().iter().map(|c| u32::from(c.score)).sum()
    }

    /// Sum of available points.
    #[must_use]
    pub fn total_max_score(&self) -> u32 {
        self.all().iter().map(|c| u32::from(c.max_score)).sum()
    }

    /// Overall rating: the score ratio scaled to `0..=10`, rounded half up.
    #[must_use]
    pub fn rating(&self) -> u8 {
        let max = self.total_max_score();
        if max == 0 {
            return 0;
        }
        let scaled = u32::from(MAX_RATING) * self.total_score();
        // (2 * scaled + max) / (2 * max) == floor(scaled / max + 0.5)
        let rounded = (2 * scaled + max) / (2 * max);
        rounded.min(u32::from(MAX_RATING)) as u8
    }
}

/// A repository together with its derived rating.
///
/// The rating is recomputed from `ratingDetails` when deserializing, so a
/// stored or transmitted `rating` never overrides the details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RatedRepositoryWire")]
pub struct RatedRepository {
    #[serde(flatten)]
    pub repository: RepositorySummary,

    rating: u8,

    #[serde(rename = "ratingDetails")]
    pub rating_details: RatingCriteria,
}

impl RatedRepository {
    /// Attaches rating details to a repository, deriving the overall rating.
    #[must_use]
    pub fn new(repository: RepositorySummary, rating_details: RatingCriteria) -> Self {
        Self {
            rating: rating_details.rating(),
            repository,
            rating_details,
        }
    }

    /// Overall rating in `0..=10`.
    #[must_use]
    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// Repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.repository.name
    }
}

/// Serialized shape of [`RatedRepository`]; any `rating` field is ignored.
#[derive(Deserialize)]
struct RatedRepositoryWire {
    #[serde(flatten)]
    repository: RepositorySummary,

    #[serde(rename = "ratingDetails")]
    rating_details: RatingCriteria,
}

impl From<RatedRepositoryWire> for RatedRepository {
    fn from(wire: RatedRepositoryWire) -> Self {
        Self::new(wire.repository, wire.rating_details)
    }
}
