use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::Question;

/// A quiz as served for taking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Whole-attempt time limit in minutes.
    #[serde(default)]
    #[validate(range(min = 1, max = 1440))]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit.map(|minutes| minutes.saturating_mul(60))
    }

    pub fn total_points(&self) -> i32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}
