//! Query results returned to callers.

use crate::citation::SourceInfo;
use crate::error::PrekenError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a query was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// The model answered from retrieved sermon excerpts.
    Answered,
    /// Something failed; the answer explains what.
    Degraded,
    /// The engine was not ready to take questions.
    NotReady,
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStatus::Answered => "answered",
            QueryStatus::Degraded => "degraded",
            QueryStatus::NotReady => "not_ready",
        };
        f.write_str(s)
    }
}

/// An answer with the sermons it drew on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    /// The generated answer, or an explanation when no answer was produced.
    pub answer: String,
    /// Citations in retrieval order.
    pub sources: Vec<SourceInfo>,
    pub source_count: usize,
    pub status: QueryStatus,
}

impl QueryResult {
    pub fn answered(question: &str, answer: String, sources: Vec<SourceInfo>) -> Self {
        Self {
            question: question.to_string(),
            answer,
            source_count: sources.len(),
            sources,
            status: QueryStatus::Answered,
        }
    }

    /// A result describing a failure instead of raising it.
    pub fn degraded(question: &str, error: &PrekenError) -> Self {
        Self {
            question: question.to_string(),
            answer: format!(
                "Sorry, I encountered an error while processing your question: {}",
                error
            ),
            sources: Vec::new(),
            source_count: 0,
            status: QueryStatus::Degraded,
        }
    }

    pub fn not_ready(question: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: "The sermon library is still initializing. Please try again in a moment."
                .to_string(),
            sources: Vec::new(),
            source_count: 0,
            status: QueryStatus::NotReady,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == QueryStatus::Answered
    }
}
