//! Ticket and AI output shapes.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Fields of a Jira issue the panel sends for clarification / code generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl IssueData {
    pub const DEFAULT_ISSUE_TYPE: &'static str = "Task";
    pub const DEFAULT_PRIORITY: &'static str = "Medium";

    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_issue_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = Some(issue_type.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Clarification needs something to clarify.
    pub fn validate_for_clarification(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("issue title must not be empty"));
        }
        Ok(())
    }

    pub fn issue_type_or_default(&self) -> &str {
        non_blank(self.issue_type.as_deref()).unwrap_or(Self::DEFAULT_ISSUE_TYPE)
    }

    pub fn priority_or_default(&self) -> &str {
        non_blank(self.priority.as_deref()).unwrap_or(Self::DEFAULT_PRIORITY)
    }

    /// Markdown document handed to code generation: title as a heading,
    /// then the (already clarified) description.
    pub fn jira_description(&self) -> String {
        let title = match self.title.trim() {
            "" => "Untitled",
            t => t,
        };
        format!("# {title}\n\n{}", self.description)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Structured clarification produced by the AI backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarifiedOutput {
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub edge_cases: Vec<String>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
    #[serde(default)]
    pub test_scenarios: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

impl ClarifiedOutput {
    /// Sections in display order, paired with their heading.
    pub fn sections(&self) -> [(Section, &[String]); 4] {
        [
            (Section::AcceptanceCriteria, self.acceptance_criteria.as_slice()),
            (Section::EdgeCases, self.edge_cases.as_slice()),
            (Section::SuccessMetrics, self.success_metrics.as_slice()),
            (Section::TestScenarios, self.test_scenarios.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.sections().iter().all(|(_, items)| items.is_empty())
    }
}

/// A clarification section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    AcceptanceCriteria,
    EdgeCases,
    SuccessMetrics,
    TestScenarios,
}

impl Section {
    pub fn heading(self) -> &'static str {
        match self {
            Section::AcceptanceCriteria => "✅ Acceptance Criteria",
            Section::EdgeCases => "⚠️ Edge Cases",
            Section::SuccessMetrics => "📊 Success Metrics",
            Section::TestScenarios => "🧪 Test Scenarios",
        }
    }
}

/// Code generation output produced by the AI backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGenOutput {
    pub implementation: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}
