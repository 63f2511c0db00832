// src/models.rs
use chrono::{DateTime, Local, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A numbered stage of the remote evaluation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Phase {
    #[default]
    InitialResponse,
    QuestionEvaluation,
    SecondRound,
    CodeExtraction,
    MetricsComputation,
    Aggregation,
    CategoryAnalysis,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::InitialResponse,
        Phase::QuestionEvaluation,
        Phase::SecondRound,
        Phase::CodeExtraction,
        Phase::MetricsComputation,
        Phase::Aggregation,
        Phase::CategoryAnalysis,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::InitialResponse => "Initial Response",
            Phase::QuestionEvaluation => "Question Evaluation",
            Phase::SecondRound => "Second Round",
            Phase::CodeExtraction => "Code Extraction",
            Phase::MetricsComputation => "Metrics Computation",
            Phase::Aggregation => "Aggregation",
            Phase::CategoryAnalysis => "Category Analysis",
        }
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Phase::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("phase must be between 0 and 6, got {}", value))
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        phase.id()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}: {}", self.id(), self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvalOption {
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "manualRemove")]
    ManualRemove,
}

impl std::str::FromStr for EvalOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(EvalOption::Original),
            "manualRemove" => Ok(EvalOption::ManualRemove),
            other => Err(format!("unknown option '{}' (expected original or manualRemove)", other)),
        }
    }
}

impl fmt::Display for EvalOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalOption::Original => write!(f, "original"),
            EvalOption::ManualRemove => write!(f, "manualRemove"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub dataset: String,
    pub model: String,
    pub problem_text: String,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<EvalOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    pub text: String,
}

impl Problem {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }

    /// Both name and text carry something other than whitespace.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvaluationRequest {
    pub dataset: String,
    pub model: String,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<EvalOption>,
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(default)]
    pub problem_name: String,
    pub model: String,
    pub dataset: String,
    pub phase: Phase,
    pub response: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

/// Server-side snapshot of an asynchronous evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncSubmission {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvaluationResponse {
    pub dataset: String,
    pub model: String,
    pub total_problems: usize,
    #[serde(default)]
    pub timestamp: String,
    pub results: Vec<BatchResult>,
}

/// One entry of a batch response. The service only guarantees the problem name,
/// response and code; run parameters live on the enclosing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub problem_name: String,
    pub response: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Model names grouped by category (e.g. `openai`, `agents`), in server order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog(pub IndexMap<String, Vec<String>>);

impl ModelCatalog {
    pub fn categories(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Every model name across categories, in category order.
    pub fn all_models(&self) -> Vec<&str> {
        self.0.values().flatten().map(String::as_str).collect()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.0.values().flatten().any(|m| m == model)
    }

    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub description: String,
    pub problems: u32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

pub type DatasetCatalog = BTreeMap<String, DatasetInfo>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub name: String,
    pub description: String,
    pub output: String,
}

pub type PhaseCatalog = BTreeMap<String, PhaseInfo>;

/// Formats a server timestamp for display, falling back to the raw string.
///
/// The service emits both RFC 3339 and naive ISO-8601 (local time) values.
pub fn display_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phase_serializes_as_integer() {
        let value = serde_json::to_value(Phase::CodeExtraction).unwrap();
        assert_eq!(value, json!(3));

        let phase: Phase = serde_json::from_value(json!(6)).unwrap();
        assert_eq!(phase, Phase::CategoryAnalysis);
        assert_eq!(phase.to_string(), "Phase 6: Category Analysis");
    }

    #[test]
    fn phase_out_of_range_is_rejected() {
        assert!(serde_json::from_value::<Phase>(json!(7)).is_err());
        assert!(Phase::try_from(9).is_err());
    }

    #[test]
    fn request_omits_unset_tuning_fields() {
        let req = EvaluationRequest {
            dataset: "HumanEvalComm".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            problem_text: "Write a function that processes a list of strings".to_string(),
            phase: Phase::InitialResponse,
            temperature: None,
            topn: None,
            option: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "dataset": "HumanEvalComm",
                "model": "gpt-3.5-turbo",
                "problem_text": "Write a function that processes a list of strings",
                "phase": 0
            })
        );
    }

    #[test]
    fn option_uses_wire_names() {
        assert_eq!(serde_json::to_value(EvalOption::ManualRemove).unwrap(), json!("manualRemove"));
        assert_eq!("original".parse::<EvalOption>().unwrap(), EvalOption::Original);
        assert!("manual".parse::<EvalOption>().is_err());
    }

    #[test]
    fn task_without_id_or_result_parses() {
        let task: Task = serde_json::from_value(json!({
            "status": "running",
            "created_at": "2025-01-10T09:30:00.123456",
            "started_at": "2025-01-10T09:30:01.000000"
        }))
        .unwrap();
        assert_eq!(task.task_id, "");
        assert_eq!(task.status, TaskStatus::Running);
        assert!(!task.status.is_terminal());
        assert!(task.result.is_none());
    }

    #[test]
    fn nested_task_result_defaults_missing_fields() {
        let task: Task = serde_json::from_value(json!({
            "status": "completed",
            "created_at": "2025-01-10T09:30:00",
            "result": {
                "dataset": "HumanEval",
                "model": "gpt-4",
                "phase": 0,
                "response": "Mock response for testing",
                "code": "def mock_function():\n    return \"Hello World\"",
                "question_quality": "0",
                "answer": ""
            }
        }))
        .unwrap();
        assert!(task.status.is_terminal());
        let result = task.result.unwrap();
        assert_eq!(result.problem_name, "");
        assert_eq!(result.question_quality.as_deref(), Some("0"));
    }

    #[test]
    fn batch_entries_need_only_name_response_and_code() {
        let response: BatchEvaluationResponse = serde_json::from_value(json!({
            "dataset": "HumanEval",
            "model": "gpt-3.5-turbo",
            "total_problems": 1,
            "results": [{
                "problem_name": "add_numbers",
                "response": "Mock response for add_numbers",
                "code": "def add_numbers():\n    return \"Hello from add_numbers\"",
                "question_quality": "0",
                "answer": ""
            }],
            "timestamp": "2025-01-10T09:30:00.123456"
        }))
        .unwrap();
        let entry = &response.results[0];
        assert_eq!(entry.problem_name, "add_numbers");
        assert_eq!(entry.question_quality.as_deref(), Some("0"));
        assert!(entry.model.is_none() && entry.phase.is_none());
    }

    #[test]
    fn problem_completeness_trims_whitespace() {
        assert!(Problem::new("add", "Add two numbers").is_complete());
        assert!(!Problem::new("  ", "Add two numbers").is_complete());
        assert!(!Problem::new("add", "\n\t").is_complete());
    }

    #[test]
    fn model_catalog_flattens_categories() {
        let catalog: ModelCatalog = serde_json::from_value(json!({
            "openai": ["gpt-3.5-turbo", "gpt-4"],
            "agents": ["Okanagan", "AgentCoder"]
        }))
        .unwrap();
        assert_eq!(catalog.total(), 4);
        assert_eq!(catalog.all_models(), vec!["gpt-3.5-turbo", "gpt-4", "Okanagan", "AgentCoder"]);
        let categories: Vec<&String> = catalog.categories().map(|(name, _)| name).collect();
        assert_eq!(categories, ["openai", "agents"]);
        assert!(catalog.contains("gpt-4"));
        assert!(!catalog.contains("gpt-5"));
    }

    #[test]
    fn dataset_type_field_is_renamed() {
        let datasets: DatasetCatalog = serde_json::from_value(json!({
            "HumanEvalComm": {
                "description": "HumanEval with communication challenges",
                "problems": 762,
                "type": "modified",
                "categories": ["ambiguity", "inconsistency", "incompleteness"]
            }
        }))
        .unwrap();
        let info = &datasets["HumanEvalComm"];
        assert_eq!(info.kind, "modified");
        assert_eq!(info.categories.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn timestamps_display_leniently() {
        assert_eq!(display_timestamp("2025-01-10T09:30:00.123456"), "2025-01-10 09:30:00");
        assert_eq!(display_timestamp("not a time"), "not a time");
    }
}
