//! Core domain model and sync report types for smena.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "smena-core";

/// Staff position. Sheet cells carry free-text labels (Russian in the
/// authored source), mapped through a fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Hostess,
    Waiter,
    Bartender,
    Manager,
}

impl StaffRole {
    pub const ALL: [StaffRole; 4] = [
        StaffRole::Hostess,
        StaffRole::Waiter,
        StaffRole::Bartender,
        StaffRole::Manager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Hostess => "hostess",
            StaffRole::Waiter => "waiter",
            StaffRole::Bartender => "bartender",
            StaffRole::Manager => "manager",
        }
    }

    /// Case-insensitive vocabulary lookup. Unknown labels return `None`
    /// and the caller skips the row.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "хостес" | "hostess" => Some(StaffRole::Hostess),
            "официант" | "waiter" => Some(StaffRole::Waiter),
            "бармен" | "bartender" => Some(StaffRole::Bartender),
            "менеджер" | "manager" => Some(StaffRole::Manager),
            _ => None,
        }
    }
}

/// Which side of the venue a menu sheet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuSection {
    Kitchen,
    Bar,
}

impl MenuSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuSection::Kitchen => "kitchen",
            MenuSection::Bar => "bar",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "kitchen" => Some(MenuSection::Kitchen),
            "bar" => Some(MenuSection::Bar),
            _ => None,
        }
    }
}

/// Operational availability of a menu item. Set only by local operator
/// action, never authored in the source, and preserved across replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Normal,
    Stop,
    Go,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Normal => "normal",
            Availability::Stop => "stop",
            Availability::Go => "go",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Availability::Normal),
            "stop" => Some(Availability::Stop),
            "go" => Some(Availability::Go),
            _ => None,
        }
    }
}

/// Normalized staff-directory row handed from the source layer to the
/// reconciler. `phone` and `handle` are mutually exclusive and already
/// normalized for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDraft {
    pub full_name: String,
    pub phone: Option<String>,
    pub handle: Option<String>,
    pub role: StaffRole,
    pub branch: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemDraft {
    pub name: String,
    pub description: Option<String>,
    pub composition: Option<String>,
    pub weight_volume: Option<String>,
    pub price: f64,
    pub category: String,
    pub subcategory: Option<String>,
    pub section: MenuSection,
    /// Carried over from the stored row on a natural-key hit.
    pub availability: Availability,
    /// Carried over from the stored row on a natural-key hit.
    pub photo: Option<String>,
    pub calories: Option<i64>,
    pub proteins: Option<f64>,
    pub fats: Option<f64>,
    pub carbs: Option<f64>,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDraft {
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub topic: Option<String>,
    pub role: StaffRole,
    pub position: i64,
    pub branch: String,
    /// Remote reference from the sheet, consumed by the file materializer.
    pub file_url: Option<String>,
    /// Local path, filled in during reconciliation.
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDraft {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    pub position: i64,
    pub answers: Vec<AnswerDraft>,
}

/// One assessment definition: the test header comes from the first sheet
/// row naming its (title, role) pair, questions accumulate in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    pub role: StaffRole,
    pub passing_score: i64,
    pub max_attempts: i64,
    pub seconds_per_question: i64,
    pub branch: String,
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistDraft {
    pub role: StaffRole,
    pub category: Option<String>,
    pub task: String,
    pub position: i64,
    pub branch: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmployeeReport {
    pub created: usize,
    pub updated: usize,
    pub deactivated: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MenuReport {
    pub inserted: usize,
    pub carried_status: usize,
    pub carried_photos: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingReport {
    pub inserted: usize,
    pub files_downloaded: usize,
    pub files_kept: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssessmentReport {
    pub tests: usize,
    pub questions: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChecklistReport {
    pub inserted: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MotivationReport {
    pub inserted: usize,
    pub error: Option<String>,
}

/// Aggregated outcome of one reconciliation run. `success` is false only
/// when the initial source connection failed and the run was aborted; a
/// per-domain failure is captured in that domain's `error` and leaves the
/// flag untouched (inspect `domain_errors()` for those).
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub connect_error: Option<String>,
    pub employees: EmployeeReport,
    pub menu: MenuReport,
    pub training: TrainingReport,
    pub assessments: AssessmentReport,
    pub checklists: ChecklistReport,
    pub motivation: MotivationReport,
}

impl SyncReport {
    pub fn new(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            success: true,
            connect_error: None,
            employees: EmployeeReport::default(),
            menu: MenuReport::default(),
            training: TrainingReport::default(),
            assessments: AssessmentReport::default(),
            checklists: ChecklistReport::default(),
            motivation: MotivationReport::default(),
        }
    }

    /// Domain errors collected across the run, for operator display.
    pub fn domain_errors<'a>(&'a self) -> Vec<(&'static str, &'a str)> {
        let mut out = Vec::new();
        let mut push = |domain: &'static str, err: &'a Option<String>| {
            if let Some(err) = err.as_deref() {
                out.push((domain, err));
            }
        };
        push("employees", &self.employees.error);
        push("menu", &self.menu.error);
        push("training", &self.training.error);
        push("assessments", &self.assessments.error);
        push("checklists", &self.checklists.error);
        push("motivation", &self.motivation.error);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_vocabulary_accepts_both_languages() {
        assert_eq!(StaffRole::parse("Официант"), Some(StaffRole::Waiter));
        assert_eq!(StaffRole::parse("  менеджер "), Some(StaffRole::Manager));
        assert_eq!(StaffRole::parse("BARTENDER"), Some(StaffRole::Bartender));
        assert_eq!(StaffRole::parse("повар"), None);
    }

    #[test]
    fn availability_round_trips_through_text() {
        for value in [Availability::Normal, Availability::Stop, Availability::Go] {
            assert_eq!(Availability::parse(value.as_str()), Some(value));
        }
        assert_eq!(Availability::parse("paused"), None);
    }
}
