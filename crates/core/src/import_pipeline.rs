//! Import/report pipeline steps, wire types, and session state machine.
//!
//! The wizard moves `upload -> mapping -> preview -> execution -> complete`
//! one step at a time. The only backward moves are `mapping -> upload` and
//! `preview -> mapping`; once the import is confirmed there is no way back.
//!
//! [`ImportSession`] holds the data each step produced. Each `apply_*`
//! method checks the current step, replaces that step's data wholesale and
//! advances. A failed server call never reaches these methods, so the
//! session stays on the step it was on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::{ColumnMapping, SessionId};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// The five wizard steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    #[default]
    Upload,
    Mapping,
    Preview,
    Execution,
    Complete,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 5] = [
        Self::Upload,
        Self::Mapping,
        Self::Preview,
        Self::Execution,
        Self::Complete,
    ];

    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "upload" => Ok(Self::Upload),
            "mapping" => Ok(Self::Mapping),
            "preview" => Ok(Self::Preview),
            "execution" => Ok(Self::Execution),
            "complete" => Ok(Self::Complete),
            _ => Err(CoreError::Validation(format!(
                "Invalid pipeline step '{s}'. Must be one of: upload, mapping, preview, execution, complete"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Mapping => "mapping",
            Self::Preview => "preview",
            Self::Execution => "execution",
            Self::Complete => "complete",
        }
    }

    /// 1-based position in the wizard.
    pub fn to_number(self) -> u8 {
        match self {
            Self::Upload => 1,
            Self::Mapping => 2,
            Self::Preview => 3,
            Self::Execution => 4,
            Self::Complete => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Upload => "Upload File",
            Self::Mapping => "Map Columns",
            Self::Preview => "Preview",
            Self::Execution => "Importing",
            Self::Complete => "Complete",
        }
    }

    /// The step a user may go back to, if any.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Mapping => Some(Self::Upload),
            Self::Preview => Some(Self::Mapping),
            _ => None,
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a step transition.
///
/// Valid moves are exactly one step forward, or one of the two allowed
/// backward moves (`mapping -> upload`, `preview -> mapping`).
pub fn validate_step_transition(from: PipelineStep, to: PipelineStep) -> Result<(), CoreError> {
    let forward = to.to_number() == from.to_number() + 1;
    let backward = from.previous() == Some(to);
    if !forward && !backward {
        return Err(CoreError::Validation(format!(
            "Cannot transition from step '{from}' to step '{to}'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress status
// ---------------------------------------------------------------------------

/// Server-reported import status. `COMPLETED` and `FAILED` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImportStatus {
    Pending,
    Validating,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl ImportStatus {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "VALIDATING" => Self::Validating,
            "PROCESSING" => Self::Processing,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Validating => "VALIDATING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Other(s) => s,
        }
    }

    /// Polling stops and the wizard completes once a terminal status is seen.
    /// A failed import is terminal, not an error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<String> for ImportStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ImportStatus> for String {
    fn from(status: ImportStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Result of analyzing an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub session_id: SessionId,
    /// Server-suggested mapping; seeds the editable mapping.
    #[serde(default)]
    pub column_mapping: ColumnMapping,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of the import preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub row_number: u64,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl PreviewRow {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of generating a preview with the confirmed mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    #[serde(default)]
    pub rows: Vec<PreviewRow>,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub valid_rows: u64,
    #[serde(default)]
    pub error_rows: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of confirming (starting) the import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmResult {
    pub session_id: SessionId,
    #[serde(default)]
    pub status: Option<ImportStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A polled progress snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub status: ImportStatus,
    #[serde(default)]
    pub processed_rows: u64,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub error_count: u64,
}

impl ImportProgress {
    /// Percentage of rows processed, 0-100. An unknown total reports 0.
    pub fn percent(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        (self.processed_rows as f64 / self.total_rows as f64 * 100.0).min(100.0)
    }
}

/// A row-level error in the final session detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row_number: u64,
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

/// Final session detail shown on the complete step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSessionDetail {
    pub session_id: SessionId,
    pub status: ImportStatus,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub errors: Vec<ImportRowError>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A selectable import target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub value: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Session state machine
// ---------------------------------------------------------------------------

/// All client-side state of one import wizard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSession {
    step: PipelineStep,
    analyze_result: Option<AnalyzeResult>,
    preview_result: Option<PreviewResult>,
    confirm_result: Option<ConfirmResult>,
    edited_mapping: ColumnMapping,
    last_progress: Option<ImportProgress>,
    session_detail: Option<ImportSessionDetail>,
    last_error: Option<String>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> PipelineStep {
        self.step
    }

    pub fn analyze_result(&self) -> Option<&AnalyzeResult> {
        self.analyze_result.as_ref()
    }

    pub fn preview_result(&self) -> Option<&PreviewResult> {
        self.preview_result.as_ref()
    }

    pub fn confirm_result(&self) -> Option<&ConfirmResult> {
        self.confirm_result.as_ref()
    }

    pub fn edited_mapping(&self) -> &ColumnMapping {
        &self.edited_mapping
    }

    pub fn last_progress(&self) -> Option<&ImportProgress> {
        self.last_progress.as_ref()
    }

    pub fn session_detail(&self) -> Option<&ImportSessionDetail> {
        self.session_detail.as_ref()
    }

    /// The most recent user-visible failure message, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The most recently known session id: the confirmation's once it
    /// exists, otherwise the analysis result's.
    pub fn session_id(&self) -> Option<SessionId> {
        self.confirm_result
            .as_ref()
            .map(|c| c.session_id)
            .or_else(|| self.analyze_result.as_ref().map(|a| a.session_id))
    }

    /// Fail unless the wizard is on `expected`.
    pub fn ensure_step(&self, expected: PipelineStep, action: &str) -> Result<(), CoreError> {
        if self.step != expected {
            return Err(CoreError::Validation(format!(
                "Cannot {action} while on the '{}' step (expected '{expected}')",
                self.step
            )));
        }
        Ok(())
    }

    /// Session id required by every step after upload.
    pub fn require_session_id(&self) -> Result<SessionId, CoreError> {
        self.session_id()
            .ok_or_else(|| CoreError::Validation("Import session has not been analyzed".into()))
    }

    fn advance_to(&mut self, next: PipelineStep) -> Result<(), CoreError> {
        validate_step_transition(self.step, next)?;
        self.step = next;
        self.last_error = None;
        Ok(())
    }

    /// Store the analysis, seed the editable mapping, and move to mapping.
    pub fn apply_analysis(&mut self, result: AnalyzeResult) -> Result<(), CoreError> {
        self.ensure_step(PipelineStep::Upload, "analyze a file")?;
        self.edited_mapping = result.column_mapping.clone();
        self.analyze_result = Some(result);
        // A preview belongs to the previous analysis.
        self.preview_result = None;
        self.advance_to(PipelineStep::Mapping)
    }

    /// Map a source column to a target field. An empty target skips the
    /// column.
    pub fn set_mapping(&mut self, source: &str, target: &str) -> Result<(), CoreError> {
        self.ensure_step(PipelineStep::Mapping, "edit the column mapping")?;
        let known = self.edited_mapping.contains_key(source)
            || self
                .analyze_result
                .as_ref()
                .is_some_and(|a| a.headers.iter().any(|h| h == source));
        if !known {
            return Err(CoreError::NotFound {
                entity: "SourceColumn",
                id: source.to_string(),
            });
        }
        self.edited_mapping
            .insert(source.to_string(), target.to_string());
        Ok(())
    }

    /// Store the preview and move to preview.
    pub fn apply_preview(&mut self, result: PreviewResult) -> Result<(), CoreError> {
        self.ensure_step(PipelineStep::Mapping, "generate a preview")?;
        self.preview_result = Some(result);
        self.advance_to(PipelineStep::Preview)
    }

    /// Store the confirmation (which supersedes the session id) and move to
    /// execution.
    pub fn apply_confirmation(&mut self, result: ConfirmResult) -> Result<(), CoreError> {
        self.ensure_step(PipelineStep::Preview, "confirm the import")?;
        self.confirm_result = Some(result);
        self.advance_to(PipelineStep::Execution)
    }

    /// Record a polled progress snapshot. Returns `true` when the status is
    /// terminal and the wizard moved to complete.
    pub fn observe_progress(&mut self, progress: ImportProgress) -> Result<bool, CoreError> {
        self.ensure_step(PipelineStep::Execution, "record import progress")?;
        let terminal = progress.status.is_terminal();
        self.last_progress = Some(progress);
        if terminal {
            self.advance_to(PipelineStep::Complete)?;
        }
        Ok(terminal)
    }

    /// Store the final session detail shown on the complete step.
    pub fn apply_session_detail(&mut self, detail: ImportSessionDetail) -> Result<(), CoreError> {
        self.ensure_step(PipelineStep::Complete, "show the session detail")?;
        self.session_detail = Some(detail);
        Ok(())
    }

    /// Go back one step. Data already collected is kept so edits survive.
    pub fn go_back(&mut self) -> Result<PipelineStep, CoreError> {
        let previous = self.step.previous().ok_or_else(|| {
            CoreError::Validation(format!("Cannot go back from the '{}' step", self.step))
        })?;
        self.advance_to(previous)?;
        Ok(previous)
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Return to upload and discard everything. Purely client-side.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn sid(n: u128) -> SessionId {
        SessionId::from_u128(n)
    }

    fn analysis(id: u128) -> AnalyzeResult {
        serde_json::from_value(json!({
            "session_id": sid(id),
            "column_mapping": { "Emp No": "employee_number", "Basic": "basic_salary", "Notes": "" },
            "headers": ["Emp No", "Basic", "Notes", "Bank"],
            "total_rows": 3,
            "sheet_name": "Payroll"
        }))
        .unwrap()
    }

    fn confirmation(id: u128) -> ConfirmResult {
        ConfirmResult {
            session_id: sid(id),
            status: Some(ImportStatus::Pending),
            extra: Map::new(),
        }
    }

    fn progress(status: ImportStatus) -> ImportProgress {
        ImportProgress {
            status,
            processed_rows: 1,
            total_rows: 4,
            success_count: 1,
            error_count: 0,
        }
    }

    fn at_execution() -> ImportSession {
        let mut session = ImportSession::new();
        session.apply_analysis(analysis(1)).unwrap();
        session.apply_preview(PreviewResult::default()).unwrap();
        session.apply_confirmation(confirmation(2)).unwrap();
        session
    }

    // -- PipelineStep --

    #[test]
    fn step_from_str_roundtrip() {
        for step in PipelineStep::ALL {
            assert_eq!(PipelineStep::from_str_db(step.as_str()).unwrap(), step);
            assert!(!step.label().is_empty());
        }
        assert!(PipelineStep::from_str_db("done").is_err());
    }

    #[test]
    fn step_numbers_are_sequential() {
        for (i, step) in PipelineStep::ALL.iter().enumerate() {
            assert_eq!(step.to_number() as usize, i + 1);
        }
    }

    // -- validate_step_transition --

    #[test]
    fn forward_by_one_is_valid() {
        for pair in PipelineStep::ALL.windows(2) {
            assert!(validate_step_transition(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn only_two_backward_moves_exist() {
        use PipelineStep::*;
        assert!(validate_step_transition(Mapping, Upload).is_ok());
        assert!(validate_step_transition(Preview, Mapping).is_ok());
        assert!(validate_step_transition(Execution, Preview).is_err());
        assert!(validate_step_transition(Complete, Execution).is_err());
        assert!(validate_step_transition(Preview, Upload).is_err());
    }

    #[test]
    fn skipping_and_staying_are_invalid() {
        use PipelineStep::*;
        assert!(validate_step_transition(Upload, Preview).is_err());
        assert!(validate_step_transition(Mapping, Execution).is_err());
        assert!(validate_step_transition(Upload, Upload).is_err());
    }

    // -- ImportStatus --

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(ImportStatus::Completed.is_terminal());
        assert!(ImportStatus::Failed.is_terminal());
        assert!(!ImportStatus::Pending.is_terminal());
        assert!(!ImportStatus::Processing.is_terminal());
        assert!(!ImportStatus::Other("QUEUED".into()).is_terminal());
    }

    #[test]
    fn status_parses_case_insensitively() {
        let status: ImportStatus = serde_json::from_value(json!("completed")).unwrap();
        assert_eq!(status, ImportStatus::Completed);
        assert_eq!(serde_json::to_value(ImportStatus::Failed).unwrap(), json!("FAILED"));
        assert_eq!(ImportStatus::parse("queued"), ImportStatus::Other("queued".into()));
    }

    #[test]
    fn progress_percent() {
        assert_eq!(progress(ImportStatus::Processing).percent(), 25.0);
        let unknown = ImportProgress {
            total_rows: 0,
            ..progress(ImportStatus::Pending)
        };
        assert_eq!(unknown.percent(), 0.0);
    }

    // -- wire types --

    #[test]
    fn analyze_result_keeps_unknown_fields() {
        let result = analysis(1);
        assert_eq!(result.extra.get("sheet_name"), Some(&json!("Payroll")));
        assert_eq!(result.column_mapping.get_index(0).map(|(k, _)| k.as_str()), Some("Emp No"));
    }

    // -- ImportSession --

    #[test]
    fn new_session_starts_at_upload() {
        let session = ImportSession::new();
        assert_eq!(session.step(), PipelineStep::Upload);
        assert_eq!(session.session_id(), None);
        assert!(session.require_session_id().is_err());
    }

    #[test]
    fn analysis_seeds_mapping_and_advances() {
        let mut session = ImportSession::new();
        session.apply_analysis(analysis(1)).unwrap();

        assert_eq!(session.step(), PipelineStep::Mapping);
        assert_eq!(session.session_id(), Some(sid(1)));
        assert_eq!(session.edited_mapping().get("Basic").map(String::as_str), Some("basic_salary"));
    }

    #[test]
    fn mapping_edits_known_columns_only() {
        let mut session = ImportSession::new();
        session.apply_analysis(analysis(1)).unwrap();

        session.set_mapping("Bank", "bank_account").unwrap();
        session.set_mapping("Basic", "").unwrap();
        assert_eq!(session.edited_mapping()["Bank"], "bank_account");
        assert_eq!(session.edited_mapping()["Basic"], "");
        assert_eq!(
            session.analyze_result().unwrap().column_mapping["Basic"],
            "basic_salary"
        );

        assert_matches!(
            session.set_mapping("Unknown", "x"),
            Err(CoreError::NotFound { entity: "SourceColumn", .. })
        );
    }

    #[test]
    fn steps_cannot_be_applied_out_of_order() {
        let mut session = ImportSession::new();
        assert!(session.apply_preview(PreviewResult::default()).is_err());
        assert!(session.apply_confirmation(confirmation(2)).is_err());
        assert!(session.observe_progress(progress(ImportStatus::Completed)).is_err());
        assert!(session.set_mapping("Basic", "x").is_err());
        assert_eq!(session.step(), PipelineStep::Upload);
    }

    #[test]
    fn confirmation_supersedes_session_id() {
        let session = at_execution();
        assert_eq!(session.step(), PipelineStep::Execution);
        assert_eq!(session.session_id(), Some(sid(2)));
    }

    #[test]
    fn non_terminal_progress_never_completes() {
        let mut session = at_execution();
        for _ in 0..10 {
            assert!(!session.observe_progress(progress(ImportStatus::Processing)).unwrap());
        }
        assert_eq!(session.step(), PipelineStep::Execution);
    }

    #[test]
    fn terminal_progress_completes() {
        for status in [ImportStatus::Completed, ImportStatus::Failed] {
            let mut session = at_execution();
            assert!(session.observe_progress(progress(status.clone())).unwrap());
            assert_eq!(session.step(), PipelineStep::Complete);
            assert_eq!(session.last_progress().map(|p| &p.status), Some(&status));
        }
    }

    #[test]
    fn go_back_only_from_mapping_and_preview() {
        let mut session = ImportSession::new();
        assert!(session.go_back().is_err());

        session.apply_analysis(analysis(1)).unwrap();
        session.apply_preview(PreviewResult::default()).unwrap();
        assert_eq!(session.go_back().unwrap(), PipelineStep::Mapping);
        assert_eq!(session.go_back().unwrap(), PipelineStep::Upload);
        assert!(session.analyze_result().is_some());

        let mut session = at_execution();
        assert!(session.go_back().is_err());
        assert_eq!(session.step(), PipelineStep::Execution);
    }

    #[test]
    fn reanalysis_replaces_results_wholesale() {
        let mut session = ImportSession::new();
        session.apply_analysis(analysis(1)).unwrap();
        session.set_mapping("Bank", "bank_account").unwrap();
        session.apply_preview(PreviewResult::default()).unwrap();
        session.go_back().unwrap();
        session.go_back().unwrap();

        session.apply_analysis(analysis(9)).unwrap();
        assert_eq!(session.session_id(), Some(sid(9)));
        assert!(session.preview_result().is_none());
        assert!(!session.edited_mapping().contains_key("Bank"));
    }

    #[test]
    fn success_clears_last_error() {
        let mut session = ImportSession::new();
        session.record_error("File could not be read");
        assert_eq!(session.last_error(), Some("File could not be read"));
        session.apply_analysis(analysis(1)).unwrap();
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn reset_clears_everything_from_any_step() {
        let mut session = at_execution();
        session.observe_progress(progress(ImportStatus::Completed)).unwrap();
        session.record_error("boom");

        session.reset();
        assert_eq!(session, ImportSession::default());
        assert_eq!(session.step(), PipelineStep::Upload);
        assert!(session.analyze_result().is_none());
        assert!(session.preview_result().is_none());
        assert!(session.confirm_result().is_none());
        assert!(session.edited_mapping().is_empty());
    }
}
