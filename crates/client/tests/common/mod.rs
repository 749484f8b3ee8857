//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use hrms_client::{ClientError, ClientResult, ImportApi};
use hrms_core::import_pipeline::{
    AnalyzeResult, ConfirmResult, EntityType, ImportProgress, ImportSessionDetail, ImportStatus,
    PreviewResult,
};
use hrms_core::types::{AttachmentId, ColumnMapping, SessionId};

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("hrms_client=debug")
        .try_init();
}

/// One recorded call against [`FakeApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Analyze {
        attachment_id: AttachmentId,
        entity_type: Option<String>,
    },
    Preview {
        session_id: SessionId,
        column_mapping: Option<ColumnMapping>,
        import_params: Option<Value>,
    },
    Confirm(SessionId),
    Progress(SessionId),
    Session(SessionId),
    EntityTypes,
}

/// Scripted in-memory [`ImportApi`].
///
/// Progress responses come from a script; `None` entries fail with a 503.
/// Once the script runs out the last status repeats.
pub struct FakeApi {
    pub analyze_session: SessionId,
    pub confirm_session: SessionId,
    progress_script: Mutex<VecDeque<Option<ImportStatus>>>,
    last_status: Mutex<ImportStatus>,
    progress_latency: Duration,
    fail_analyze: AtomicBool,
    fail_preview: AtomicBool,
    fail_confirm: AtomicBool,
    progress_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            analyze_session: uuid::Uuid::new_v4(),
            confirm_session: uuid::Uuid::new_v4(),
            progress_script: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(ImportStatus::Processing),
            progress_latency: Duration::ZERO,
            fail_analyze: AtomicBool::new(false),
            fail_preview: AtomicBool::new(false),
            fail_confirm: AtomicBool::new(false),
            progress_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_progress(self, script: impl IntoIterator<Item = Option<ImportStatus>>) -> Self {
        *self.progress_script.lock().unwrap() = script.into_iter().collect();
        self
    }

    pub fn with_progress_latency(mut self, latency: Duration) -> Self {
        self.progress_latency = latency;
        self
    }

    pub fn fail_analyze(&self, fail: bool) {
        self.fail_analyze.store(fail, Ordering::SeqCst);
    }

    pub fn fail_preview(&self, fail: bool) {
        self.fail_preview.store(fail, Ordering::SeqCst);
    }

    pub fn fail_confirm(&self, fail: bool) {
        self.fail_confirm.store(fail, Ordering::SeqCst);
    }

    pub fn progress_calls(&self) -> usize {
        self.progress_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn rejected(message: &str) -> ClientError {
        ClientError::Api {
            status: 422,
            body: json!({ "error": message }).to_string(),
        }
    }

    fn next_status(&self) -> Option<ImportStatus> {
        let mut script = self.progress_script.lock().unwrap();
        let mut last = self.last_status.lock().unwrap();
        match script.pop_front() {
            Some(Some(status)) => {
                *last = status.clone();
                Some(status)
            }
            Some(None) => None,
            None => Some(last.clone()),
        }
    }
}

#[async_trait]
impl ImportApi for FakeApi {
    async fn analyze(
        &self,
        attachment_id: AttachmentId,
        entity_type: Option<&str>,
    ) -> ClientResult<AnalyzeResult> {
        self.record(Call::Analyze {
            attachment_id,
            entity_type: entity_type.map(str::to_string),
        });
        if self.fail_analyze.load(Ordering::SeqCst) {
            return Err(Self::rejected("File is not a spreadsheet"));
        }
        Ok(serde_json::from_value(json!({
            "session_id": self.analyze_session,
            "column_mapping": {
                "Emp No": "employee_id",
                "Name": "full_name",
                "Department": "",
            },
            "headers": ["Emp No", "Name", "Department"],
            "total_rows": 3,
            "entity_type": entity_type,
        }))
        .unwrap())
    }

    async fn generate_preview(
        &self,
        session_id: SessionId,
        column_mapping: Option<&ColumnMapping>,
        import_params: Option<&Value>,
    ) -> ClientResult<PreviewResult> {
        self.record(Call::Preview {
            session_id,
            column_mapping: column_mapping.cloned(),
            import_params: import_params.cloned(),
        });
        if self.fail_preview.load(Ordering::SeqCst) {
            return Err(Self::rejected("Column 'Emp No' must be mapped"));
        }
        Ok(serde_json::from_value(json!({
            "rows": [
                { "row_number": 1, "data": { "employee_id": "E1" }, "errors": [] },
                { "row_number": 2, "data": { "employee_id": "" }, "errors": ["employee_id is required"] },
            ],
            "total_rows": 3,
            "valid_rows": 2,
            "error_rows": 1,
        }))
        .unwrap())
    }

    async fn confirm_import(&self, session_id: SessionId) -> ClientResult<ConfirmResult> {
        self.record(Call::Confirm(session_id));
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(Self::rejected("Import already started"));
        }
        Ok(ConfirmResult {
            session_id: self.confirm_session,
            status: Some(ImportStatus::Pending),
            extra: Default::default(),
        })
    }

    async fn get_import_progress(&self, session_id: SessionId) -> ClientResult<ImportProgress> {
        self.record(Call::Progress(session_id));
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.progress_latency.is_zero() {
            tokio::time::sleep(self.progress_latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let status = self.next_status().ok_or_else(|| ClientError::Api {
            status: 503,
            body: "Service Unavailable".to_string(),
        })?;
        let done = status.is_terminal();
        Ok(ImportProgress {
            status,
            processed_rows: if done { 3 } else { 1 },
            total_rows: 3,
            success_count: if done { 2 } else { 1 },
            error_count: if done { 1 } else { 0 },
        })
    }

    async fn get_import_session(&self, session_id: SessionId) -> ClientResult<ImportSessionDetail> {
        self.record(Call::Session(session_id));
        let status = self.last_status.lock().unwrap().clone();
        Ok(ImportSessionDetail {
            session_id,
            status,
            total_rows: 3,
            success_count: 2,
            error_count: 1,
            errors: Vec::new(),
            extra: Default::default(),
        })
    }

    async fn get_entity_types(&self) -> ClientResult<Vec<EntityType>> {
        self.record(Call::EntityTypes);
        Ok(vec![
            EntityType {
                value: "employees".into(),
                label: "Employees".into(),
            },
            EntityType {
                value: "leave_balances".into(),
                label: "Leave Balances".into(),
            },
        ])
    }
}
