//! Import wizard controller.
//!
//! [`ImportPipeline`] owns an [`ImportSession`] and performs the backend
//! call each step needs. Calls are sequential (`&mut self`). A failed call
//! records a user-facing message on the session and leaves the step
//! unchanged; nothing is retried automatically.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use hrms_core::error::CoreError;
use hrms_core::import_pipeline::{EntityType, ImportSession, PipelineStep};
use hrms_core::types::AttachmentId;

use crate::api::ImportApi;
use crate::error::{ClientError, ClientResult};
use crate::poller::{ProgressPoller, DEFAULT_POLL_INTERVAL};

pub struct ImportPipeline<A: ImportApi + ?Sized + 'static> {
    api: Arc<A>,
    session: ImportSession,
    poll_interval: Duration,
    poller: Option<ProgressPoller>,
}

impl<A: ImportApi + ?Sized + 'static> ImportPipeline<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            session: ImportSession::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poller: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    pub fn step(&self) -> PipelineStep {
        self.session.step()
    }

    /// Whether a progress poller is currently attached.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// The poller's handle, for rendering progress while the import runs.
    pub fn poller(&self) -> Option<&ProgressPoller> {
        self.poller.as_ref()
    }

    /// Entity types offered on the upload step.
    pub async fn entity_types(&self) -> ClientResult<Vec<EntityType>> {
        self.api.get_entity_types().await
    }

    // -----------------------------------------------------------------------
    // Step actions
    // -----------------------------------------------------------------------

    /// Upload step: analyze an uploaded attachment.
    pub async fn analyze(
        &mut self,
        attachment_id: AttachmentId,
        entity_type: Option<&str>,
    ) -> ClientResult<()> {
        self.session
            .ensure_step(PipelineStep::Upload, "analyze a file")?;

        let result = self.api.analyze(attachment_id, entity_type).await;
        match result {
            Ok(result) => {
                let session_id = result.session_id;
                let total_rows = result.total_rows;
                self.session.apply_analysis(result)?;
                tracing::info!(
                    %session_id,
                    attachment_id,
                    total_rows,
                    "Import file analyzed",
                );
                Ok(())
            }
            Err(e) => Err(self.fail("analyze", e)),
        }
    }

    /// Mapping step: point a source column at a target field (empty skips).
    pub fn set_mapping(&mut self, source: &str, target: &str) -> ClientResult<()> {
        Ok(self.session.set_mapping(source, target)?)
    }

    /// Mapping step: send the edited mapping and load the preview.
    pub async fn submit_mapping(&mut self, import_params: Option<Value>) -> ClientResult<()> {
        self.session
            .ensure_step(PipelineStep::Mapping, "generate a preview")?;
        let session_id = self.session.require_session_id()?;
        let mapping = self.session.edited_mapping().clone();

        let result = self
            .api
            .generate_preview(session_id, Some(&mapping), import_params.as_ref())
            .await;
        match result {
            Ok(result) => {
                let (valid_rows, error_rows) = (result.valid_rows, result.error_rows);
                self.session.apply_preview(result)?;
                tracing::info!(%session_id, valid_rows, error_rows, "Import preview ready");
                Ok(())
            }
            Err(e) => Err(self.fail("preview", e)),
        }
    }

    /// Preview step: start the import and begin polling its progress.
    pub async fn confirm(&mut self) -> ClientResult<()> {
        self.session
            .ensure_step(PipelineStep::Preview, "confirm the import")?;
        let session_id = self.session.require_session_id()?;

        let result = self.api.confirm_import(session_id).await;
        match result {
            Ok(result) => {
                self.session.apply_confirmation(result)?;
                tracing::info!(
                    session_id = ?self.session.session_id(),
                    "Import confirmed",
                );
                self.start_polling()?;
                Ok(())
            }
            Err(e) => Err(self.fail("confirm", e)),
        }
    }

    /// Execution step: wait until the import reaches a terminal status,
    /// move to complete, then load the final session detail.
    ///
    /// Safe to cancel (e.g. under `tokio::time::timeout`); the poller keeps
    /// running and a later call resumes from the latest snapshot.
    pub async fn wait_for_completion(&mut self) -> ClientResult<()> {
        self.session
            .ensure_step(PipelineStep::Execution, "wait for the import")?;
        if self.poller.is_none() {
            self.start_polling()?;
        }

        if let Some(latest) = self.poller.as_ref().and_then(ProgressPoller::latest) {
            if self.session.observe_progress(latest)? {
                return self.finish().await;
            }
        }

        loop {
            let next = match self.poller.as_mut() {
                Some(poller) => poller.next_update().await,
                None => None,
            };
            let Some(progress) = next else {
                return Err(CoreError::Internal(
                    "Progress polling stopped before the import finished".into(),
                )
                .into());
            };
            if self.session.observe_progress(progress)? {
                return self.finish().await;
            }
        }
    }

    /// Execution step, render-loop entry point: fold the poller's latest
    /// snapshot into the session without waiting for a new one. A terminal
    /// status moves the wizard to complete and loads the session detail.
    ///
    /// Returns `true` once the wizard is complete; outside execution and
    /// complete it returns `false` and does nothing.
    pub async fn sync_progress(&mut self) -> ClientResult<bool> {
        match self.session.step() {
            PipelineStep::Complete => return Ok(true),
            PipelineStep::Execution => {}
            _ => return Ok(false),
        }
        let Some(latest) = self.poller.as_ref().and_then(ProgressPoller::latest) else {
            return Ok(false);
        };
        if self.session.observe_progress(latest)? {
            self.finish().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Complete step: (re)load the session detail. Usable as a retry after
    /// a failed fetch.
    pub async fn load_session_detail(&mut self) -> ClientResult<()> {
        self.session
            .ensure_step(PipelineStep::Complete, "show the session detail")?;
        let session_id = self.session.require_session_id()?;

        let result = self.api.get_import_session(session_id).await;
        match result {
            Ok(detail) => {
                self.session.apply_session_detail(detail)?;
                Ok(())
            }
            Err(e) => Err(self.fail("load session detail", e)),
        }
    }

    /// Go back one step (mapping to upload, preview to mapping).
    pub fn back(&mut self) -> ClientResult<PipelineStep> {
        let step = self.session.go_back()?;
        tracing::info!(step = %step, "Import wizard moved back");
        Ok(step)
    }

    /// Stop polling and discard all step data. No server call is made.
    pub fn reset(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        self.session.reset();
        tracing::info!("Import wizard reset");
    }

    // ---- private helpers ----

    fn start_polling(&mut self) -> ClientResult<()> {
        let session_id = self.session.require_session_id()?;
        self.poller = Some(ProgressPoller::spawn(
            Arc::clone(&self.api),
            session_id,
            self.poll_interval,
        ));
        Ok(())
    }

    async fn finish(&mut self) -> ClientResult<()> {
        self.poller = None;
        tracing::info!(
            session_id = ?self.session.session_id(),
            status = ?self.session.last_progress().map(|p| p.status.as_str()),
            "Import finished",
        );
        self.load_session_detail().await
    }

    fn fail(&mut self, action: &str, err: ClientError) -> ClientError {
        tracing::warn!(action, step = %self.session.step(), error = %err, "Import call failed");
        self.session.record_error(err.user_message());
        err
    }
}
