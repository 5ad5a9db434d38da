//! One request per user action

use eduvid_core::{ContentSubmission, UploadResponse};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::api::{ClientError, ClientResult, ContentService};

/// In-flight guard; at most one permit exists at a time
#[derive(Debug, Clone, Default)]
pub struct SubmitGate {
    busy: Arc<AtomicBool>,
}

impl SubmitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit, or `Busy` while another request holds it
    pub fn acquire(&self) -> ClientResult<SubmitPermit> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Submission rejected, a request is already in flight");
            return Err(ClientError::Busy);
        }

        Ok(SubmitPermit {
            busy: self.busy.clone(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Released when dropped
#[derive(Debug)]
pub struct SubmitPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for SubmitPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Upload entry point used by interactive callers
#[derive(Debug, Clone)]
pub struct Submitter {
    content: ContentService,
    gate: SubmitGate,
}

impl Submitter {
    pub fn new(content: ContentService) -> Self {
        Self {
            content,
            gate: SubmitGate::new(),
        }
    }

    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    /// Validate, then upload once. Invalid input never takes the permit.
    pub async fn submit(&self, submission: &ContentSubmission) -> ClientResult<UploadResponse> {
        submission.validate()?;
        let _permit = self.gate.acquire()?;
        self.content.upload_content(submission).await
    }

    pub async fn submit_file(&self, path: &Path) -> ClientResult<UploadResponse> {
        let _permit = self.gate.acquire()?;
        self.content.upload_file(path).await
    }
}
