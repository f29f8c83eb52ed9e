//! Chat webhook notifications and the post-scan output check

use crate::output::{collect_reports, fingerprint, reports_present, Triage};
use crate::AuditError;
use reqwest::Client;
use serde_json::json;
use std::path::Path;

/// CI run identity, used only to build links in messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub server_url: String,
    pub repository: String,
    pub run_id: String,
}

impl RunContext {
    pub fn new(
        server_url: impl Into<String>,
        repository: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            repository: repository.into(),
            run_id: run_id.into(),
        }
    }

    /// Link to the CI run that produced the reports
    pub fn action_url(&self) -> String {
        format!(
            "{}/{}/actions/runs/{}/",
            self.server_url, self.repository, self.run_id
        )
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("NO-GITHUB", "NO-REPOSITORY-IN-USE", "NO-RUN-NUMBER")
    }
}

/// Posts plain-text messages to an optional webhook
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(client: Client, webhook_url: Option<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.filter(|url| !url.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Sends `message`; returns false when no webhook is configured
    pub async fn notify(&self, message: &str) -> Result<bool, AuditError> {
        let Some(webhook_url) = &self.webhook_url else {
            tracing::debug!("No notification webhook configured, skipping");
            return Ok(false);
        };

        self.client
            .post(webhook_url)
            .json(&json!({ "text": message }))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("Notification sent");
        Ok(true)
    }
}

/// Result of looking for scan reports after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCheck {
    NoArtifact,
    Found { message: String, triage: Triage },
}

/// Builds the run summary for a set of triaged findings
pub fn summarize(run: &RunContext, triage: &Triage) -> String {
    let mut message = format!(
        "Unexpected outbound URL found when scanning page content. See {} for details and saved report.",
        run.action_url()
    );

    if !triage.allowlist_candidates.is_empty() {
        message.push_str(&format!(
            "\n{} allowlist candidate(s) (fingerprint {})",
            triage.allowlist_candidates.len(),
            fingerprint(&triage.allowlist_candidates)
        ));
    }
    if !triage.issue_candidates.is_empty() {
        message.push_str(&format!(
            "\n{} malformed finding(s) (fingerprint {})",
            triage.issue_candidates.len(),
            fingerprint(&triage.issue_candidates)
        ));
    }

    message
}

/// Looks for reports in `output_dir` and notifies when there are any
pub async fn check_for_output(
    output_dir: &Path,
    run: &RunContext,
    notifier: &Notifier,
) -> Result<OutputCheck, AuditError> {
    if !reports_present(output_dir)? {
        return Ok(OutputCheck::NoArtifact);
    }

    let collected = collect_reports(output_dir)?;
    let triage = Triage::from_urls(&collected.unexpected_urls);
    let message = summarize(run, &triage);

    notifier.notify(&message).await?;

    Ok(OutputCheck::Found { message, triage })
}
