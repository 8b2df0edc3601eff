use lambda_runtime::{Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Settings;
use crate::tracker::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    /// Record today's daily challenge.
    Track,
    /// Replay the links file in the data directory.
    Fill,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

impl Request {
    /// Requested workflows, defaulting to `track` when none are given.
    pub fn workflows(&self) -> Vec<Workflow> {
        if self.workflows.is_empty() {
            vec![Workflow::Track]
        } else {
            self.workflows.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

/// Run each workflow in order against already resolved settings; one summary line each.
pub fn run_workflows(settings: &Settings, workflows: &[Workflow]) -> Vec<String> {
    let tracker = match Tracker::from_settings(settings) {
        Ok(tracker) => tracker,
        Err(e) => {
            error!(error = %e, "Tracker init failed");
            return vec![format!("Tracker init error: {}", e)];
        }
    };

    workflows
        .iter()
        .map(|wf| match wf {
            Workflow::Track => match tracker.track_today(settings.today()) {
                Ok(report) => {
                    info!(report = %report, "Tracked daily challenge");
                    report.to_string()
                }
                Err(e) => {
                    error!(error = %e, "Failed to track daily challenge");
                    format!("Track failed: {}", e)
                }
            },
            Workflow::Fill => match tracker.fill_from_data_dir(settings) {
                Ok(summary) => {
                    info!(summary = %summary, "Backfill finished");
                    summary.to_string()
                }
                Err(e) => {
                    error!(error = %e, "Failed to fill previous challenges");
                    format!("Fill failed: {}", e)
                }
            },
        })
        .collect()
}

#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    let workflows = event.payload.workflows();
    let settings = Settings::resolve()?;

    // The tracker is blocking and sequential; run it on one blocking task.
    let summaries = tokio::task::spawn_blocking(move || run_workflows(&settings, &workflows)).await?;

    let message = if summaries.is_empty() {
        "No workflows executed".to_string()
    } else {
        summaries.join("; ")
    };

    Ok(Response { message })
}
