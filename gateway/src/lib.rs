pub mod api;
pub mod config;
pub mod dispatcher;
pub mod environments;
pub mod errors;
pub mod metrics_defs;
pub mod pipeline;
pub mod results;
pub mod status;
pub mod submission;

#[cfg(test)]
mod testutils;

use crate::api::AppState;
use crate::config::Settings;
use crate::dispatcher::Queues;

pub async fn run(settings: Settings) -> Result<(), std::io::Error> {
    for pipeline in pipeline::Pipeline::ALL {
        let pipeline_settings = settings.pipeline(pipeline);
        match &pipeline_settings.queue_uri {
            Some(uri) => tracing::info!(
                %pipeline,
                analysis = %pipeline_settings.analysis,
                queue = %uri,
                "Pipeline configured"
            ),
            None => tracing::warn!(
                %pipeline,
                variable = pipeline.queue_uri_variable(),
                "Pipeline has no queue, submissions will fail"
            ),
        }
    }

    let queues = Queues::from_settings(&settings);
    api::serve(AppState::new(settings, queues)).await
}
