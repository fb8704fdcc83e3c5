//! Ranking stage: intermediate artifact in, ranking artifact out.

use crate::extract::extract_ranking;
use crate::prompt::build_ranking_prompt;
use crate::LlmProvider;
use reelrank_core::artifact::{read_content, write_ranking};
use reelrank_core::render::StageReport;
use reelrank_core::{AppConfig, CoreError, ErrorExt, RankedList, TopicConfig};
use serde_json::Value;
use tracing::{debug, info, warn};

pub struct RankingExtractor<'a, P: LlmProvider> {
    provider: &'a P,
}

impl<'a, P: LlmProvider> RankingExtractor<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Asks the model to rank `content` and returns the extracted JSON value.
    /// The value is not checked against the ranking schema.
    pub async fn rank(&self, content: &str) -> Result<Value, CoreError> {
        let prompt = build_ranking_prompt(content);
        let response = self.provider.complete(&prompt).await?;
        info!("AI response length: {}", response.len());

        let (strategy, value) = extract_ranking(&response)?;
        info!("Extracted ranking via {}", strategy);

        match serde_json::from_value::<RankedList>(value.clone()) {
            Ok(list) => info!("Model returned {} ranked movies", list.ranked_movies.len()),
            Err(e) => debug!("Ranking does not match the expected schema: {}", e),
        }

        Ok(value)
    }
}

async fn rank_topic<P: LlmProvider>(
    extractor: &RankingExtractor<'_, P>,
    config: &AppConfig,
    topic: &TopicConfig,
) -> Result<std::path::PathBuf, CoreError> {
    let input = config.output_path(&topic.output);
    let output = config.output_path(&topic.ranked_output);
    info!("Processing {} -> {}", input.display(), output.display());

    let content = read_content(&input)?;
    info!("Read {} characters from {}", content.len(), input.display());

    let value = extractor.rank(&content).await?;
    write_ranking(&output, &value)?;
    info!("Saved rankings to {}", output.display());
    Ok(output)
}

/// Ranks each topic's artifact in order. Failures are logged per topic and
/// never stop the remaining topics.
pub async fn rank_stage<P: LlmProvider>(
    provider: &P,
    config: &AppConfig,
    topics: &[&TopicConfig],
) -> StageReport {
    let extractor = RankingExtractor::new(provider);
    let mut report = StageReport::default();

    for topic in topics {
        match rank_topic(&extractor, config, topic).await {
            Ok(path) => report.written.push(path),
            Err(e) => {
                if let CoreError::Artifact { .. } = &e {
                    warn!("Skipping topic '{}': {}", topic.name, e);
                } else {
                    e.log_error();
                }
                report.failed.push((topic.name.clone(), e));
            }
        }
    }

    report
}
