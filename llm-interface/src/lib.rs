pub mod extract;
pub mod openrouter;
pub mod prompt;
pub mod ranking;

pub use extract::{extract_ranking, StrategyKind, StrategyOutcome, STRATEGIES};
pub use openrouter::OpenRouterProvider;
pub use prompt::build_ranking_prompt;
pub use ranking::{rank_stage, RankingExtractor};

use reelrank_core::CoreError;

pub trait LlmProvider {
    /// Sends one user message and returns the text of the first choice.
    async fn complete(&self, prompt: &str) -> Result<String, CoreError>;
}
