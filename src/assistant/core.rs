use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::builder::AssistantBuilder;
use crate::batch::BatchExecutor;
use crate::cache::{CacheKeyGenerator, CacheStats, ResponseCache};
use crate::data::{normalize_code, DemandDataset};
use crate::drivers::{GenerationOptions, TextGenerator};
use crate::monitor::{Counter, PerformanceMonitor, PerformanceSummary};
use crate::prompts;
use crate::resilience::RetryPolicy;
use crate::retrieval::KnowledgeBase;
use crate::structured::{parse_reorder_plan, ReorderPlan};
use crate::types::Message;
use crate::{Error, ErrorContext, Result};

/// Markdown answer to a free-form question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Ids of the documents placed in the prompt, best match first.
    pub sources: Vec<String>,
    /// True when served from the response cache.
    #[serde(default)]
    pub cached: bool,
}

/// Outcome of [`SupplyChainAssistant::plan_batch`], keyed by the requested ids.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub plans: BTreeMap<String, ReorderPlan>,
    pub failures: BTreeMap<String, String>,
    pub elapsed: Duration,
}

impl BatchPlan {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct SupplyChainAssistant {
    pub(super) generator: Arc<dyn TextGenerator>,
    pub(super) knowledge: KnowledgeBase,
    pub(super) dataset: DemandDataset,
    pub(super) cache: ResponseCache,
    pub(super) keys: CacheKeyGenerator,
    pub(super) monitor: Arc<PerformanceMonitor>,
    pub(super) retry: RetryPolicy,
    pub(super) batch: BatchExecutor,
    pub(super) options: GenerationOptions,
    pub(super) top_k: usize,
}

impl SupplyChainAssistant {
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::new()
    }

    /// Answer a question using retrieved playbook context and a dataset overview.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let _t = self.monitor.time("ask");
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::validation_with_context(
                "question must not be empty",
                ErrorContext::new().with_field_path("question"),
            ));
        }

        let key = self
            .keys
            .generate("ask", Some(self.generator.model()), question, None);
        let fetched = self
            .cache
            .get_or_fetch(&key, move || async move {
                let context = self.knowledge.retrieve(question, self.top_k).await?;
                let messages =
                    prompts::question_messages(question, &context, &self.dataset.overview(5));
                let text = self.call_model(&messages, &self.options).await?;
                let answer = Answer {
                    text,
                    sources: context.iter().map(|d| d.document.id.clone()).collect(),
                    cached: false,
                };
                Ok(serde_json::to_string(&answer)?)
            })
            .await?;

        let mut answer: Answer = serde_json::from_str(&fetched.value)?;
        answer.cached = fetched.hit;
        Ok(answer)
    }

    /// Reorder plan for one stock code.
    ///
    /// The cache key covers the product's data snapshot, so a plan is reused
    /// only while the underlying history is unchanged.
    pub async fn plan_reorder(&self, product_id: &str) -> Result<ReorderPlan> {
        let _t = self.monitor.time("plan_reorder");
        let summary = self.dataset.summarize(product_id).ok_or_else(|| {
            Error::validation_with_context(
                format!("unknown product '{}'", product_id.trim()),
                ErrorContext::new()
                    .with_field_path("product_id")
                    .with_details(format!("{} products loaded", self.dataset.product_ids().len()))
                    .with_source("demand_data"),
            )
        })?;
        let snapshot = self.dataset.snapshot(&summary.stock_code).unwrap_or_default();
        let id = summary.stock_code.as_str();

        let key = self
            .keys
            .generate("plan", Some(self.generator.model()), id, Some(&snapshot));
        let snapshot_ref = snapshot.as_str();
        let description = summary.description.as_str();
        let fetched = self
            .cache
            .get_or_fetch(&key, move || async move {
                let query = format!(
                    "reorder point, safety stock and lead time for {} {}",
                    id, description
                );
                let context = self.knowledge.retrieve(&query, self.top_k).await?;
                let messages = prompts::reorder_plan_messages(id, snapshot_ref, &context);
                let options = self.options.clone().json();
                let text = self.call_model(&messages, &options).await?;
                let plan = parse_reorder_plan(&text, id)?;
                Ok(serde_json::to_string(&plan)?)
            })
            .await?;

        let plan: ReorderPlan = serde_json::from_str(&fetched.value)?;
        info!(
            product_id = id,
            cached = fetched.hit,
            reorder_point = plan.reorder_point,
            reorder_quantity = plan.reorder_quantity,
            "reorder plan ready"
        );
        Ok(plan)
    }

    /// Plan every id in order. Failures are collected, not raised.
    ///
    /// Result keys are canonical stock codes, so `85123a` and `85123A` share
    /// one entry.
    pub async fn plan_batch<S: AsRef<str>>(&self, product_ids: &[S]) -> BatchPlan {
        let _t = self.monitor.time("plan_batch");
        let ids: Vec<String> = product_ids
            .iter()
            .map(|s| normalize_code(s.as_ref()))
            .collect();

        let result = self
            .batch
            .execute_sequential(ids.clone(), move |id: String| async move {
                self.plan_reorder(&id).await
            })
            .await;

        let mut out = BatchPlan {
            elapsed: result.execution_time,
            ..BatchPlan::default()
        };
        for (i, plan) in result.successes {
            out.plans.insert(ids[i].clone(), plan);
        }
        for (i, err) in result.failures {
            out.failures.insert(ids[i].clone(), err.message);
        }
        info!(
            requested = ids.len(),
            planned = out.plans.len(),
            failed = out.failures.len(),
            elapsed_ms = out.elapsed.as_millis() as u64,
            "batch planning finished"
        );
        out
    }

    async fn call_model(&self, messages: &[Message], options: &GenerationOptions) -> Result<String> {
        let monitor = self.monitor.as_ref();
        let generator = self.generator.as_ref();
        self.retry
            .run("generate_content", Some(monitor), move || async move {
                monitor.incr(Counter::ApiCalls);
                let _t = monitor.time("api_call");
                let started = Instant::now();
                match generator.generate(messages, options).await {
                    Ok(text) => {
                        debug!(
                            model = generator.model(),
                            latency_ms = started.elapsed().as_millis() as u64,
                            chars = text.len(),
                            "model call succeeded"
                        );
                        Ok(text)
                    }
                    Err(e) => {
                        monitor.incr(Counter::ApiFailures);
                        Err(e)
                    }
                }
            })
            .await
    }

    pub fn dataset(&self) -> &DemandDataset {
        &self.dataset
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        self.monitor.summary()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend_name()
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await
    }
}
