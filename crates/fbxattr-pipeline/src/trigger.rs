//! Import trigger
//!
//! Generation runs in two phases. While a batch of models is imported,
//! [`ImportTrigger::on_postprocess_model`] only matches rules and queues
//! requests. Once the batch is done, [`ImportTrigger::run_deferred`] drains
//! the queue in order. Each request succeeds or fails on its own.

use std::collections::VecDeque;

use fbxattr_core::path::{attribute_asset_path, has_extension, normalize_path};
use fbxattr_core::Result;

use crate::config::PipelineConfig;
use crate::materializer::{ImportContext, MaterializeReport, MaterializeRequest};
use crate::registry::RuleRegistry;

/// What happened to one deferred request
#[derive(Debug)]
pub struct MaterializeOutcome {
    pub request: MaterializeRequest,
    pub result: Result<MaterializeReport>,
}

impl MaterializeOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-import entry point of the pipeline
pub struct ImportTrigger<'r> {
    registry: &'r RuleRegistry,
    config: PipelineConfig,
    queue: VecDeque<MaterializeRequest>,
}

impl<'r> ImportTrigger<'r> {
    pub fn new(registry: &'r RuleRegistry, config: PipelineConfig) -> Self {
        Self {
            registry,
            config,
            queue: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Called after a model asset was imported
    ///
    /// Queues one request per rule whose pattern occurs in `model_name` and
    /// returns how many were queued. Assets without the model extension are
    /// ignored.
    pub fn on_postprocess_model(&mut self, model_name: &str, asset_path: &str) -> usize {
        if !has_extension(asset_path, &self.config.model_extension) {
            tracing::trace!(asset_path, "Not a model asset");
            return 0;
        }

        let model_path = normalize_path(asset_path);
        let mut scheduled = 0;

        for rule in self.registry.lookup() {
            if !rule.matches(model_name) {
                continue;
            }

            let target = attribute_asset_path(&model_path, &rule.suffix, &self.config.asset_extension);
            tracing::debug!(
                model = model_name,
                container = rule.kind.type_name(),
                target = %target,
                "Scheduled container generation"
            );

            self.queue
                .push_back(MaterializeRequest::new(model_path.clone(), target, rule.kind));
            scheduled += 1;
        }

        scheduled
    }

    /// Requests waiting for [`ImportTrigger::run_deferred`]
    pub fn pending(&self) -> impl Iterator<Item = &MaterializeRequest> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue in FIFO order
    pub fn run_deferred(&mut self, ctx: &mut ImportContext<'_>) -> Vec<MaterializeOutcome> {
        let mut outcomes = Vec::with_capacity(self.queue.len());

        while let Some(request) = self.queue.pop_front() {
            let result = request.run(ctx, self.registry);
            if let Err(e) = &result {
                tracing::error!(
                    model = %request.model_path,
                    target = %request.target_path,
                    error = %e,
                    "Container generation failed"
                );
            }
            outcomes.push(MaterializeOutcome { request, result });
        }

        outcomes
    }
}
