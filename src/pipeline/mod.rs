//! Examination pipeline
//!
//! A pipeline is a chain of stages around a terminal platform handler. Each
//! stage is produced by a [`StageBuilder`] that wraps "the next handler"; the
//! builders are applied right-to-left so the first builder added becomes the
//! outermost stage.
//!
//! # Architecture
//!
//! For the `question_examine` business the order is fixed:
//!
//! 1. **Logging**: records request and outcome, never alters either
//! 2. **Configuration**: injects per-business parameters
//! 3. **Credit**: admission control before, idempotent debit after
//! 4. **Record**: persists the invocation on success
//! 5. **QuestionExamine**: renders the grading prompt
//! 6. **Platform** (terminal): round-robin adapter call and pricing
//!
//! Handlers hold no per-request mutable state, so one composed pipeline
//! serves any number of concurrent requests.

use async_trait::async_trait;
use std::sync::Arc;

pub mod assembly;
pub mod error;
pub mod facade;
pub mod platform;
pub mod stages;
pub mod types;

pub use assembly::{build_examine_pipeline, build_facade};
pub use error::PipelineError;
pub use facade::FacadeDispatcher;
pub use platform::PlatformHandler;
pub use types::{BusinessKey, GradingRequest, GradingResponse, RequestContext, RequestParameters};

/// A pipeline stage or a whole pipeline.
///
/// # Contract
///
/// Handlers must:
/// - Be Send + Sync and keep no per-request state in `self`
/// - Pass errors from the handler they wrap through unchanged
/// - Not panic (return `PipelineError` instead)
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError>;
}

/// Factory wrapping the next handler in a stage.
pub trait StageBuilder: Send + Sync {
    /// Name for logging and introspection
    fn name(&self) -> &str;

    /// Wrap `next` and return the new outer handler
    fn build(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler>;
}

/// Stages statically bound around a terminal handler, with one entry point.
pub struct Composition {
    head: Arc<dyn Handler>,
    stages: Vec<String>,
}

impl Composition {
    /// Apply `builders` right-to-left around `terminal`.
    pub fn new(builders: Vec<Arc<dyn StageBuilder>>, terminal: Arc<dyn Handler>) -> Self {
        let stages = builders.iter().map(|b| b.name().to_string()).collect();
        let head = builders
            .iter()
            .rev()
            .fold(terminal, |next, builder| builder.build(next));
        Self { head, stages }
    }

    /// Stage names, outermost first
    pub fn list_stages(&self) -> Vec<&str> {
        self.stages.iter().map(String::as_str).collect()
    }
}

#[async_trait]
impl Handler for Composition {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        self.head.handle(ctx, request).await
    }
}

/// Builder for compositions
pub struct CompositionBuilder {
    builders: Vec<Arc<dyn StageBuilder>>,
}

impl CompositionBuilder {
    pub fn new() -> Self {
        Self {
            builders: Vec::new(),
        }
    }

    /// Add a stage inside the ones added so far
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, builder: Arc<dyn StageBuilder>) -> Self {
        self.builders.push(builder);
        self
    }

    /// Bind the stages around the terminal handler
    pub fn build(self, terminal: Arc<dyn Handler>) -> Composition {
        Composition::new(self.builders, terminal)
    }
}

impl Default for CompositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Stage that appends its name to the request inputs and to a shared trace.
    struct TraceBuilder {
        name: String,
        trace: Arc<Mutex<Vec<String>>>,
    }

    struct TraceStage {
        name: String,
        trace: Arc<Mutex<Vec<String>>>,
        next: Arc<dyn Handler>,
    }

    impl StageBuilder for TraceBuilder {
        fn name(&self) -> &str {
            &self.name
        }

        fn build(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
            Arc::new(TraceStage {
                name: self.name.clone(),
                trace: Arc::clone(&self.trace),
                next,
            })
        }
    }

    #[async_trait]
    impl Handler for TraceStage {
        async fn handle(
            &self,
            ctx: &RequestContext,
            mut request: GradingRequest,
        ) -> Result<GradingResponse, PipelineError> {
            self.trace.lock().unwrap().push(format!("{}:in", self.name));
            request.inputs.push(self.name.clone());
            let result = self.next.handle(ctx, request).await;
            self.trace.lock().unwrap().push(format!("{}:out", self.name));
            result
        }
    }

    /// Terminal that echoes the inputs it received.
    struct Echo;

    #[async_trait]
    impl Handler for Echo {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            request: GradingRequest,
        ) -> Result<GradingResponse, PipelineError> {
            Ok(GradingResponse::priced(1, request.inputs.join(","), 1))
        }
    }

    fn trace_builder(name: &str, trace: &Arc<Mutex<Vec<String>>>) -> Arc<dyn StageBuilder> {
        Arc::new(TraceBuilder {
            name: name.to_string(),
            trace: Arc::clone(trace),
        })
    }

    #[tokio::test]
    async fn stages_run_in_declared_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let composition = CompositionBuilder::new()
            .add(trace_builder("outer", &trace))
            .add(trace_builder("inner", &trace))
            .build(Arc::new(Echo));

        let request = GradingRequest::new(1, "t", BusinessKey::QuestionExamine, vec![]);
        let response = composition
            .handle(&RequestContext::new(), request)
            .await
            .unwrap();

        assert_eq!(response.answer(), "outer,inner");
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["outer:in", "inner:in", "inner:out", "outer:out"]
        );
        assert_eq!(composition.list_stages(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn empty_composition_is_terminal() {
        let composition = CompositionBuilder::new().build(Arc::new(Echo));
        let request = GradingRequest::new(
            1,
            "t",
            BusinessKey::QuestionExamine,
            vec!["x".to_string()],
        );

        let response = composition
            .handle(&RequestContext::new(), request)
            .await
            .unwrap();

        assert_eq!(response.answer(), "x");
        assert!(composition.list_stages().is_empty());
    }
}
