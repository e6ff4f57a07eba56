//! `question_examine` business stage: turns the question, its canonical
//! answer and the user's answer into one grading prompt.

use crate::pipeline::{
    GradingRequest, GradingResponse, Handler, PipelineError, RequestContext, StageBuilder,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Prompt used when the business has no configured `prompt_template`.
///
/// The reply format matches [`crate::grading::decode`]: the marker on the
/// first line, a single digit on the second.
pub const DEFAULT_EXAMINE_TEMPLATE: &str = "\
请根据面试题和参考答案评估候选人的回答。

面试题：{title}

参考答案（JSON，analysis 为要点分析，basic/intermediate/advanced 分别对应 15K/25K/35K 水平）：
{canonical}

候选人回答：
{answer}

请严格按以下格式输出：
第一行只写「最终评分」。
第二行只写一个数字 0-7：达到 15K 水平加 1，达到 25K 水平加 2，达到 35K 水平加 4，都未达到写 0。
第三行起给出简要点评。";

/// Substitute `{title}`, `{canonical}` and `{answer}` in one pass.
///
/// Inserted values are never rescanned, so placeholders inside a user's
/// answer stay literal. Unknown `{...}` sequences are kept as written.
pub fn render_prompt(template: &str, title: &str, canonical: &str, answer: &str) -> String {
    let mut out = String::with_capacity(template.len() + title.len() + canonical.len() + answer.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let (value, consumed) = if tail.starts_with("{title}") {
            (title, "{title}".len())
        } else if tail.starts_with("{canonical}") {
            (canonical, "{canonical}".len())
        } else if tail.starts_with("{answer}") {
            (answer, "{answer}".len())
        } else {
            ("{", 1)
        };
        out.push_str(value);
        rest = &tail[consumed..];
    }

    out.push_str(rest);
    out
}

/// Builds the innermost stage of the examine pipeline.
#[derive(Debug, Clone, Default)]
pub struct QuestionExamineStageBuilder;

impl QuestionExamineStageBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl StageBuilder for QuestionExamineStageBuilder {
    fn name(&self) -> &str {
        "question_examine"
    }

    fn build(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(QuestionExamineStage { next })
    }
}

struct QuestionExamineStage {
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for QuestionExamineStage {
    async fn handle(
        &self,
        ctx: &RequestContext,
        mut request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        let [title, canonical, answer] = request.inputs.as_slice() else {
            return Err(PipelineError::InvalidRequest(format!(
                "question_examine expects 3 input segments (title, canonical answer, answer), got {}",
                request.inputs.len()
            )));
        };

        let template = request
            .parameters
            .prompt_template
            .as_deref()
            .unwrap_or(DEFAULT_EXAMINE_TEMPLATE);
        let prompt = render_prompt(template, title, canonical, answer);

        request.inputs = vec![prompt];
        self.next.handle(ctx, request).await
    }
}
