use analyst_core::{
    AnalysisResult, AnalystError, Answer, ChartRenderer, Computed, DataSource, Result, Task,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use validator::Validate;

use crate::acquisition::{DataAcquisition, DatasetCatalog};
use crate::analysis::AnalysisEngine;
use crate::assembler::ResponseAssembler;
use crate::config::PipelineConfig;
use crate::interpreter::TaskInterpreter;
use crate::render::ScatterRenderer;

/// How a task was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Every question was answered.
    Answered,
    /// The task was not understood and the echo response was returned.
    Fallback,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Answered => "answered",
            TaskOutcome::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub outcome: TaskOutcome,
    pub body: Value,
    pub elapsed: Duration,
}

/// Interpreter → acquisition → analysis → rendering → assembly, for one task at a time.
///
/// The pipeline holds no per-request state and is shared across requests behind an `Arc`.
pub struct AnalysisPipeline {
    interpreter: TaskInterpreter,
    source: Arc<dyn DataSource>,
    renderer: Arc<dyn ChartRenderer>,
    engine: AnalysisEngine,
    assembler: ResponseAssembler,
    default_max_chars: usize,
}

impl AnalysisPipeline {
    /// Wire the default stages: HTTP/catalog acquisition and the scatter renderer.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AnalystError::Config(e.to_string()))?;

        let catalog = DatasetCatalog::from_entries(&config.datasets);
        let interpreter = TaskInterpreter::new(catalog.names());
        let source = DataAcquisition::new(&config.acquisition, catalog)?;

        Ok(Self::new(
            interpreter,
            Arc::new(source),
            Arc::new(ScatterRenderer::from_config(&config.render)),
            config,
        ))
    }

    pub fn new(
        interpreter: TaskInterpreter,
        source: Arc<dyn DataSource>,
        renderer: Arc<dyn ChartRenderer>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            interpreter,
            source,
            renderer,
            engine: AnalysisEngine::new(),
            assembler: ResponseAssembler::new(config.render.max_chars, config.fallback_preview_chars),
            default_max_chars: config.render.max_chars,
        }
    }

    pub async fn run(&self, task: &Task) -> Result<PipelineOutput> {
        self.run_until_cancelled(task, CancellationToken::new()).await
    }

    /// Run the task, abandoning it as soon as `cancel` fires.
    pub async fn run_until_cancelled(
        &self,
        task: &Task,
        cancel: CancellationToken,
    ) -> Result<PipelineOutput> {
        let started = Instant::now();
        let span = info_span!("pipeline", task_id = %task.id);

        let result = self.execute(task, cancel).instrument(span).await;
        let elapsed = started.elapsed();
        metrics::histogram!("pipeline_duration_seconds").record(elapsed.as_secs_f64());

        match result {
            Ok((outcome, body)) => {
                metrics::counter!("tasks_total", "outcome" => outcome.as_str()).increment(1);
                info!(
                    task_id = %task.id,
                    outcome = outcome.as_str(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Task finished"
                );
                Ok(PipelineOutput {
                    outcome,
                    body,
                    elapsed,
                })
            }
            Err(e) => {
                metrics::counter!("tasks_total", "outcome" => "failed", "error" => e.kind())
                    .increment(1);
                error!(task_id = %task.id, error = %e, kind = e.kind(), "Task failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, task: &Task, cancel: CancellationToken) -> Result<(TaskOutcome, Value)> {
        let plan = match self.interpreter.interpret(&task.text) {
            Ok(plan) => plan,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Task not understood, answering with fallback");
                return Ok((TaskOutcome::Fallback, self.assembler.fallback(task)));
            }
            Err(e) => return Err(e),
        };
        info!(
            source = %plan.source,
            questions = plan.question_count(),
            shape = ?plan.shape,
            encoding = ?plan.encoding,
            "Interpreted task"
        );

        let dataset = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            loaded = self.source.load(&plan.source) => loaded?,
        };

        let engine = self.engine;
        let assembler = self.assembler;
        let renderer = Arc::clone(&self.renderer);
        let default_max_chars = self.default_max_chars;
        let span = Span::current();

        let body = tokio::task::spawn_blocking(move || -> Result<Value> {
            let _entered = span.enter();
            let mut result = AnalysisResult::new();

            for question in &plan.questions {
                if cancel.is_cancelled() {
                    return Err(cancelled());
                }

                let answer = match engine.compute(&dataset, question)? {
                    Computed::Ready { answer } => answer,
                    Computed::Chart { data } => {
                        let limit = data.spec.max_chars.unwrap_or(default_max_chars);
                        Answer::Image(renderer.render(&data, limit)?)
                    }
                };
                debug!(index = question.index, answer = %short(&answer), "Answered question");
                result.push(question.clone(), answer);
            }

            assembler.assemble(&plan, &result)
        })
        .await
        .map_err(|e| AnalystError::Internal(format!("analysis task failed: {}", e)))??;

        Ok((TaskOutcome::Answered, body))
    }
}

fn cancelled() -> AnalystError {
    AnalystError::Internal("task cancelled".to_string())
}

/// Log-friendly rendering that elides image payloads.
fn short(answer: &Answer) -> String {
    match answer {
        Answer::Image(payload) => format!(
            "<{} {}x{}, {} chars>",
            payload.format,
            payload.width,
            payload.height,
            payload.encoded_len()
        ),
        other => other.to_string(),
    }
}
