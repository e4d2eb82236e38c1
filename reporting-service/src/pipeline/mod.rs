//! Batch import plumbing: a [`Source`] yields records, every [`Transform`]
//! may reject them, and a [`Sink`] persists what is left.

use std::{
    pin::Pin,
    sync::Arc,
    time::{Instant, SystemTime},
};

use futures::{Stream, StreamExt};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum PipelineError {
    /// A single record could not be read; the run continues without it.
    #[error("unreadable record: {0}")]
    Record(String),
    /// The input as a whole cannot be read (missing file, broken header).
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    /// A transform refused the record; the run continues without it.
    #[error("record rejected: {0}")]
    Rejected(String),
    #[error("sink error: {0}")]
    Sink(String),
}

impl PipelineError {
    /// Fatal errors abort the run; the others only drop one record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::Sink(_))
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub written: u64,
    pub skipped: u64,
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<T>: Send + Sync {
    async fn apply(&self, input: Envelope<T>) -> Result<Envelope<T>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    /// Consume the stream. Non-fatal errors are counted as skipped, a fatal
    /// one ends the run with that error.
    async fn run(&self, input: EnvelopeStream<T>) -> Result<ImportSummary, PipelineError>;
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T>>>,
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T>,
    K: Sink<T>,
{
    pub async fn run(self) -> Result<ImportSummary, PipelineError> {
        let started = Instant::now();
        let transforms: Arc<[Arc<dyn Transform<T>>]> = self.transforms.into();

        let checked = self.source.stream().await.then(move |item| {
            let transforms = Arc::clone(&transforms);
            async move {
                let mut env = item?;
                for t in transforms.iter() {
                    env = t.apply(env).await?;
                }
                Ok::<_, PipelineError>(env)
            }
        });

        let summary = self.sink.run(Box::pin(checked)).await?;

        tracing::info!(
            written = summary.written,
            skipped = summary.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_whole_run_failures_are_fatal() {
        assert!(PipelineError::SourceUnavailable("gone".into()).is_fatal());
        assert!(PipelineError::Sink("locked".into()).is_fatal());
        assert!(!PipelineError::Record("bad line".into()).is_fatal());
        assert!(!PipelineError::Rejected("old year".into()).is_fatal());
    }
}
