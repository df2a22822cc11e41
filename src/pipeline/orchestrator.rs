//! Drives the speech engine over the chunk list.
//!
//! Sequential mode calls the engine once per chunk on the current thread.
//! Concurrent mode runs up to `workers` calls on tokio's blocking pool and
//! merges results by chunk position, so completion order never leaks into the
//! fragment order. The first failure cancels everything still pending.

use crate::audio::AudioFragment;
use crate::error::{Result, VoxcastError};
use crate::text::Chunk;
use crate::tts::engine::{SpeechEngine, SynthesisParams};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Sends chunks to a [`SpeechEngine`] and collects the fragments in order.
pub struct SynthesisOrchestrator<E: SpeechEngine> {
    engine: Arc<E>,
    params: SynthesisParams,
}

impl<E: SpeechEngine> Clone for SynthesisOrchestrator<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            params: self.params.clone(),
        }
    }
}

impl<E: SpeechEngine + 'static> SynthesisOrchestrator<E> {
    /// Creates a new orchestrator wrapping the given engine.
    pub fn new(engine: E, params: SynthesisParams) -> Self {
        Self {
            engine: Arc::new(engine),
            params,
        }
    }

    /// Creates a new orchestrator from an Arc.
    pub fn from_arc(engine: Arc<E>, params: SynthesisParams) -> Self {
        Self { engine, params }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }

    /// Synthesizes a single chunk.
    ///
    /// Blank chunks are skipped and yield no fragments. This is also the entry
    /// point for a caller that wants to retry one failed chunk by itself.
    pub fn synthesize_chunk(&self, chunk: &Chunk) -> Result<Vec<AudioFragment>> {
        synthesize_one(&*self.engine, &self.params, chunk.index, &chunk.text)
    }

    /// Synthesizes every chunk in order on the current thread.
    pub fn synthesize(&self, chunks: &[Chunk]) -> Result<Vec<AudioFragment>> {
        let mut fragments = Vec::new();
        for chunk in chunks {
            fragments.extend(self.synthesize_chunk(chunk)?);
        }
        Ok(fragments)
    }

    /// Synthesizes chunks with up to `workers` engine calls in flight.
    ///
    /// Fragments come back in chunk order regardless of which call finishes
    /// first. On the first failure, queued calls are skipped, waiting tasks are
    /// aborted and that failure is returned.
    pub async fn synthesize_concurrent(
        &self,
        chunks: &[Chunk],
        workers: usize,
    ) -> Result<Vec<AudioFragment>> {
        let workers = workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        for (slot, chunk) in chunks.iter().enumerate() {
            let engine = self.engine.clone();
            let params = self.params.clone();
            let semaphore = semaphore.clone();
            let cancelled = cancelled.clone();
            let chunk_index = chunk.index;
            let text = chunk.text.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| VoxcastError::Other(format!("Worker pool closed: {}", e)))?;

                // Run blocking synthesis on tokio's blocking thread pool
                let fragments = tokio::task::spawn_blocking(move || {
                    if cancelled.load(Ordering::SeqCst) {
                        return Ok(Vec::new());
                    }
                    synthesize_one(&*engine, &params, chunk_index, &text)
                })
                .await
                .map_err(|e| VoxcastError::EngineFailed {
                    chunk_index,
                    message: format!("synthesis task panicked: {}", e),
                })??;

                Ok::<_, VoxcastError>((slot, fragments))
            });
        }

        let mut slots: Vec<Option<Vec<AudioFragment>>> = vec![None; chunks.len()];

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => Err(VoxcastError::Other(format!("synthesis task failed: {}", e))),
            };

            match outcome {
                Ok((slot, fragments)) => slots[slot] = Some(fragments),
                Err(e) => {
                    log::debug!("Cancelling pending synthesis after failure: {}", e);
                    cancelled.store(true, Ordering::SeqCst);
                    tasks.shutdown().await;
                    return Err(e);
                }
            }
        }

        Ok(slots.into_iter().flatten().flatten().collect())
    }
}

/// One engine call with the orchestrator's failure rules applied.
fn synthesize_one<E: SpeechEngine + ?Sized>(
    engine: &E,
    params: &SynthesisParams,
    chunk_index: usize,
    text: &str,
) -> Result<Vec<AudioFragment>> {
    let text = text.trim();
    if text.is_empty() {
        log::debug!("Skipping blank chunk {}", chunk_index);
        return Ok(Vec::new());
    }

    log::debug!(
        "Synthesizing chunk {} ({} chars) with {}",
        chunk_index,
        text.chars().count(),
        engine.name()
    );

    let fragments = engine
        .synthesize(text, params)
        .map_err(|e| VoxcastError::EngineFailed {
            chunk_index,
            message: e.to_string(),
        })?;

    if fragments.is_empty() {
        return Err(VoxcastError::SynthesisFailure {
            chunk_index,
            chunk_text: text.to_string(),
        });
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::engine::MockEngine;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| Chunk {
                index,
                text: t.to_string(),
            })
            .collect()
    }

    fn params() -> SynthesisParams {
        SynthesisParams {
            split_pattern: r"\n+".to_string(),
            ..SynthesisParams::default()
        }
    }

    fn lengths(fragments: &[AudioFragment]) -> Vec<usize> {
        fragments.iter().map(AudioFragment::len).collect()
    }

    #[test]
    fn test_sequential_calls_engine_in_chunk_order() {
        let engine = Arc::new(MockEngine::new(24_000).with_samples_per_char(1));
        let orchestrator = SynthesisOrchestrator::from_arc(engine.clone(), params());

        let fragments = orchestrator
            .synthesize(&chunks(&["uno", "dos\ntres", "cuatro"]))
            .unwrap();

        assert_eq!(engine.calls(), vec!["uno", "dos\ntres", "cuatro"]);
        // The second chunk is re-split by the engine into two fragments.
        assert_eq!(lengths(&fragments), vec![3, 3, 4, 6]);
    }

    #[test]
    fn test_empty_result_on_chunk_2_of_5_aborts() {
        let engine = Arc::new(MockEngine::new(24_000).with_silence_on("MUDO"));
        let orchestrator = SynthesisOrchestrator::from_arc(engine.clone(), params());

        let result = orchestrator.synthesize(&chunks(&["a", "b", "c MUDO", "d", "e"]));

        match result {
            Err(VoxcastError::SynthesisFailure {
                chunk_index,
                chunk_text,
            }) => {
                assert_eq!(chunk_index, 2);
                assert_eq!(chunk_text, "c MUDO");
            }
            other => panic!("expected SynthesisFailure, got {:?}", other),
        }
        // Nothing after the failing chunk is synthesized.
        assert_eq!(engine.calls(), vec!["a", "b", "c MUDO"]);
    }

    #[test]
    fn test_engine_error_carries_chunk_index() {
        let engine = MockEngine::new(24_000).with_failure_on("ROTO");
        let orchestrator = SynthesisOrchestrator::new(engine, params());

        match orchestrator.synthesize(&chunks(&["bien", "ROTO"])) {
            Err(VoxcastError::EngineFailed { chunk_index, message }) => {
                assert_eq!(chunk_index, 1);
                assert!(message.contains("mock synthesis failure"));
            }
            other => panic!("expected EngineFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_chunks_are_skipped() {
        let engine = Arc::new(MockEngine::new(24_000));
        let orchestrator = SynthesisOrchestrator::from_arc(engine.clone(), params());

        let fragments = orchestrator
            .synthesize(&chunks(&["hola", "   ", "adiós"]))
            .unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(engine.calls(), vec!["hola", "adiós"]);
    }

    #[test]
    fn test_chunk_text_is_trimmed_before_synthesis() {
        let engine = Arc::new(MockEngine::new(24_000));
        let orchestrator = SynthesisOrchestrator::from_arc(engine.clone(), params());
        orchestrator.synthesize(&chunks(&["  hola  "])).unwrap();
        assert_eq!(engine.calls(), vec!["hola"]);
    }

    #[test]
    fn test_single_chunk_retry_entry_point() {
        let orchestrator = SynthesisOrchestrator::new(MockEngine::new(24_000), params());
        let chunk = Chunk {
            index: 7,
            text: "otra vez".to_string(),
        };
        let fragments = orchestrator.synthesize_chunk(&chunk).unwrap();
        assert_eq!(fragments.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_preserves_chunk_order() {
        // Longer chunks sleep longer, so the last chunk finishes first.
        let engine = MockEngine::new(24_000)
            .with_samples_per_char(1)
            .with_delay_per_char(Duration::from_millis(3));
        let orchestrator = SynthesisOrchestrator::new(engine, params());

        let input = chunks(&["aaaaaaaaaaaaaaaaaaaa", "bbbbbbbbbb", "ccccc", "d"]);
        let fragments = orchestrator.synthesize_concurrent(&input, 4).await.unwrap();

        assert_eq!(lengths(&fragments), vec![20, 10, 5, 1]);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let input = chunks(&["uno\ndos", "tres", "cuatro\ncinco\nseis", "siete"]);
        let orchestrator =
            SynthesisOrchestrator::new(MockEngine::new(24_000).with_samples_per_char(3), params());

        let sequential = orchestrator.synthesize(&input).unwrap();
        let concurrent = orchestrator.synthesize_concurrent(&input, 3).await.unwrap();

        assert_eq!(lengths(&sequential), lengths(&concurrent));
    }

    #[tokio::test]
    async fn test_concurrent_failure_is_reported_with_index() {
        let engine = MockEngine::new(24_000).with_silence_on("MUDO");
        let orchestrator = SynthesisOrchestrator::new(engine, params());

        let result = orchestrator
            .synthesize_concurrent(&chunks(&["a", "b", "MUDO", "d", "e"]), 2)
            .await;

        assert!(matches!(
            result,
            Err(VoxcastError::SynthesisFailure { chunk_index: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_failure_cancels_pending_work() {
        let engine = Arc::new(
            MockEngine::new(24_000)
                .with_failure_on("ROTO")
                .with_delay_per_char(Duration::from_millis(5)),
        );
        let orchestrator = SynthesisOrchestrator::from_arc(engine.clone(), params());

        // One worker: chunk 0 fails fast, the ten slow chunks behind it must not run.
        let mut texts = vec!["ROTO"];
        texts.extend(std::iter::repeat_n("una frase bastante larga", 10));
        let result = orchestrator.synthesize_concurrent(&chunks(&texts), 1).await;

        assert!(matches!(
            result,
            Err(VoxcastError::EngineFailed { chunk_index: 0, .. })
        ));
        // Give any detached blocking call a moment, then check how many ran.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(
            engine.calls().len() <= 2,
            "pending chunks were synthesized after failure: {:?}",
            engine.calls().len()
        );
    }

    #[tokio::test]
    async fn test_concurrent_respects_worker_limit() {
        struct CountingEngine {
            concurrent: AtomicU32,
            max_concurrent: AtomicU32,
        }

        impl SpeechEngine for CountingEngine {
            fn synthesize(
                &self,
                _text: &str,
                _params: &SynthesisParams,
            ) -> Result<Vec<AudioFragment>> {
                let current = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_concurrent.fetch_max(current, Ordering::SeqCst);

                std::thread::sleep(Duration::from_millis(30));

                self.concurrent.fetch_sub(1, Ordering::SeqCst);
                Ok(vec![AudioFragment::new(vec![0.0; 4])])
            }

            fn name(&self) -> &str {
                "counting"
            }

            fn sample_rate(&self) -> u32 {
                24_000
            }
        }

        let engine = Arc::new(CountingEngine {
            concurrent: AtomicU32::new(0),
            max_concurrent: AtomicU32::new(0),
        });
        let orchestrator = SynthesisOrchestrator::from_arc(engine.clone(), params());

        let input = chunks(&["a", "b", "c", "d", "e", "f"]);
        let fragments = orchestrator.synthesize_concurrent(&input, 2).await.unwrap();

        assert_eq!(fragments.len(), 6);
        assert!(
            engine.max_concurrent.load(Ordering::SeqCst) <= 2,
            "Max concurrent was {} (should be <= 2)",
            engine.max_concurrent.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_concurrent_with_no_chunks_is_empty() {
        let orchestrator = SynthesisOrchestrator::new(MockEngine::new(24_000), params());
        let fragments = orchestrator.synthesize_concurrent(&[], 4).await.unwrap();
        assert!(fragments.is_empty());
    }
}
