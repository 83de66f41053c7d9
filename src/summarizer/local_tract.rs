//! Tract-based local abstractive summarization.
//!
//! Pure-Rust path: loads a BART-family encoder/decoder pair exported to ONNX
//! with tract-onnx, tokenizes with the tokenizers crate, and runs a 4-beam
//! search (length penalty 2.0, no repeated trigrams) in `spawn_blocking`.
//! No ONNX Runtime or system deps.
//!
//! Dropping a pending [`Summarizer::summarize`] future (for example on a
//! request timeout) stops the blocking decode at its next step.
//!
//! The model is loaded once ([`LocalSummarizer::load`]) and shared read-only;
//! each call builds its own tensors, so concurrent calls do not interact.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tract_onnx::prelude::*;

use super::{SummarizeError, Summarizer};
use crate::config::SummarizerConfig;
use crate::models::LengthBounds;

const DEFAULT_MODEL: &str = "bart-large-cnn";
const ENCODER_FILE: &str = "onnx/encoder_model.onnx";
const DECODER_FILE: &str = "onnx/decoder_model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// BART special token ids.
const BOS_ID: u32 = 0;
const EOS_ID: u32 = 2;
/// BART starts decoding from `</s>`, then forces `<s>`.
const DECODER_START_ID: u32 = EOS_ID;
/// Learned position embeddings stop here; longer inputs are cut.
const MAX_SOURCE_POSITIONS: usize = 1024;
const NO_REPEAT_NGRAM: usize = 3;
/// Generation settings of the bart-large-cnn checkpoint.
const NUM_BEAMS: usize = 4;
const LENGTH_PENALTY: f32 = 2.0;

/// Model name → Hugging Face repo hosting the ONNX export.
fn model_repo(model_name: &str) -> Result<&'static str> {
    match model_name {
        "bart-large-cnn" => Ok("Xenova/bart-large-cnn"),
        "distilbart-cnn-12-6" => Ok("Xenova/distilbart-cnn-12-6"),
        "distilbart-cnn-6-6" => Ok("Xenova/distilbart-cnn-6-6"),
        other => bail!(
            "Unknown local summarization model: '{}'. Supported models: \
             bart-large-cnn, distilbart-cnn-12-6, distilbart-cnn-6-6",
            other
        ),
    }
}

fn cache_dir(config: &SummarizerConfig) -> Result<PathBuf> {
    let dir = match &config.model_dir {
        Some(dir) => dir.clone(),
        None => {
            let base = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(base)
                .join(".cache")
                .join("docsum")
                .join("models")
        }
    };
    std::fs::create_dir_all(&dir).map_err(|e| anyhow!("Create cache dir: {}", e))?;
    Ok(dir)
}

fn download_to_cache(repo: &str, path: &str, cache_path: &Path) -> Result<()> {
    if cache_path.exists() {
        return Ok(());
    }
    let url = format!("https://huggingface.co/{}/resolve/main/{}", repo, path);
    tracing::info!(%url, "downloading model file");
    let resp = reqwest::blocking::get(&url)
        .map_err(|e| anyhow!("Download {}: {}", url, e))?
        .error_for_status()
        .map_err(|e| anyhow!("Download {}: {}", url, e))?;
    let bytes = resp.bytes().map_err(|e| anyhow!("Read body: {}", e))?;
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| anyhow!("Create cache parent: {}", e))?;
    }
    std::fs::write(cache_path, &bytes).map_err(|e| anyhow!("Write cache: {}", e))?;
    Ok(())
}

/// An optimized ONNX graph plus the names of its inputs, in call order.
struct OnnxGraph {
    input_names: Vec<String>,
    run: Box<dyn Fn(TVec<TValue>) -> TractResult<TVec<TValue>> + Send + Sync>,
}

impl OnnxGraph {
    fn load(path: &Path) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| anyhow!("Load ONNX {}: {}", path.display(), e))?
            .into_optimized()
            .map_err(|e| anyhow!("Optimize {}: {}", path.display(), e))?;
        let input_names = model
            .input_outlets()
            .map_err(|e| anyhow!("Inspect inputs: {}", e))?
            .iter()
            .map(|outlet| model.node(outlet.node).name.clone())
            .collect();
        let plan = model
            .into_runnable()
            .map_err(|e| anyhow!("Build tract runnable: {}", e))?;
        Ok(Self {
            input_names,
            run: Box::new(move |inputs: TVec<TValue>| plan.run(inputs)),
        })
    }

    /// Run with inputs given by name; the export's input order is not fixed.
    fn run_named(&self, mut inputs: Vec<(&str, TValue)>) -> Result<TVec<TValue>> {
        let mut ordered = TVec::new();
        for name in &self.input_names {
            let pos = inputs
                .iter()
                .position(|(n, _)| n == name)
                .ok_or_else(|| anyhow!("model input '{}' not provided", name))?;
            ordered.push(inputs.swap_remove(pos).1);
        }
        (self.run)(ordered).map_err(|e| anyhow!("Inference: {}", e))
    }
}

fn id_tensor(ids: &[i64]) -> Result<TValue> {
    let array = ndarray::Array2::from_shape_vec((1, ids.len()), ids.to_vec())
        .map_err(|e| anyhow!("Input shape: {}", e))?;
    let tensor: Tensor = array.into();
    Ok(tensor.into())
}

/// Encoder ids capped at the model's source length, keeping the closing `</s>`.
fn source_ids(ids: &[u32]) -> Vec<i64> {
    let mut out: Vec<i64> = ids.iter().map(|&id| id as i64).collect();
    if out.len() > MAX_SOURCE_POSITIONS {
        out.truncate(MAX_SOURCE_POSITIONS - 1);
        out.push(EOS_ID as i64);
    }
    out
}

/// Tokens that would complete an n-gram already present in `generated`.
fn banned_ngram_tokens(generated: &[u32], n: usize) -> Vec<u32> {
    if n == 0 || generated.len() < n {
        return Vec::new();
    }
    let prefix = &generated[generated.len() - (n - 1)..];
    generated
        .windows(n)
        .filter(|w| &w[..n - 1] == prefix)
        .map(|w| w[n - 1])
        .collect()
}

/// Log-softmax in place.
fn log_softmax(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return;
    }
    let log_sum = scores.iter().map(|&s| (s - max).exp()).sum::<f32>().ln() + max;
    for s in scores.iter_mut() {
        *s -= log_sum;
    }
}

/// Apply the generation constraints to one beam's log-probabilities:
/// no EOS before `bounds.min` tokens, no repeated trigram, and only EOS once
/// the sequence is one token short of `bounds.max`.
fn mask_scores(scores: &mut [f32], generated: &[u32], bounds: LengthBounds) {
    if generated.len() < bounds.min {
        if let Some(s) = scores.get_mut(EOS_ID as usize) {
            *s = f32::NEG_INFINITY;
        }
    }
    for banned in banned_ngram_tokens(generated, NO_REPEAT_NGRAM) {
        if let Some(s) = scores.get_mut(banned as usize) {
            *s = f32::NEG_INFINITY;
        }
    }
    if generated.len() + 1 >= bounds.max {
        for (id, s) in scores.iter_mut().enumerate() {
            *s = if id == EOS_ID as usize { 0.0 } else { f32::NEG_INFINITY };
        }
    }
}

/// Highest `k` finite scores as `(score, token)`, best first, ties to the lowest id.
fn top_k(scores: &[f32], k: usize) -> Vec<(f32, u32)> {
    let mut ranked: Vec<(f32, u32)> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .map(|(id, &s)| (s, id as u32))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.truncate(k);
    ranked
}

/// A finished hypothesis, EOS excluded.
struct Hypothesis {
    tokens: Vec<u32>,
    score: f32,
}

impl Hypothesis {
    fn new(tokens: Vec<u32>, sum_logprobs: f32) -> Self {
        let score = sum_logprobs / (tokens.len() as f32).powf(LENGTH_PENALTY);
        Self { tokens, score }
    }
}

/// Beam search over `next_logits`, which maps a decoder prefix to raw
/// next-token logits.
///
/// Starts from `</s> <s>`, keeps [`NUM_BEAMS`] live beams, and ranks finished
/// hypotheses by `sum_logprobs / len^LENGTH_PENALTY`. Stops as soon as
/// [`NUM_BEAMS`] hypotheses have finished. EOS is forced at `bounds.max`.
fn beam_search<F>(bounds: LengthBounds, mut next_logits: F) -> Result<Vec<u32>>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>>,
{
    let mut beams: Vec<(Vec<u32>, f32)> = vec![(vec![DECODER_START_ID, BOS_ID], 0.0)];
    let mut finished: Vec<Hypothesis> = Vec::new();

    while finished.len() < NUM_BEAMS && !beams.is_empty() {
        // (total log-prob, beam index, token)
        let mut candidates: Vec<(f32, usize, u32)> = Vec::new();
        for (index, (tokens, beam_score)) in beams.iter().enumerate() {
            let mut scores = next_logits(tokens)?;
            log_softmax(&mut scores);
            mask_scores(&mut scores, tokens, bounds);
            for (score, token) in top_k(&scores, 2 * NUM_BEAMS) {
                candidates.push((beam_score + score, index, token));
            }
        }
        candidates.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });
        candidates.truncate(2 * NUM_BEAMS);

        let mut next_beams = Vec::with_capacity(NUM_BEAMS);
        for (rank, (score, index, token)) in candidates.into_iter().enumerate() {
            if token == EOS_ID {
                // An EOS outside the top NUM_BEAMS would displace a live beam.
                if rank < NUM_BEAMS {
                    finished.push(Hypothesis::new(beams[index].0.clone(), score));
                }
            } else {
                let mut tokens = beams[index].0.clone();
                tokens.push(token);
                next_beams.push((tokens, score));
            }
            if next_beams.len() == NUM_BEAMS {
                break;
            }
        }
        beams = next_beams;
    }

    if finished.is_empty() {
        // Only reachable when the bounds leave no admissible token.
        for (tokens, score) in beams {
            finished.push(Hypothesis::new(tokens, score));
        }
    }
    finished
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|h| h.tokens)
        .ok_or_else(|| anyhow!("beam search produced no hypothesis"))
}

/// Set when the owning request goes away; the decode loop checks it between steps.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

struct Seq2Seq {
    tokenizer: tokenizers::Tokenizer,
    encoder: OnnxGraph,
    decoder: OnnxGraph,
}

impl Seq2Seq {
    fn summarize(&self, text: &str, bounds: LengthBounds, cancel: &AtomicBool) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenize: {}", e))?;
        let ids = source_ids(encoding.get_ids());
        if ids.is_empty() {
            bail!("input text produced no tokens");
        }
        let mask = id_tensor(&vec![1i64; ids.len()])?;

        let hidden = self
            .encoder
            .run_named(vec![("input_ids", id_tensor(&ids)?), ("attention_mask", mask.clone())])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Encoder produced no output"))?;

        let tokens = beam_search(bounds, |generated| {
            if cancel.load(Ordering::Relaxed) {
                bail!("generation cancelled");
            }
            self.next_token_logits(generated, &hidden, &mask)
        })?;

        let summary = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| anyhow!("Detokenize: {}", e))?;
        Ok(summary.trim().to_string())
    }

    fn next_token_logits(
        &self,
        generated: &[u32],
        hidden: &TValue,
        mask: &TValue,
    ) -> Result<Vec<f32>> {
        let decoder_ids: Vec<i64> = generated.iter().map(|&id| id as i64).collect();
        let outputs = self.decoder.run_named(vec![
            ("input_ids", id_tensor(&decoder_ids)?),
            ("encoder_attention_mask", mask.clone()),
            ("encoder_hidden_states", hidden.clone()),
        ])?;
        let logits = outputs
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Decoder produced no output"))?;
        let view = logits
            .to_array_view::<f32>()
            .map_err(|e| anyhow!("Logits to array: {}", e))?;

        // [batch, decoder_len, vocab]
        let shape = view.shape();
        if shape.len() != 3 || shape[1] == 0 {
            bail!("Unexpected logits shape: {:?}", shape);
        }
        let last = shape[1] - 1;
        Ok(view.slice(ndarray::s![0, last, ..]).iter().copied().collect())
    }
}

/// Summarizer running a local BART-family model.
pub struct LocalSummarizer {
    model_name: String,
    inner: Arc<Seq2Seq>,
}

impl LocalSummarizer {
    /// Download (first run only) and load the configured model.
    ///
    /// Blocking: call from `spawn_blocking` when inside the async runtime.
    pub fn load(config: &SummarizerConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let repo = model_repo(&model_name)?;
        let model_dir = cache_dir(config)?.join(&model_name);

        let encoder_path = model_dir.join(ENCODER_FILE);
        let decoder_path = model_dir.join(DECODER_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        download_to_cache(repo, ENCODER_FILE, &encoder_path)?;
        download_to_cache(repo, DECODER_FILE, &decoder_path)?;
        download_to_cache(repo, TOKENIZER_FILE, &tokenizer_path)?;

        tracing::info!(model = %model_name, dir = %model_dir.display(), "loading summarization model");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Load tokenizer: {}", e))?;
        let encoder = OnnxGraph::load(&encoder_path)?;
        let decoder = OnnxGraph::load(&decoder_path)?;

        Ok(Self {
            model_name,
            inner: Arc::new(Seq2Seq {
                tokenizer,
                encoder,
                decoder,
            }),
        })
    }
}

#[async_trait]
impl Summarizer for LocalSummarizer {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn summarize(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizeError> {
        let inner = self.inner.clone();
        let text = text.to_string();
        let cancel = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancel.clone());
        tokio::task::spawn_blocking(move || inner.summarize(&text, bounds, &cancel))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    SummarizeError::Inference("model panicked during generation".to_string())
                } else {
                    SummarizeError::Inference(e.to_string())
                }
            })?
            .map_err(|e| SummarizeError::Inference(format!("{:#}", e)))
    }
}
