//! Candle-backed LSTM sequence classifier.
//!
//! Weights come from a safetensors export of the trained model; the label
//! vocabulary from a JSON sidecar (an array of strings, index-aligned with
//! the output head).

use super::service::SignClassifier;
use crate::types::features::FEATURE_DIM;
use crate::types::FeatureVector;
use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{linear, lstm, Linear, Module, VarBuilder, LSTM, LSTMConfig, RNN};

/// Hidden width of each recurrent layer.
const HIDDEN_DIM: usize = 256;
/// Stacked recurrent layers.
const NUM_LAYERS: usize = 3;

pub struct LstmClassifier {
    layers: Vec<LSTM>,
    fc1: Linear,
    fc2: Linear,
    labels: Vec<String>,
    device: Device,
}

impl LstmClassifier {
    pub fn load(model_path: &str, labels_path: &str, device: Device) -> Result<Self> {
        let raw = std::fs::read_to_string(labels_path)
            .with_context(|| format!("reading label vocabulary from {labels_path}"))?;
        let labels: Vec<String> =
            serde_json::from_str(&raw).context("label sidecar must be a JSON array of strings")?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[model_path], DType::F32, &device)
                .with_context(|| format!("loading weights from {model_path}"))?
        };
        Self::from_varbuilder(vb, labels, device)
    }

    fn from_varbuilder(vb: VarBuilder, labels: Vec<String>, device: Device) -> Result<Self> {
        if labels.is_empty() {
            bail!("label vocabulary is empty");
        }
        let lstm_vb = vb.pp("lstm");
        let mut layers = Vec::with_capacity(NUM_LAYERS);
        for layer_idx in 0..NUM_LAYERS {
            let in_dim = if layer_idx == 0 { FEATURE_DIM } else { HIDDEN_DIM };
            let config = LSTMConfig {
                layer_idx,
                ..Default::default()
            };
            layers.push(lstm(in_dim, HIDDEN_DIM, config, lstm_vb.clone())?);
        }
        let fc1 = linear(HIDDEN_DIM, HIDDEN_DIM, vb.pp("fc1"))?;
        let fc2 = linear(HIDDEN_DIM, labels.len(), vb.pp("fc2"))?;
        Ok(Self {
            layers,
            fc1,
            fc2,
            labels,
            device,
        })
    }

    /// `window`: (1, seq_len, FEATURE_DIM) → logits (1, num_labels).
    fn forward(&self, window: &Tensor) -> Result<Tensor> {
        let mut x = window.clone();
        let mut last_h: Option<Tensor> = None;
        for layer in &self.layers {
            let states = layer.seq(&x)?;
            let hs: Vec<Tensor> = states.iter().map(|s| s.h().clone()).collect();
            last_h = hs.last().cloned();
            x = Tensor::stack(&hs, 1)?;
        }
        let last = last_h.context("empty input sequence")?;
        let hidden = self.fc1.forward(&last)?.relu()?;
        Ok(self.fc2.forward(&hidden)?)
    }
}

impl SignClassifier for LstmClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, window: &[FeatureVector]) -> Result<String> {
        if window.is_empty() {
            bail!("cannot classify an empty window");
        }
        let seq_len = window.len();
        let mut flat = Vec::with_capacity(seq_len * FEATURE_DIM);
        for features in window {
            flat.extend_from_slice(features.as_slice());
        }
        let x = Tensor::from_vec(flat, (1, seq_len, FEATURE_DIM), &self.device)?;
        let logits = self.forward(&x)?;
        let idx = logits.argmax(D::Minus1)?.squeeze(0)?.to_scalar::<u32>()? as usize;
        self.labels
            .get(idx)
            .cloned()
            .with_context(|| format!("classifier produced out-of-range label index {idx}"))
    }
}
