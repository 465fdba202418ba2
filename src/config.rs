use serde::{Deserialize, Serialize};
use std::env;

use crate::services::session::{HISTORY_SIZE, MIN_HISTORY, WINDOW_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub host: String,
    pub port: u16,

    // Model configuration
    pub model_path: String,
    pub labels_path: String,
    pub device: DeviceConfig,

    // Streaming pipeline
    pub window_size: usize,
    pub history_size: usize,
    pub min_history: usize,
    pub classify_timeout_ms: u64,

    // Session lifecycle; 0 keeps sessions for the process lifetime
    pub session_idle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeviceConfig {
    Cpu,
    Cuda(usize),
    Metal,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,

            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/sign_sentence_model.safetensors".to_string()),
            labels_path: env::var("LABELS_PATH")
                .unwrap_or_else(|_| "models/labels.json".to_string()),
            device: DeviceConfig::Cpu,

            window_size: WINDOW_SIZE,
            history_size: HISTORY_SIZE,
            min_history: MIN_HISTORY,
            classify_timeout_ms: env::var("CLASSIFY_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,

            session_idle_secs: env::var("SESSION_IDLE_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()?,
        })
    }

    pub fn to_candle_device(&self) -> candle_core::Device {
        match &self.device {
            DeviceConfig::Cpu => candle_core::Device::Cpu,
            DeviceConfig::Cuda(idx) => {
                candle_core::Device::new_cuda(*idx).unwrap_or(candle_core::Device::Cpu)
            }
            DeviceConfig::Metal => {
                candle_core::Device::new_metal(0).unwrap_or(candle_core::Device::Cpu)
            }
        }
    }
}
