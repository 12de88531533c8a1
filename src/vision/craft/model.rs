// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CRAFT text detection model
//!
//! Wraps an ONNX export of the CRAFT network. The session is created once
//! and shared by reference for every image in a run.

use ndarray::Array4;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::heatmap::{HeatmapProducer, ScoreMaps};
use super::preprocessing::Canvas;
use crate::config::Device;
use crate::error::SplitError;

/// CRAFT detection model backed by ONNX Runtime
#[derive(Clone)]
pub struct CraftDetectionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Device the session actually runs on
    device: Device,
}

impl std::fmt::Debug for CraftDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CraftDetectionModel")
            .field("input_name", &self.input_name)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

fn build_session(model_path: &Path, device: Device, intra_threads: usize) -> ort::Result<Session> {
    let builder = Session::builder()?;
    let builder = match device {
        Device::Cuda => builder
            .with_execution_providers([CUDAExecutionProvider::default().build().error_on_failure()])?,
        Device::Cpu => {
            builder.with_execution_providers([CPUExecutionProvider::default().build()])?
        }
    };
    builder
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(model_path)
}

impl CraftDetectionModel {
    /// Load the detection model from an ONNX file
    ///
    /// When `Device::Cuda` is requested but the CUDA provider cannot be
    /// initialised, the session is rebuilt on CPU.
    ///
    /// # Errors
    /// - `SplitError::ModelNotFound` if the file does not exist
    /// - `SplitError::ModelLoad` if ONNX Runtime rejects the model
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        device: Device,
        intra_threads: usize,
    ) -> Result<Self, SplitError> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(SplitError::ModelNotFound(model_path.to_path_buf()));
        }

        info!("Loading weights from checkpoint ({})", model_path.display());

        let (session, device) = match device {
            Device::Cuda => match build_session(model_path, Device::Cuda, intra_threads) {
                Ok(session) => {
                    info!("✅ CUDA execution provider initialized");
                    (session, Device::Cuda)
                }
                Err(e) => {
                    warn!("⚠️  CUDA execution provider failed: {}", e);
                    warn!("   Falling back to CPU execution provider");
                    let session = build_session(model_path, Device::Cpu, intra_threads)
                        .map_err(|e| SplitError::ModelLoad(e.to_string()))?;
                    (session, Device::Cpu)
                }
            },
            Device::Cpu => {
                let session = build_session(model_path, Device::Cpu, intra_threads)
                    .map_err(|e| SplitError::ModelLoad(e.to_string()))?;
                (session, Device::Cpu)
            }
        };

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input: {} {:?}", input_name, input.input_type);
        }

        info!("✅ CRAFT detection model loaded ({:?})", device);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            device,
        })
    }

    /// Device the session runs on after any fallback
    pub fn device(&self) -> Device {
        self.device
    }

    /// Run the network on a canvas tensor of shape [1, 3, H, W]
    pub fn infer(&self, input: &Array4<f32>) -> Result<ScoreMaps, SplitError> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            return Err(SplitError::Inference(format!(
                "invalid input shape {:?}, expected [1, 3, H, W]",
                shape
            )));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| SplitError::Inference("detection session lock poisoned".into()))?;

        let input_value = Value::from_array(input.to_owned())
            .map_err(|e| SplitError::Inference(format!("failed to create input tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .map_err(|e| SplitError::Inference(e.to_string()))?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| SplitError::Inference(format!("failed to extract output: {}", e)))?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let maps = ScoreMaps::from_output(output_tensor.view())?;
        Ok(maps)
    }
}

impl HeatmapProducer for CraftDetectionModel {
    fn produce(&self, canvas: &Canvas) -> Result<ScoreMaps, SplitError> {
        self.infer(&canvas.tensor)
    }
}
