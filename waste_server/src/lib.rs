pub mod endpoints;
pub mod error;
pub mod nn;
pub mod page;
pub mod provision;
pub mod state;

#[cfg(test)]
#[path = "../tests/support/onnx_graph.rs"]
mod onnx_graph;

/// Error type.
pub type Error = Box<dyn std::error::Error>;

/// Release location of the MobileNetV2 waste checkpoint.
pub const DEFAULT_MODEL_URL: &str =
    "https://github.com/your-username/your-repo/releases/download/v1.0.0/mobilenet_v2_model.onnx";

/// Local cache location of the checkpoint, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "mobilenet_v2_model.onnx";
