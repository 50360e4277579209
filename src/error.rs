use thiserror::Error;

/// Everything that can go wrong while mounting or driving an effect.
#[derive(Debug, Error)]
pub enum FxError {
    /// The environment cannot provide what the effect needs (no WebGL2, no 2D context).
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {0}")]
    ProgramLink(String),

    /// A GPU object (buffer, texture, program) could not be created.
    #[error("failed to allocate {0}")]
    ResourceAllocation(&'static str),

    #[error("audio analysis unavailable: {0}")]
    AudioInit(String),

    #[error("text rasterization failed: {0}")]
    Rasterization(String),

    /// The component was used after `dispose()`.
    #[error("{0} used after dispose")]
    Disposed(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Opaque error bubbled up from a browser API.
    #[error("browser error: {0}")]
    Js(String),
}

impl FxError {
    /// Mount failures the selector treats as "try the next cheaper effect"
    /// rather than as application errors.
    pub fn is_capability_signal(&self) -> bool {
        matches!(
            self,
            FxError::CapabilityUnavailable(_)
                | FxError::ShaderCompile { .. }
                | FxError::ProgramLink(_)
                | FxError::ResourceAllocation(_)
                | FxError::Js(_)
        )
    }
}

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        FxError::Config(err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for FxError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        FxError::Js(format!("{value:?}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<FxError> for wasm_bindgen::JsValue {
    fn from(err: FxError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

pub type Result<T> = std::result::Result<T, FxError>;
