use std::path::PathBuf;

/// Errors surfaced by the GPU resource layer.
///
/// All of these are initialization-time failures: there is no valid
/// degraded state for a renderer that cannot allocate its resources, so
/// callers propagate them and stop. Frame operations (uploads, draws) do
/// not return errors; runtime GPU faults go through the backend's
/// uncaptured-error handler instead.
#[derive(Debug)]
pub enum GpuError {
    /// Reading a shader source file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Shader source failed to compile.
    ShaderCompile(String),

    /// Pipeline creation (the link step) failed.
    PipelineLink(String),

    /// No suitable GPU adapter was found.
    AdapterRequest(String),

    /// The adapter refused the requested device features or limits.
    DeviceRequest(String),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::Io { path, source } => {
                write!(f, "failed to read shader source {}: {}", path.display(), source)
            }
            GpuError::ShaderCompile(msg) => write!(f, "shader compilation failed: {}", msg),
            GpuError::PipelineLink(msg) => write!(f, "pipeline link failed: {}", msg),
            GpuError::AdapterRequest(msg) => write!(f, "no suitable GPU adapter: {}", msg),
            GpuError::DeviceRequest(msg) => write!(f, "GPU device request failed: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
