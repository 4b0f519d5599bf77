use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// Parse or validation failure; `diagnostic` carries the rendered report.
    #[error("shader `{label}` failed to compile:\n{diagnostic}")]
    Compile { label: String, diagnostic: String },

    /// Stages do not fit together or a required binding is missing.
    #[error("shader `{label}` failed to link: {reason}")]
    Link { label: String, reason: String },
}

impl ShaderError {
    pub fn label(&self) -> &str {
        match self {
            Self::Compile { label, .. } | Self::Link { label, .. } => label,
        }
    }
}
