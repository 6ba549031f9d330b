/// Errors raised by the simulator and its configuration layer.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Invalid configuration value; the simulator refuses to build.
    #[error("invalid configuration '{field}': {reason}")]
    Configuration {
        field: &'static str,
        reason: String,
    },

    /// The solution blew up (non-finite or runaway divergence).
    #[error("simulation diverged at step {step}: RMS divergence = {divergence:e}")]
    Diverged { step: u64, divergence: f64 },

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = SimError::config("dx", "must be > 0, got -1");
        let msg = err.to_string();
        assert!(msg.contains("dx"), "message should name the field: {}", msg);
        assert!(msg.contains("must be > 0"), "message should carry the reason: {}", msg);
    }

    #[test]
    fn test_diverged_display() {
        let err = SimError::Diverged { step: 12, divergence: f64::NAN };
        assert!(err.to_string().contains("step 12"));
    }
}
