//! Error types for program execution and native code generation.

use thiserror::Error;

/// Errors that can occur while compiling or executing a program.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The program violates a structural requirement of the instruction set.
    #[error("invalid program: {0}")]
    Spec(#[from] randmath_spec::SpecError),

    /// The operating system refused to map a page for generated code.
    #[error("failed to map {size} bytes of executable memory")]
    ExecMapFailed { size: usize },

    /// Emitting the next chunk of machine code would overflow the code buffer.
    #[error("code buffer overflow: {used} bytes used, {requested} more requested, capacity {capacity}")]
    CodeCapacityExceeded {
        used: usize,
        requested: usize,
        capacity: usize,
    },

    /// The code buffer was already sealed for execution and can no longer be written.
    #[error("code buffer is frozen; no further writes are allowed")]
    BufferFrozen,

    /// Native code generation is not available on this target.
    #[error("native code generation is only supported on x86-64 unix targets")]
    UnsupportedPlatform,
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RuntimeError::ExecMapFailed { size: 8192 };
        assert_eq!(
            err.to_string(),
            "failed to map 8192 bytes of executable memory"
        );

        let err = RuntimeError::CodeCapacityExceeded {
            used: 8190,
            requested: 11,
            capacity: 8192,
        };
        assert!(err.to_string().contains("8190 bytes used"));
        assert!(err.to_string().contains("11 more requested"));

        let err = RuntimeError::BufferFrozen;
        assert!(err.to_string().contains("frozen"));
    }

    #[test]
    fn test_spec_error_conversion() {
        let spec_err = randmath_spec::SpecError::MissingHalt;
        let err: RuntimeError = spec_err.into();
        assert!(matches!(err, RuntimeError::Spec(_)));
    }
}
