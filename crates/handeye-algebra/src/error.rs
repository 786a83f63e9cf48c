/// An error type for the algebra module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AlgebraError {
    /// Error when a slice does not have the expected number of components.
    #[error("Expected {expected} components, got {actual}")]
    InvalidDimension {
        /// Number of components required.
        expected: usize,
        /// Number of components provided.
        actual: usize,
    },

    /// Error when a component is NaN or infinite.
    #[error("Component {0} is not finite")]
    NonFinite(usize),
}
