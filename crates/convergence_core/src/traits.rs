use crate::error::EngineError;

/// A real function of one variable that may fail to evaluate.
///
/// This is the seam between the iteration engine and whatever produces
/// g(x): the compiled user expression in production, small hand-written
/// maps in tests.
pub trait UnaryMap {
    /// Evaluates g(x). Implementations return an error instead of a
    /// non-finite value whenever they can tell the result left the reals.
    fn apply(&self, x: f64) -> Result<f64, EngineError>;
}
