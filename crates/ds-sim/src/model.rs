//! TransientModel trait for pluggable dynamic systems.

use crate::error::SimOutcome;

/// A dynamic system `ẋ = f(t, x)` advanced by an [`crate::Integrator`].
///
/// State arithmetic (`add`, `scale`) lives on the model so states can be
/// plain structs.
pub trait TransientModel {
    type State: Clone;

    /// State at t = 0.
    fn initial_state(&self) -> Self::State;

    /// State derivative at `(t, x)`.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimOutcome<Self::State>;

    /// Element-wise `a + b`.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Element-wise `scale * a`.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
