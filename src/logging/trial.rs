//! Trial ID generation

use uuid::Uuid;

/// Generate a new trial ID using UUID v4
///
/// The trial ID is the idempotency key for billing and for the persisted
/// records of one grading attempt.
///
/// # Examples
///
/// ```
/// use examen::logging::generate_trial_id;
///
/// let trial_id = generate_trial_id();
/// assert!(!trial_id.is_empty());
/// ```
pub fn generate_trial_id() -> String {
    Uuid::new_v4().to_string()
}
