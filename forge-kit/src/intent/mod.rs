//! Intent normalization
//!
//! Turns the intent step's raw output into an [`IntentDecision`]. Decoding
//! happens in two stages: a strict JSON parse that fails on syntax errors,
//! then a total coercion stage that maps every out-of-domain value to the
//! caller's default instead of failing.

pub mod decision;
pub mod normalize;

pub use decision::IntentDecision;
pub use normalize::{
    apply_consistency, clamp_confidence, coerce_operation, coerce_platform, coerce_platforms,
    parse_intent, strip_code_fence,
};
