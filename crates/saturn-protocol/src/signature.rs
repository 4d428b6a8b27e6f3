//! Run-signature generation.

use uuid::Uuid;

/// Signature used when none was supplied and none could be generated.
///
/// Marks unattended invocations (cron-style triggers) that never target a
/// specific run when stopping.
pub const FALLBACK_SIGNATURE: &str = "cron";

/// Generate a fresh run-signature (UUID v7, time ordered).
pub fn new_run_signature() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures_are_unique() {
        let a = new_run_signature();
        let b = new_run_signature();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
