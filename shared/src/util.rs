//! Small helpers shared across crates

/// Current time as Unix milliseconds
#[inline]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new random identifier (UUID v4)
#[inline]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_now_millis_is_positive() {
        assert!(now_millis() > 1_600_000_000_000);
    }
}
