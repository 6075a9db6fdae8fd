/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC timestamp in seconds
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Generate a new opaque resource id (UUID v4, hyphenated)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_and_secs_agree() {
        let ms = now_millis();
        let s = now_secs();
        assert!((ms / 1000 - s).abs() <= 1);
    }

    #[test]
    fn test_new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
