//! Environment variable utilities
//!
//! Small typed accessors over `std::env::var`, used for logging setup and by
//! the cmd/ binaries. Unset or unparsable values fall back to the default.

use std::str::FromStr;

/// Get an environment variable parsed as `T`, or the default.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get an environment variable as a boolean.
///
/// "1", "true", "yes", "on" (case-insensitive) are true; any other set value
/// is false; unset returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get an environment variable as `Some(T)` when set and parsable.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_get_default() {
        assert_eq!(env_get::<usize>("IDXSYNC_TEST_UNSET_VAR", 7), 7);
    }

    #[test]
    fn test_env_get_set() {
        std::env::set_var("IDXSYNC_TEST_COUNT", "42");
        assert_eq!(env_get::<usize>("IDXSYNC_TEST_COUNT", 0), 42);
    }

    #[test]
    fn test_env_get_bool() {
        std::env::set_var("IDXSYNC_TEST_FLAG", "yes");
        assert!(env_get_bool("IDXSYNC_TEST_FLAG", false));
        std::env::set_var("IDXSYNC_TEST_FLAG", "nope");
        assert!(!env_get_bool("IDXSYNC_TEST_FLAG", true));
        assert!(env_get_bool("IDXSYNC_TEST_FLAG_UNSET", true));
    }

    #[test]
    fn test_env_get_opt() {
        assert_eq!(env_get_opt::<u16>("IDXSYNC_TEST_OPT_UNSET"), None);
        std::env::set_var("IDXSYNC_TEST_OPT", "9200");
        assert_eq!(env_get_opt::<u16>("IDXSYNC_TEST_OPT"), Some(9200));
    }
}
