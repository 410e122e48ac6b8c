/// Interpret a request or environment value as a boolean flag.
///
/// Returns `None` for anything that is not a recognized spelling, which callers
/// treat the same as the value not being supplied at all.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" | "on" | "t" => Some(true),
        "false" | "0" | "no" | "off" | "f" => Some(false),
        _ => None,
    }
}

/// An explicit request value always wins; without one the configured default applies.
pub fn resolve_flag(explicit: Option<bool>, configured: bool) -> bool {
    explicit.unwrap_or(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        for truthy in ["true", "1", "yes", "on", "t"] {
            assert_eq!(parse_flag(truthy), Some(true), "{}", truthy);
        }
        for falsy in ["false", "0", "no", "off", "f"] {
            assert_eq!(parse_flag(falsy), Some(false), "{}", falsy);
        }
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("TRUE"), None);
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_resolve_flag_precedence() {
        assert!(resolve_flag(Some(true), false));
        assert!(!resolve_flag(Some(false), true));
        assert!(resolve_flag(None, true));
        assert!(!resolve_flag(None, false));
    }
}
