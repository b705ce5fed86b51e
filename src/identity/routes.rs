//! Static request-path classification for the session gate.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a non-guest identity.
    Protected,
    /// Only meaningful for visitors without a session; authenticated requests
    /// are redirected away.
    AuthOnly,
    Public,
}

/// Fixed, ordered classification table. Evaluation is longest-prefix match
/// with segment boundaries; anything unmatched is Public.
pub const ROUTE_TABLE: &[(&str, RouteClass)] = &[
    ("/dashboard", RouteClass::Protected),
    ("/members", RouteClass::Protected),
    ("/events", RouteClass::Protected),
    ("/profile", RouteClass::Protected),
    ("/tools", RouteClass::Protected),
    ("/login", RouteClass::AuthOnly),
];

fn prefix_matches(path: &str, prefix: &str) -> bool {
    if !path.starts_with(prefix) { return false; }
    // Boundary check: "/eventsfeed" must not match "/events".
    matches!(path.as_bytes().get(prefix.len()), None | Some(b'/'))
}

pub fn classify_path(path: &str) -> RouteClass {
    let mut best: Option<(&str, RouteClass)> = None;
    for &(prefix, class) in ROUTE_TABLE {
        if prefix_matches(path, prefix) {
            match best {
                Some((b, _)) if b.len() >= prefix.len() => {}
                _ => best = Some((prefix, class)),
            }
        }
    }
    best.map(|(_, c)| c).unwrap_or(RouteClass::Public)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_prefixes() {
        assert_eq!(classify_path("/dashboard"), RouteClass::Protected);
        assert_eq!(classify_path("/events/42"), RouteClass::Protected);
        assert_eq!(classify_path("/members/abc/notes"), RouteClass::Protected);
        assert_eq!(classify_path("/tools"), RouteClass::Protected);
    }

    #[test]
    fn auth_only_and_public() {
        assert_eq!(classify_path("/login"), RouteClass::AuthOnly);
        assert_eq!(classify_path("/"), RouteClass::Public);
        assert_eq!(classify_path("/about"), RouteClass::Public);
        assert_eq!(classify_path("/session"), RouteClass::Public);
    }

    #[test]
    fn prefix_needs_a_segment_boundary() {
        assert_eq!(classify_path("/eventsfeed"), RouteClass::Public);
        assert_eq!(classify_path("/loginhelp"), RouteClass::Public);
        assert_eq!(classify_path("/profilex/1"), RouteClass::Public);
    }
}
