use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static DOMAIN_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9-]+\.[A-Za-z]{2,}").expect("domain fallback pattern is valid")
});

/// Turns a bare domain or a full URL into the lowercase key used everywhere else.
///
/// Returns `None` when nothing usable can be recovered. Bare tokens are only cut at
/// the first `/` and lowercased; no further validation happens on them, so
/// `"not a domain"` comes back as-is.
pub fn normalize_domain(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if !token.contains("://") {
        let domain = token.split('/').next().unwrap_or_default().to_lowercase();
        return (!domain.is_empty()).then_some(domain);
    }

    match Url::parse(token) {
        Ok(url) => {
            let host = url.host_str()?.to_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);
            (!host.is_empty()).then(|| host.to_string())
        }
        Err(_) => DOMAIN_LIKE
            .find(token)
            .map(|found| found.as_str().to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domains_are_lowercased() {
        assert_eq!(normalize_domain("Stripe.COM"), Some("stripe.com".to_string()));
        assert_eq!(normalize_domain("  example.org  "), Some("example.org".to_string()));
    }

    #[test]
    fn test_bare_domain_path_is_dropped() {
        assert_eq!(
            normalize_domain("example.com/about/team"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_url_and_bare_forms_agree() {
        let from_url = normalize_domain("https://www.Example.com/path");
        assert_eq!(from_url, Some("example.com".to_string()));
        assert_eq!(from_url, normalize_domain("example.com"));
    }

    #[test]
    fn test_url_query_fragment_and_port_are_dropped() {
        assert_eq!(
            normalize_domain("http://shop.example.com:8080/cart?id=3#top"),
            Some("shop.example.com".to_string())
        );
    }

    #[test]
    fn test_canonical_domains_are_fixed_points() {
        for domain in ["stripe.com", "salesforce.com", "api.example.co.uk", "my-site.io"] {
            assert_eq!(normalize_domain(domain).as_deref(), Some(domain));
        }
    }

    #[test]
    fn test_empty_input_is_unparseable() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("   "), None);
        assert_eq!(normalize_domain("/just/a/path"), None);
    }

    #[test]
    fn test_degenerate_bare_token_is_accepted() {
        assert_eq!(normalize_domain("not a domain"), Some("not a domain".to_string()));
    }

    #[test]
    fn test_broken_url_falls_back_to_pattern_scan() {
        assert_eq!(
            normalize_domain("https://exa mple.com/page"),
            Some("mple.com".to_string())
        );
        assert_eq!(normalize_domain("https://"), None);
    }

    #[test]
    fn test_url_without_host_is_unparseable() {
        assert_eq!(normalize_domain("file:///etc/hosts"), None);
    }
}
