//! Site-wide template context
//!
//! Injected into every rendered page and mail.

use crate::config::SiteConfig;
use tera::Context as TeraContext;

/// `DOMAIN`, `SITE_URL`, `SITE_NAME`, `SITE_KEYWORDS`, `SITE_DESCRIPTION`
/// and `STATIC_URL` for `site`
pub fn site_context(site: &SiteConfig) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("DOMAIN", &site.domain);
    context.insert("SITE_URL", &format!("http://www.{}", site.domain));
    context.insert("SITE_NAME", &site.name);
    context.insert("SITE_KEYWORDS", &site.keywords);
    context.insert("SITE_DESCRIPTION", &site.description);
    context.insert("STATIC_URL", &site.static_url);
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_context_keys() {
        let site = SiteConfig {
            domain: "example.com".to_string(),
            name: "Example".to_string(),
            ..Default::default()
        };
        let json = site_context(&site).into_json();
        assert_eq!(json["DOMAIN"], "example.com");
        assert_eq!(json["SITE_URL"], "http://www.example.com");
        assert_eq!(json["SITE_NAME"], "Example");
        assert_eq!(json["STATIC_URL"], "/static/");
        assert!(json.get("SITE_KEYWORDS").is_some());
        assert!(json.get("SITE_DESCRIPTION").is_some());
    }
}
