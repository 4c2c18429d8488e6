//! Service naming, path rewriting and tag filtering.

use std::path::Path;

/// Prefix of the tag that records which service an operation came from.
pub const SERVICE_TAG_PREFIX: &str = "service:";

const SERVICE_SUFFIXES: [&str; 4] = ["-service", ".service", "-api", ".api"];

/// Strips the first matching suffix of `-service`, `.service`, `-api`, `.api` from a
/// file stem. At most one suffix is removed.
pub fn extract_service_name(stem: &str) -> &str {
    SERVICE_SUFFIXES
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .unwrap_or(stem)
}

/// Service name derived from the file stem of `path`.
pub fn service_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    extract_service_name(&stem).to_string()
}

/// Collapses every run of `/` into a single `/`.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut previous_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(ch);
    }
    normalized
}

/// `base_url + prefix + path`, normalized.
pub fn join_path(base_url: &str, prefix: &str, path: &str) -> String {
    normalize_path(&format!("{base_url}{prefix}{path}"))
}

pub fn service_tag(service: &str) -> String {
    format!("{SERVICE_TAG_PREFIX}{service}")
}

/// The service recorded in a tag list, if any.
pub fn service_from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    tags.into_iter()
        .find_map(|tag| tag.strip_prefix(SERVICE_TAG_PREFIX))
}

/// Include/exclude filter over operation tags. An empty list lets everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl TagFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Whether an operation with `tags` is kept.
    pub fn allows<'a>(&self, tags: impl IntoIterator<Item = &'a str> + Clone) -> bool {
        let included = self.include.is_empty()
            || tags
                .clone()
                .into_iter()
                .any(|tag| self.include.iter().any(|include| include == tag));
        let excluded = !self.exclude.is_empty()
            && tags
                .into_iter()
                .any(|tag| self.exclude.iter().any(|exclude| exclude == tag));
        included && !excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_service_name_strips_one_known_suffix() {
        //* Then
        assert_eq!(extract_service_name("user-service"), "user");
        assert_eq!(extract_service_name("order.service"), "order");
        assert_eq!(extract_service_name("billing-api"), "billing");
        assert_eq!(extract_service_name("auth.api"), "auth");
        assert_eq!(extract_service_name("payments"), "payments");
    }

    #[test]
    fn extract_service_name_strips_only_the_first_match() {
        //* Then
        assert_eq!(extract_service_name("user-api-service"), "user-api");
        assert_eq!(extract_service_name("user-service-api"), "user-service");
    }

    #[test]
    fn service_name_from_path_uses_file_stem() {
        //* Then
        assert_eq!(
            service_name_from_path(Path::new("specs/user-service.yaml")),
            "user"
        );
        assert_eq!(service_name_from_path(Path::new("orders.json")), "orders");
    }

    #[test]
    fn normalize_path_collapses_slash_runs() {
        //* Then
        assert_eq!(normalize_path("//api///v1//users/"), "/api/v1/users/");
        assert_eq!(normalize_path("/users/{id}"), "/users/{id}");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn join_path_with_trailing_and_leading_slashes_yields_single_slashes() {
        //* Then
        assert_eq!(join_path("/api/", "/v1/", "/users"), "/api/v1/users");
        assert_eq!(join_path("", "", "/users"), "/users");
        assert_eq!(join_path("/", "", "/users"), "/users");
    }

    #[test]
    fn service_from_tags_finds_service_tag() {
        //* Then
        assert_eq!(service_from_tags(["users", "service:user"]), Some("user"));
        assert_eq!(service_from_tags(["users"]), None);
    }

    #[test]
    fn tag_filter_with_empty_lists_allows_everything() {
        //* Given
        let filter = TagFilter::default();

        //* Then
        assert!(filter.allows(["anything"]));
        assert!(filter.allows(std::iter::empty::<&str>()));
    }

    #[test]
    fn tag_filter_requires_include_and_rejects_exclude() {
        //* Given
        let filter = TagFilter::new(vec!["public".into()], vec!["internal".into()]);

        //* Then
        assert!(filter.allows(["public", "users"]));
        assert!(!filter.allows(["users"]), "missing include tag");
        assert!(!filter.allows(["public", "internal"]), "has exclude tag");
        assert!(!filter.allows(std::iter::empty::<&str>()));
    }
}
