//! Security requirement lists.
//!
//! A [`SecurityRequirement`] is an AND-group mapping scheme names to the scopes it
//! needs. [`SecurityRequirements`] is an ordered list of such groups with OR semantics:
//! a request is authorized when it satisfies any one group.

use specforge_core::SecurityRequirement;

/// An ordered OR-list of security requirements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecurityRequirements {
    requirements: Vec<SecurityRequirement>,
}

impl SecurityRequirements {
    /// Creates an empty list.
    ///
    /// An empty list attached to an operation marks it public.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of [`new`](Self::new) that reads better at call sites.
    pub fn public() -> Self {
        Self::default()
    }

    /// Appends one requirement satisfied by `scheme` with all of `scopes`.
    pub fn require<I, S>(mut self, scheme: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut requirement = SecurityRequirement::new();
        requirement.insert(scheme.into(), scopes.into_iter().map(Into::into).collect());
        self.requirements.push(requirement);
        self
    }

    /// Appends one requirement that needs every listed scheme at once.
    pub fn require_all<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let requirement = schemes
            .into_iter()
            .map(|(scheme, scopes)| (scheme.into(), scopes))
            .collect();
        self.requirements.push(requirement);
        self
    }

    /// Appends one scope-less requirement per scheme, so any of them suffices.
    pub fn any_of<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for scheme in schemes {
            let mut requirement = SecurityRequirement::new();
            requirement.insert(scheme.into(), Vec::new());
            self.requirements.push(requirement);
        }
        self
    }

    /// Appends the requirements of `other`.
    pub fn extend(mut self, other: SecurityRequirements) -> Self {
        self.requirements.extend(other.requirements);
        self
    }

    /// The requirements in order.
    pub fn as_slice(&self) -> &[SecurityRequirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Scheme names referenced by any requirement, in first-seen order, deduplicated.
    pub fn scheme_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.requirements.iter().flat_map(|req| req.keys()) {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        names
    }

    pub fn into_vec(self) -> Vec<SecurityRequirement> {
        self.requirements
    }
}

impl From<Vec<SecurityRequirement>> for SecurityRequirements {
    fn from(requirements: Vec<SecurityRequirement>) -> Self {
        Self { requirements }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_adds_single_and_group_with_scopes() {
        //* Given
        let requirements = SecurityRequirements::new().require("oauth", ["read", "write"]);

        //* When
        let value = serde_json::to_value(requirements.as_slice()).expect("should serialize");

        //* Then
        assert_eq!(value, serde_json::json!([{"oauth": ["read", "write"]}]));
    }

    #[test]
    fn any_of_adds_one_alternative_per_scheme() {
        //* Given
        let requirements = SecurityRequirements::new().any_of(["bearer", "apiKey"]);

        //* When
        let value = serde_json::to_value(requirements.as_slice()).expect("should serialize");

        //* Then
        assert_eq!(
            value,
            serde_json::json!([{"bearer": []}, {"apiKey": []}])
        );
    }

    #[test]
    fn require_all_combines_schemes_in_one_requirement() {
        //* Given
        let requirements = SecurityRequirements::new()
            .require_all([("bearer", Vec::new()), ("tenant", vec!["t1".to_string()])]);

        //* When
        let value = serde_json::to_value(requirements.as_slice()).expect("should serialize");

        //* Then
        assert_eq!(
            value,
            serde_json::json!([{"bearer": [], "tenant": ["t1"]}])
        );
    }

    #[test]
    fn scheme_names_deduplicates_in_order() {
        //* Given
        let requirements = SecurityRequirements::new()
            .require("bearer", ["admin"])
            .any_of(["apiKey", "bearer"]);

        //* When
        let names = requirements.scheme_names();

        //* Then
        assert_eq!(names, ["bearer", "apiKey"]);
    }

    #[test]
    fn public_requirements_are_empty() {
        //* When
        let requirements = SecurityRequirements::public();

        //* Then
        assert!(requirements.is_empty());
    }
}
