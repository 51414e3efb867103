//! The effective discovery configuration of one scan.
//!
//! A [`DiscoveryContext`] starts empty and is handed through every configured
//! [`DiscoveryTrait`] in order. Each trait returns a decorated copy: want-flags
//! raised, authorities or filters appended. The result is fixed before any
//! data is fetched and is consumed by exactly one [`crate::SourceRequest`].

use std::fmt;
use std::sync::Arc;

use scm::{Head, HeadCategory};

use crate::{DiscoveryTrait, SourceRequest};

/// Decides whether a head's content may be trusted (treated as coming from
/// the repository owners rather than from an outside contributor).
pub trait HeadAuthority: fmt::Debug + Send + Sync {
    /// Returns `true` if this authority vouches for `head`.
    ///
    /// Authorities only answer for the head kinds they know; any other kind
    /// must return `false`.
    fn is_trusted(&self, request: &SourceRequest, head: &Head) -> bool;
}

/// Decides whether a candidate head is dropped from the scan result.
pub trait HeadFilter: fmt::Debug + Send + Sync {
    /// Returns `true` if `head` must not be built.
    ///
    /// Heads of a kind the filter does not handle are never excluded.
    /// Filters only read data already held by `request`; they never fetch.
    fn is_excluded(&self, request: &SourceRequest, head: &Head) -> bool;
}

/// Want-flags, authorities and filters accumulated from discovery traits.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryContext {
    wants_branches: bool,
    wants_origin_prs: bool,
    wants_fork_prs: bool,
    wants_tags: bool,
    categories: Vec<HeadCategory>,
    authorities: Vec<Arc<dyn HeadAuthority>>,
    filters: Vec<Arc<dyn HeadFilter>>,
}

impl DiscoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `traits` over an empty context, in order.
    ///
    /// A head category is enabled when at least one trait includes it.
    pub fn from_traits(traits: &[Arc<dyn DiscoveryTrait>]) -> Self {
        let mut context = traits
            .iter()
            .fold(Self::new(), |context, discovery| discovery.decorate(context));
        for category in [
            HeadCategory::Uncategorized,
            HeadCategory::ChangeRequests,
            HeadCategory::Tags,
        ] {
            if traits.iter().any(|t| t.include_category(category)) {
                context.categories.push(category);
            }
        }
        context
    }

    // -----------------------------------------------------------------------
    // Decoration
    // -----------------------------------------------------------------------

    /// Raises the branch want-flag. Flags are never lowered once raised.
    pub fn want_branches(mut self, include: bool) -> Self {
        self.wants_branches |= include;
        self
    }

    pub fn want_origin_prs(mut self, include: bool) -> Self {
        self.wants_origin_prs |= include;
        self
    }

    pub fn want_fork_prs(mut self, include: bool) -> Self {
        self.wants_fork_prs |= include;
        self
    }

    pub fn want_tags(mut self, include: bool) -> Self {
        self.wants_tags |= include;
        self
    }

    pub fn with_authority(mut self, authority: impl HeadAuthority + 'static) -> Self {
        self.authorities.push(Arc::new(authority));
        self
    }

    /// Registers a filter. Filters are evaluated in registration order.
    pub fn with_filter(mut self, filter: impl HeadFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn wants_branches(&self) -> bool {
        self.wants_branches
    }

    pub fn wants_origin_prs(&self) -> bool {
        self.wants_origin_prs
    }

    pub fn wants_fork_prs(&self) -> bool {
        self.wants_fork_prs
    }

    pub fn wants_tags(&self) -> bool {
        self.wants_tags
    }

    /// Pull request data is needed when either kind of pull request is wanted.
    pub fn wants_pull_requests(&self) -> bool {
        self.wants_origin_prs || self.wants_fork_prs
    }

    /// Returns `true` if some trait asked for heads of `category` to be listed.
    pub fn includes_category(&self, category: HeadCategory) -> bool {
        self.categories.contains(&category)
    }

    pub fn authorities(&self) -> &[Arc<dyn HeadAuthority>] {
        &self.authorities
    }

    pub fn filters(&self) -> &[Arc<dyn HeadFilter>] {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct ExcludeAll;

    impl HeadFilter for ExcludeAll {
        fn is_excluded(&self, _request: &SourceRequest, _head: &Head) -> bool {
            true
        }
    }

    #[test]
    fn want_flags_are_sticky() {
        let context = DiscoveryContext::new()
            .want_branches(true)
            .want_branches(false)
            .want_tags(false);
        assert!(context.wants_branches());
        assert!(!context.wants_tags());
        assert!(!context.wants_pull_requests());
    }

    #[test]
    fn pull_requests_are_wanted_for_either_origin() {
        assert!(DiscoveryContext::new().want_fork_prs(true).wants_pull_requests());
        assert!(DiscoveryContext::new().want_origin_prs(true).wants_pull_requests());
    }

    #[test]
    fn filters_keep_registration_order() {
        let context = DiscoveryContext::new().with_filter(ExcludeAll).with_filter(ExcludeAll);
        assert_eq!(context.filters().len(), 2);
        assert!(context.authorities().is_empty());
    }

    #[test]
    fn empty_trait_list_enables_nothing() {
        let context = DiscoveryContext::from_traits(&[]);
        assert!(!context.wants_branches());
        assert!(!context.includes_category(HeadCategory::Uncategorized));
    }
}
