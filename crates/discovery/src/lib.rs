//! Discovery trait engine for Bitbucket sources.
//!
//! Decides, per repository, which heads are candidates, which are filtered
//! out and which are trusted. Configured [`DiscoveryTrait`]s are folded over
//! an empty [`DiscoveryContext`] before anything is fetched; the resulting
//! want-flags, filters and authorities then drive one [`SourceRequest`].
//!
//! ## Architectural Layer
//!
//! **Business logic.** The provider is reached only through
//! [`scm::BitbucketApi`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`context`] | [`DiscoveryContext`], [`HeadFilter`], [`HeadAuthority`] |
//! | [`traits`] | [`DiscoveryTrait`], branch discovery, SSH checkout, [`TraitSpec`] |
//! | [`filters`] | PR-based branch filters and the branch authority |
//! | [`request`] | [`SourceRequest`] and [`HeadOrigin`] |
//! | [`checkout`] | [`CheckoutBuilder`] and [`CheckoutSpec`] |
//! | [`scanner`] | [`SourceScanner`], the fetch-and-filter pipeline |
//! | [`errors`] | [`DiscoveryError`] |

pub mod checkout;
pub mod context;
pub mod errors;
pub mod filters;
pub mod request;
pub mod scanner;
pub mod traits;

pub use checkout::{CheckoutBuilder, CheckoutSpec};
pub use context::{DiscoveryContext, HeadAuthority, HeadFilter};
pub use errors::DiscoveryError;
pub use filters::{BranchHeadAuthority, ExcludeOriginPrBranchesFilter, OnlyOriginPrBranchesFilter};
pub use request::{HeadOrigin, SourceRequest};
pub use scanner::{DiscoveredHead, SourceScanner};
pub use traits::{
    build_traits, BranchDiscoveryTrait, BranchStrategy, DiscoveryTrait, SshCheckoutTrait,
    TraitSpec,
};
