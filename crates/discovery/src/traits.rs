//! Discovery traits: composable policy objects configured per source.
//!
//! | Trait | Effect |
//! |-------|--------|
//! | [`BranchDiscoveryTrait`] | Want-flags, branch authority and PR-based branch filter |
//! | [`SshCheckoutTrait`] | Forces an SSH checkout with a dedicated credential |
//!
//! Traits are configured through [`TraitSpec`], the serialisable form.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use scm::{CredentialsId, HeadCategory, RepositoryProtocol};

use crate::filters::{BranchHeadAuthority, ExcludeOriginPrBranchesFilter, OnlyOriginPrBranchesFilter};
use crate::{CheckoutBuilder, DiscoveryContext, DiscoveryError};

/// A decorator over the discovery and checkout configuration of a source.
///
/// Implementations are pure functions of their own configuration.
pub trait DiscoveryTrait: fmt::Debug + Send + Sync {
    /// Returns `context` with this trait's flags, authorities and filters added.
    fn decorate(&self, context: DiscoveryContext) -> DiscoveryContext {
        context
    }

    /// Returns `true` if heads of `category` should be listed because of this trait.
    fn include_category(&self, _category: HeadCategory) -> bool {
        false
    }

    /// Returns `builder` with this trait's checkout settings applied.
    fn decorate_checkout(&self, builder: CheckoutBuilder) -> CheckoutBuilder {
        builder
    }
}

// ---------------------------------------------------------------------------
// Branch discovery
// ---------------------------------------------------------------------------

/// Which plain branches are built, relative to open pull requests.
///
/// The numeric id is a bit set: bit 0 builds branches that are not the source
/// of a pull request, bit 1 builds branches that are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchStrategy {
    /// `0`: no branches.
    None,
    /// `1`: branches that are not also filed as pull requests.
    ExcludePullRequests,
    /// `2`: only branches that are also filed as pull requests.
    OnlyPullRequests,
    /// `3`: every branch.
    All,
}

impl BranchStrategy {
    pub fn from_id(strategy_id: u8) -> Result<Self, DiscoveryError> {
        match strategy_id {
            0 => Ok(Self::None),
            1 => Ok(Self::ExcludePullRequests),
            2 => Ok(Self::OnlyPullRequests),
            3 => Ok(Self::All),
            _ => Err(DiscoveryError::InvalidStrategy { strategy_id }),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Self::None => 0,
            Self::ExcludePullRequests => 1,
            Self::OnlyPullRequests => 2,
            Self::All => 3,
        }
    }
}

/// Discovers plain branches of the scanned repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchDiscoveryTrait {
    strategy: BranchStrategy,
}

impl BranchDiscoveryTrait {
    pub fn new(strategy: BranchStrategy) -> Self {
        Self { strategy }
    }

    /// Validates a numeric strategy id from configuration.
    pub fn from_strategy_id(strategy_id: u8) -> Result<Self, DiscoveryError> {
        BranchStrategy::from_id(strategy_id).map(Self::new)
    }

    /// Builds the strategy from the legacy pair of booleans.
    pub fn from_flags(build_branch: bool, build_branch_with_pr: bool) -> Self {
        let id = u8::from(build_branch) | (u8::from(build_branch_with_pr) << 1);
        let strategy = match id {
            1 => BranchStrategy::ExcludePullRequests,
            2 => BranchStrategy::OnlyPullRequests,
            3 => BranchStrategy::All,
            _ => BranchStrategy::None,
        };
        Self::new(strategy)
    }

    pub fn strategy(&self) -> BranchStrategy {
        self.strategy
    }

    pub fn strategy_id(&self) -> u8 {
        self.strategy.id()
    }

    /// Branches that are not the source of a pull request are built.
    pub fn is_build_branch(&self) -> bool {
        self.strategy_id() & 1 != 0
    }

    /// Branches that are the source of a pull request are built.
    pub fn is_build_branches_with_pr(&self) -> bool {
        self.strategy_id() & 2 != 0
    }
}

impl DiscoveryTrait for BranchDiscoveryTrait {
    fn decorate(&self, context: DiscoveryContext) -> DiscoveryContext {
        match self.strategy {
            BranchStrategy::None => context,
            BranchStrategy::ExcludePullRequests => context
                .want_branches(true)
                .with_authority(BranchHeadAuthority)
                .want_origin_prs(true)
                .with_filter(ExcludeOriginPrBranchesFilter),
            BranchStrategy::OnlyPullRequests => context
                .want_branches(true)
                .with_authority(BranchHeadAuthority)
                .want_origin_prs(true)
                .with_filter(OnlyOriginPrBranchesFilter),
            BranchStrategy::All => context
                .want_branches(true)
                .with_authority(BranchHeadAuthority),
        }
    }

    fn include_category(&self, category: HeadCategory) -> bool {
        category.is_uncategorized()
    }
}

// ---------------------------------------------------------------------------
// SSH checkout
// ---------------------------------------------------------------------------

/// Credential id stored by older configurations to mean "no credential".
const LEGACY_ANONYMOUS: &str = "ANONYMOUS";

/// Fetches sources over SSH with a dedicated credential, independent of the
/// credential used to query the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshCheckoutTrait {
    credentials_id: Option<CredentialsId>,
}

impl SshCheckoutTrait {
    /// Blank ids and the legacy `ANONYMOUS` id select the agent's default key.
    pub fn new(credentials_id: Option<&str>) -> Self {
        let credentials_id = credentials_id
            .map(str::trim)
            .filter(|id| *id != LEGACY_ANONYMOUS)
            .and_then(CredentialsId::new);
        Self { credentials_id }
    }

    pub fn credentials_id(&self) -> Option<&CredentialsId> {
        self.credentials_id.as_ref()
    }
}

impl DiscoveryTrait for SshCheckoutTrait {
    fn decorate_checkout(&self, builder: CheckoutBuilder) -> CheckoutBuilder {
        builder.with_credentials(self.credentials_id.clone(), RepositoryProtocol::Ssh)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Serialisable trait configuration.
///
/// ```json
/// [
///   { "type": "branch_discovery", "strategy_id": 1 },
///   { "type": "ssh_checkout", "credentials_id": "deploy-key" }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraitSpec {
    BranchDiscovery {
        strategy_id: u8,
    },
    SshCheckout {
        #[serde(default)]
        credentials_id: Option<String>,
    },
}

impl TraitSpec {
    pub fn build(&self) -> Result<Arc<dyn DiscoveryTrait>, DiscoveryError> {
        let built: Arc<dyn DiscoveryTrait> = match self {
            Self::BranchDiscovery { strategy_id } => {
                Arc::new(BranchDiscoveryTrait::from_strategy_id(*strategy_id)?)
            }
            Self::SshCheckout { credentials_id } => {
                Arc::new(SshCheckoutTrait::new(credentials_id.as_deref()))
            }
        };
        Ok(built)
    }
}

/// Builds every configured trait, failing on the first invalid one.
pub fn build_traits(specs: &[TraitSpec]) -> Result<Vec<Arc<dyn DiscoveryTrait>>, DiscoveryError> {
    specs.iter().map(TraitSpec::build).collect()
}
