//! One navigator run over the repositories of an owner.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use scm::{Repository, RepositoryName};

/// Knows which sources the enclosing navigator has already registered.
pub trait SourceObserver: Send + Sync {
    /// Repository names of the sources registered so far, in registration order.
    fn registered_sources(&self) -> Vec<RepositoryName>;
}

/// A fixed list of registered sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredSources(Vec<RepositoryName>);

impl RegisteredSources {
    pub fn new(names: impl IntoIterator<Item = RepositoryName>) -> Self {
        Self(names.into_iter().collect())
    }
}

impl SourceObserver for RegisteredSources {
    fn registered_sources(&self) -> Vec<RepositoryName> {
        self.0.clone()
    }
}

/// Repository state of one navigator run.
///
/// Each run builds its own request; it is never shared between runs.
pub struct NavigatorRequest {
    observer: Arc<dyn SourceObserver>,
    repositories: BTreeMap<RepositoryName, Repository>,
}

impl NavigatorRequest {
    pub fn new(observer: Arc<dyn SourceObserver>) -> Self {
        Self {
            observer,
            repositories: BTreeMap::new(),
        }
    }

    /// Replaces the known repositories with `repositories`, keyed by name.
    ///
    /// Later entries with the same name win.
    pub fn with_repositories(&mut self, repositories: impl IntoIterator<Item = Repository>) -> &mut Self {
        self.repositories = repositories
            .into_iter()
            .map(|repository| (repository.name().clone(), repository))
            .collect();
        self
    }

    /// Repositories to observe: those without a registered source first, then
    /// every known repository in name order, each at most once.
    pub fn repositories(&self) -> Vec<Repository> {
        let registered: HashSet<RepositoryName> =
            self.observer.registered_sources().into_iter().collect();

        let (new, existing): (Vec<_>, Vec<_>) = self
            .repositories
            .iter()
            .partition(|(name, _)| !registered.contains(*name));

        new.into_iter()
            .chain(existing)
            .map(|(_, repository)| repository.clone())
            .collect()
    }

    /// Looks up a known repository by exact name.
    pub fn repository(&self, name: &str) -> Option<&Repository> {
        RepositoryName::new(name).and_then(|key| self.repositories.get(&key))
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
