//! Checkout decoration.
//!
//! Discovery traits may change how a discovered head is fetched without
//! touching what is discovered. The [`CheckoutBuilder`] starts from the
//! credential used to query the API over HTTP; traits can swap protocol and
//! credential before [`CheckoutBuilder::build`] resolves the clone URL.

use serde::Serialize;

use scm::{CredentialsId, Repository, RepositoryProtocol};

use crate::DiscoveryError;

/// Accumulates checkout settings for one repository.
#[derive(Debug, Clone)]
pub struct CheckoutBuilder {
    repository: Repository,
    protocol: RepositoryProtocol,
    credentials_id: Option<CredentialsId>,
}

impl CheckoutBuilder {
    /// Starts from an HTTP checkout with the API credential.
    pub fn new(repository: Repository, api_credentials: Option<CredentialsId>) -> Self {
        Self {
            repository,
            protocol: RepositoryProtocol::Http,
            credentials_id: api_credentials,
        }
    }

    /// Replaces the credential and protocol. `None` means the build agent's
    /// default identity.
    pub fn with_credentials(
        mut self,
        credentials_id: Option<CredentialsId>,
        protocol: RepositoryProtocol,
    ) -> Self {
        self.credentials_id = credentials_id;
        self.protocol = protocol;
        self
    }

    pub fn protocol(&self) -> RepositoryProtocol {
        self.protocol
    }

    pub fn credentials_id(&self) -> Option<&CredentialsId> {
        self.credentials_id.as_ref()
    }

    /// Resolves the clone URL advertised for the chosen protocol.
    pub fn build(self) -> Result<CheckoutSpec, DiscoveryError> {
        let remote = self
            .repository
            .clone_url(self.protocol)
            .ok_or_else(|| DiscoveryError::NoCloneLink {
                repository: self.repository.full_name(),
                protocol: self.protocol,
            })?
            .to_string();
        Ok(CheckoutSpec {
            remote,
            protocol: self.protocol,
            credentials_id: self.credentials_id,
        })
    }
}

/// How the build agent should fetch a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSpec {
    pub remote: String,
    pub protocol: RepositoryProtocol,
    pub credentials_id: Option<CredentialsId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scm::{CloneLink, OwnerName, RepositoryName};

    fn repository() -> Repository {
        Repository::new(
            OwnerName::new("PRJ").unwrap(),
            RepositoryName::new("widget").unwrap(),
            vec![
                CloneLink {
                    protocol: RepositoryProtocol::Http,
                    href: "https://bb.example.com/scm/prj/widget.git".into(),
                },
                CloneLink {
                    protocol: RepositoryProtocol::Ssh,
                    href: "ssh://git@bb.example.com:7999/prj/widget.git".into(),
                },
            ],
        )
    }

    #[test]
    fn defaults_to_http_with_api_credentials() {
        let spec = CheckoutBuilder::new(repository(), CredentialsId::new("api-token"))
            .build()
            .unwrap();
        assert_eq!(spec.remote, "https://bb.example.com/scm/prj/widget.git");
        assert_eq!(spec.credentials_id, CredentialsId::new("api-token"));
    }

    #[test]
    fn missing_clone_link_is_an_error() {
        let bare = Repository::from_full_name("PRJ/bare").unwrap();
        assert!(matches!(
            CheckoutBuilder::new(bare, None)
                .with_credentials(None, RepositoryProtocol::Ssh)
                .build(),
            Err(DiscoveryError::NoCloneLink { protocol: RepositoryProtocol::Ssh, .. })
        ));
    }
}
