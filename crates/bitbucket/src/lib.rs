//! Bitbucket REST adapter.
//!
//! Implements [`scm::BitbucketApi`] against Bitbucket Cloud (`/2.0`) and
//! Bitbucket Server (`/rest/api/1.0`). Only the listings the discovery
//! pipeline needs are covered: repositories of an owner, branches, tags and
//! open pull requests. Every listing follows pagination to the end.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Wire shapes
//! are converted into `scm` value types at the edge.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`client`] | [`BitbucketClient`], [`Credentials`] |
//! | [`cloud`] | Cloud page and entry shapes |
//! | [`server`] | Server page and entry shapes |

pub mod client;
pub mod cloud;
pub mod server;

pub use client::{BitbucketClient, Credentials, CLOUD_API_URL};
