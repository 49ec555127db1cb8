#![doc = "hc-profile-core: login, appliance enumeration and asset transformation for hc-profile."]

//! This crate contains every piece of the profile pipeline; the `hc-profile`
//! binary only collects input and prints the outcome.
//!
//! # Usage
//! 1. [`auth::AuthSession::begin`] with a region and output target.
//! 2. Let the user open [`auth::AuthSession::authorization_url`]; feed the
//!    browser's navigations to an [`auth::NavigationHook`] and await the code
//!    on the paired [`auth::AuthCodeInterceptor`].
//! 3. [`pipeline::run`] with a [`client::HomeConnectClient`] (or any other
//!    [`contract::ApplianceApi`]).

pub mod archive;
pub mod auth;
pub mod client;
pub mod config;
pub mod contract;
pub mod emit;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod xml;

pub use error::ProfileError;
