// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

#![warn(missing_docs)]

//! Client for OPC UA global discovery servers.
//!
//! A global discovery server (GDS) is a directory of the OPC UA applications
//! on a network that also brokers certificate issuance for them. This crate
//! implements the client side of the GDS request protocols:
//!
//! - Enumerating the servers on the network as a lazy, paginated stream
//!   with detection of server-side index resets, see
//!   [`GdsClient::query_servers`].
//! - The certificate request workflow: start a key pair or signing request,
//!   poll it, and collect the issued certificate, private key and issuer
//!   chain, see [`GdsClient::start_new_key_pair_request`],
//!   [`GdsClient::start_signing_request`] and [`GdsClient::finish_request`].
//! - Trust list retrieval over the OPC UA file transfer protocol, see
//!   [`GdsClient::read_trust_list`].
//! - Application registration and lookup, see
//!   [`GdsClient::register_application`] and friends.
//!
//! Administrative calls temporarily elevate the session to an administrator
//! identity obtained from a [`CredentialProvider`], and always restore the
//! previous identity afterwards.
//!
//! The crate does not establish sessions itself. Callers supply an
//! implementation of [`GdsSession`], a minimal abstraction over a connected
//! OPC UA session that can invoke methods; see the [`session`] module.

mod client;
mod config;
mod custom_types;
mod elevation;
mod error;
mod query;
mod transfer;

pub mod ids;
pub mod session;

pub use client::{CertificateBundle, GdsClient};
pub use config::{ConfigError, GdsClientConfig};
pub use custom_types::{ApplicationRecordDataType, GdsTypeLoader};
pub use elevation::{
    AdminCredentials, CredentialProvider, ElevationController, PreviousIdentity,
};
pub use error::GdsError;
pub use query::{ServerOnNetwork, ServerQuery};
pub use session::{GdsSession, IdentityToken};

pub use opcua_types::TrustListDataType;
pub use opcua_types as types;
