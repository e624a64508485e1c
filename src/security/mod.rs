//! # Security Module
//!
//! Client-side credential handling for the security schemes declared in an
//! API document.
//!
//! ## Overview
//!
//! - [`parse_schemes`] turns `components.securitySchemes` into [`SchemeInfo`]s
//!   (API keys in header/query/cookie, HTTP bearer and basic, OAuth2, OpenID Connect).
//! - [`CredentialStore`] holds one credential per scheme name for the session.
//! - [`injection_for`] matches an operation's security requirements against the
//!   store and produces the headers, query pairs and cookies to send.
//! - [`is_auth_endpoint`] and [`capture_credentials`] implement the login flow:
//!   a successful response from an authentication endpoint is scanned for a token,
//!   which then becomes the credential of the matching scheme.
//!
//! A single bearer token is simply a store with one entry.

mod credentials;
mod schemes;

pub use credentials::{
    capture_credentials, injection_for, is_auth_endpoint, AuthInjection, CapturedCredential,
    CredentialStore,
};
pub use schemes::{parse_schemes, ApiKeyLocation, SchemeInfo, SchemeKind};
