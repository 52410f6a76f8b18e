//! Client bindings for the Google Fit v1 REST API.
//!
//! Every API operation is a declarative [`descriptor::EndpointDescriptor`]
//! (URL template, HTTP method, parameter rules) registered in a
//! [`descriptor::Registry`]. Calls go through one shared path: the
//! [`resolver`] turns a descriptor plus a caller parameter bag into a
//! [`resolver::ResolvedRequest`], and a [`transport::Transport`] executes it.
//!
//! The resolver is pure and stateless; all I/O lives behind the transport
//! seam, so the typed surface in [`v1`] can be exercised against any
//! `Transport` implementation.

pub mod descriptor;
pub mod error;
pub mod resolver;
pub mod transport;
pub mod v1;

pub use error::{FitError, Result};
pub use resolver::{Params, ResolvedRequest};
pub use v1::Fitness;
