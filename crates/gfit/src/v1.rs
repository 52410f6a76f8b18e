//! Fit v1 operation table and typed client surface.
//!
//! [`DESCRIPTORS`] carries the wire data for every operation (URL template,
//! method, parameter rules). [`Fitness`] wraps the table in a validated
//! [`Registry`] plus a [`Transport`] and exposes both a dynamic
//! [`Fitness::call`] entry point and nested accessors mirroring the API's
//! `users.dataSources.datasets` / `users.sessions` namespaces.

use crate::descriptor::{EndpointDescriptor, Registry};
use crate::error::{FitError, Result};
use crate::resolver::{self, Params};
use crate::transport::{AuthConfig, ReqwestTransport, Transport};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Default API root.
pub const BASE_URL: &str = "https://www.googleapis.com/fitness/v1";

/// Descriptor table for the Fit v1 API, one entry per operation.
pub static DESCRIPTORS: &[EndpointDescriptor] = &[
    EndpointDescriptor {
        id: "fitness.users.dataSources.create",
        path: "/users/{userId}/dataSources",
        method: Method::POST,
        required_params: &["userId"],
        path_params: &["userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.delete",
        path: "/users/{userId}/dataSources/{dataSourceId}",
        method: Method::DELETE,
        required_params: &["userId", "dataSourceId"],
        path_params: &["dataSourceId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.get",
        path: "/users/{userId}/dataSources/{dataSourceId}",
        method: Method::GET,
        required_params: &["userId", "dataSourceId"],
        path_params: &["dataSourceId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.list",
        path: "/users/{userId}/dataSources",
        method: Method::GET,
        required_params: &["userId"],
        path_params: &["userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.patch",
        path: "/users/{userId}/dataSources/{dataSourceId}",
        method: Method::PATCH,
        required_params: &["userId", "dataSourceId"],
        path_params: &["dataSourceId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.update",
        path: "/users/{userId}/dataSources/{dataSourceId}",
        method: Method::PUT,
        required_params: &["userId", "dataSourceId"],
        path_params: &["dataSourceId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.datasets.delete",
        path: "/users/{userId}/dataSources/{dataSourceId}/datasets/{datasetId}",
        method: Method::DELETE,
        required_params: &["userId", "dataSourceId", "datasetId"],
        path_params: &["dataSourceId", "datasetId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.datasets.get",
        path: "/users/{userId}/dataSources/{dataSourceId}/datasets/{datasetId}",
        method: Method::GET,
        required_params: &["userId", "dataSourceId", "datasetId"],
        path_params: &["dataSourceId", "datasetId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.dataSources.datasets.patch",
        path: "/users/{userId}/dataSources/{dataSourceId}/datasets/{datasetId}",
        method: Method::PATCH,
        required_params: &["userId", "dataSourceId", "datasetId"],
        path_params: &["dataSourceId", "datasetId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.sessions.delete",
        path: "/users/{userId}/sessions/{sessionId}",
        method: Method::DELETE,
        required_params: &["userId", "sessionId"],
        path_params: &["sessionId", "userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.sessions.list",
        path: "/users/{userId}/sessions",
        method: Method::GET,
        required_params: &["userId"],
        path_params: &["userId"],
    },
    EndpointDescriptor {
        id: "fitness.users.sessions.update",
        path: "/users/{userId}/sessions/{sessionId}",
        method: Method::PUT,
        required_params: &["userId", "sessionId"],
        path_params: &["sessionId", "userId"],
    },
];

struct Inner<T> {
    registry: Registry,
    transport: T,
    base_url: String,
}

/// Fit v1 API client.
///
/// Cheap to clone and safe to share: the registry and transport are built
/// once and held behind an `Arc`.
pub struct Fitness<T: Transport = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Fitness<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Fitness<ReqwestTransport> {
    /// Build a client against the production API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table fails validation.
    pub fn new(auth: AuthConfig) -> Result<Self> {
        Self::with_transport(ReqwestTransport::new(auth))
    }
}

impl<T: Transport> Fitness<T> {
    /// Build a client with an explicit transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table fails validation.
    pub fn with_transport(transport: T) -> Result<Self> {
        Self::with_base_url(transport, BASE_URL)
    }

    /// Build a client against a non-default API root (tests, mirrors).
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table fails validation.
    pub fn with_base_url(transport: T, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Inner {
                registry: Registry::new(DESCRIPTORS)?,
                transport,
                base_url: base_url.into(),
            }),
        })
    }

    /// The validated operation registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Invoke an operation by id with a JSON-object parameter bag.
    ///
    /// This is the dynamic entry point the typed accessors delegate to.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation id is unknown, the bag is not a
    /// JSON object, required parameters are missing, or the transport fails.
    pub async fn call(&self, operation: &str, params: Value) -> Result<Value> {
        let Value::Object(params) = params else {
            return Err(FitError::Runtime(
                "parameters must be a JSON object".to_string(),
            ));
        };
        self.call_with(operation, &params).await
    }

    async fn call_with(&self, operation: &str, params: &Params) -> Result<Value> {
        let descriptor = self
            .inner
            .registry
            .get(operation)
            .ok_or_else(|| FitError::Runtime(format!("Unknown operation: {operation}")))?;

        let request = resolver::resolve(descriptor, &self.inner.base_url, params)?;
        debug!(operation, method = %request.method, "dispatching");
        self.inner.transport.execute(request).await
    }

    /// Accessor for the `users` namespace.
    #[must_use]
    pub fn users(&self) -> Users<'_, T> {
        Users { client: self }
    }
}

/// `fitness.users.*` namespace.
pub struct Users<'a, T: Transport> {
    client: &'a Fitness<T>,
}

impl<'a, T: Transport> Users<'a, T> {
    #[must_use]
    pub fn data_sources(&self) -> DataSources<'a, T> {
        DataSources {
            client: self.client,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> Sessions<'a, T> {
        Sessions {
            client: self.client,
        }
    }
}

/// `fitness.users.dataSources.*` operations.
pub struct DataSources<'a, T: Transport> {
    client: &'a Fitness<T>,
}

impl<'a, T: Transport> DataSources<'a, T> {
    /// Create a new data source unique across this user's data sources.
    pub async fn create(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.dataSources.create", params).await
    }

    /// Delete a data source (only valid when it has no data points).
    pub async fn delete(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.dataSources.delete", params).await
    }

    /// Return the data source with the given data stream id.
    pub async fn get(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.dataSources.get", params).await
    }

    /// List data sources visible under the granted OAuth scopes.
    pub async fn list(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.dataSources.list", params).await
    }

    /// Update a data source with patch semantics.
    pub async fn patch(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.dataSources.patch", params).await
    }

    /// Update a data source (full replacement).
    pub async fn update(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.dataSources.update", params).await
    }

    #[must_use]
    pub fn datasets(&self) -> Datasets<'a, T> {
        Datasets {
            client: self.client,
        }
    }
}

/// `fitness.users.dataSources.datasets.*` operations.
pub struct Datasets<'a, T: Transport> {
    client: &'a Fitness<T>,
}

impl<T: Transport> Datasets<'_, T> {
    /// Delete all data points overlapping the dataset's time range.
    pub async fn delete(&self, params: Value) -> Result<Value> {
        self.client
            .call("fitness.users.dataSources.datasets.delete", params)
            .await
    }

    /// Return data points overlapping the dataset's time range.
    pub async fn get(&self, params: Value) -> Result<Value> {
        self.client
            .call("fitness.users.dataSources.datasets.get", params)
            .await
    }

    /// Add data points to a dataset (no patch semantics).
    pub async fn patch(&self, params: Value) -> Result<Value> {
        self.client
            .call("fitness.users.dataSources.datasets.patch", params)
            .await
    }
}

/// `fitness.users.sessions.*` operations.
pub struct Sessions<'a, T: Transport> {
    client: &'a Fitness<T>,
}

impl<T: Transport> Sessions<'_, T> {
    /// Delete a session by id.
    pub async fn delete(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.sessions.delete", params).await
    }

    /// List previously created sessions.
    pub async fn list(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.sessions.list", params).await
    }

    /// Update or insert a session.
    pub async fn update(&self, params: Value) -> Result<Value> {
        self.client.call("fitness.users.sessions.update", params).await
    }
}
