//! Service descriptors stored by the registry.

use std::collections::{BTreeMap, BTreeSet};

use integration_primitives::{CapabilityId, ServiceId};
use serde::{Deserialize, Serialize};

use crate::registry::{RegistryError, RegistryResult};

/// Describes a discoverable service.
///
/// Deserialization runs the same validation as
/// [`ServiceDescriptorBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorFields")]
pub struct ServiceDescriptor {
    id: ServiceId,
    name: String,
    description: String,
    version: String,
    endpoint: String,
    capabilities: BTreeSet<CapabilityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    health_check_endpoint: Option<String>,
    metadata: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct DescriptorFields {
    id: ServiceId,
    name: String,
    #[serde(default)]
    description: String,
    version: String,
    endpoint: String,
    #[serde(default)]
    capabilities: BTreeSet<CapabilityId>,
    #[serde(default)]
    health_check_endpoint: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl TryFrom<DescriptorFields> for ServiceDescriptor {
    type Error = RegistryError;

    fn try_from(fields: DescriptorFields) -> RegistryResult<Self> {
        let mut builder = Self::builder(fields.id, fields.name)
            .description(fields.description)
            .version(fields.version)
            .endpoint(fields.endpoint)
            .capabilities(fields.capabilities);
        builder.health_check_endpoint = fields.health_check_endpoint;
        builder.metadata = fields.metadata;
        builder.build()
    }
}

impl ServiceDescriptor {
    /// Starts building a descriptor for the supplied id and display name.
    #[must_use]
    pub fn builder(id: ServiceId, name: impl Into<String>) -> ServiceDescriptorBuilder {
        ServiceDescriptorBuilder {
            id,
            name: name.into(),
            description: String::new(),
            version: "1.0.0".to_owned(),
            endpoint: None,
            capabilities: BTreeSet::new(),
            health_check_endpoint: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Returns the unique service identifier.
    #[must_use]
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the semantic version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the invocation endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &BTreeSet<CapabilityId> {
        &self.capabilities
    }

    /// Returns `true` when the service declares the capability.
    #[must_use]
    pub fn has_capability(&self, capability: &CapabilityId) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns the optional health-check endpoint.
    #[must_use]
    pub fn health_check_endpoint(&self) -> Option<&str> {
        self.health_check_endpoint.as_deref()
    }

    /// Returns free-form metadata.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// Builder for [`ServiceDescriptor`].
#[derive(Debug)]
pub struct ServiceDescriptorBuilder {
    id: ServiceId,
    name: String,
    description: String,
    version: String,
    endpoint: Option<String>,
    capabilities: BTreeSet<CapabilityId>,
    health_check_endpoint: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl ServiceDescriptorBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the version string; defaults to `1.0.0`.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the invocation endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Adds a declared capability.
    #[must_use]
    pub fn capability(mut self, capability: CapabilityId) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Adds several declared capabilities.
    #[must_use]
    pub fn capabilities<I>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = CapabilityId>,
    {
        self.capabilities.extend(capabilities);
        self
    }

    /// Sets the health-check endpoint.
    #[must_use]
    pub fn health_check_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.health_check_endpoint = Some(endpoint.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Finalises the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDescriptor`] when the name, version, or
    /// endpoint is missing or blank.
    pub fn build(self) -> RegistryResult<ServiceDescriptor> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::invalid_descriptor(
                &self.id,
                "service name cannot be empty",
            ));
        }
        if self.version.trim().is_empty() {
            return Err(RegistryError::invalid_descriptor(
                &self.id,
                "service version cannot be empty",
            ));
        }
        let endpoint = match self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint,
            _ => {
                return Err(RegistryError::invalid_descriptor(
                    &self.id,
                    "service endpoint must be provided",
                ));
            }
        };

        Ok(ServiceDescriptor {
            id: self.id,
            name: self.name,
            description: self.description,
            version: self.version,
            endpoint,
            capabilities: self.capabilities,
            health_check_endpoint: self.health_check_endpoint,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_descriptor() {
        let descriptor = ServiceDescriptor::builder(ServiceId::new("search").unwrap(), "Search")
            .description("Full-text search")
            .version("2.1.0")
            .endpoint("http://search.local/")
            .capability(CapabilityId::new("search").unwrap())
            .health_check_endpoint("health")
            .metadata("team", "discovery")
            .build()
            .expect("valid descriptor");

        assert_eq!(descriptor.version(), "2.1.0");
        assert!(descriptor.has_capability(&CapabilityId::new("search").unwrap()));
        assert_eq!(descriptor.health_check_endpoint(), Some("health"));
        assert_eq!(descriptor.metadata()["team"], "discovery");
    }

    #[test]
    fn endpoint_is_required() {
        let err = ServiceDescriptor::builder(ServiceId::new("search").unwrap(), "Search")
            .build()
            .expect_err("missing endpoint");
        assert!(matches!(err, RegistryError::InvalidDescriptor { .. }));

        let err = ServiceDescriptor::builder(ServiceId::new("search").unwrap(), " ")
            .endpoint("http://search.local/")
            .build()
            .expect_err("blank name");
        assert!(matches!(err, RegistryError::InvalidDescriptor { .. }));
    }

    #[test]
    fn deserialization_validates_like_the_builder() {
        let descriptor: ServiceDescriptor = serde_json::from_str(
            r#"{"id": "search", "name": "Search", "version": "2.0.0",
                "endpoint": "http://search.local/", "capabilities": ["search"],
                "health_check_endpoint": "/health"}"#,
        )
        .unwrap();
        assert_eq!(descriptor.version(), "2.0.0");
        assert_eq!(descriptor.health_check_endpoint(), Some("/health"));
        assert!(descriptor.description().is_empty());

        let blank_endpoint = serde_json::from_str::<ServiceDescriptor>(
            r#"{"id": "search", "name": "Search", "version": "2.0.0", "endpoint": " "}"#,
        )
        .unwrap_err();
        assert!(blank_endpoint.to_string().contains("endpoint must be provided"));

        let blank_version = serde_json::from_str::<ServiceDescriptor>(
            r#"{"id": "search", "name": "Search", "version": "", "endpoint": "tool://search"}"#,
        )
        .unwrap_err();
        assert!(blank_version.to_string().contains("version cannot be empty"));
    }

    #[test]
    fn serializes_capabilities_as_strings() {
        let descriptor = ServiceDescriptor::builder(ServiceId::new("index").unwrap(), "Index")
            .endpoint("tool://index")
            .capability(CapabilityId::new("index").unwrap())
            .build()
            .unwrap();

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["capabilities"], serde_json::json!(["index"]));
        assert_eq!(json["id"], "index");
    }
}
