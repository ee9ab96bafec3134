//! Uniform descriptor for managed cloud resources
//!
//! A [`ResourceDescriptor`] is the gateway's view of a single instance, key
//! pair or security group. Its `id` is write-once and its `status` only moves
//! through [`Observation`]s built from provider reads.

use crate::resource_kind::ResourceKind;
use crate::status::ResourceStatus;
use serde::Serialize;
use thiserror::Error;

/// Descriptor invariant violations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// Tried to replace an already assigned provider id
    #[error("{kind} id is already '{current}', refusing to reassign it to '{attempted}'")]
    IdAlreadyAssigned {
        kind: ResourceKind,
        current: String,
        attempted: String,
    },

    /// Provider returned an empty id
    #[error("provider returned an empty id for {0}")]
    EmptyId(ResourceKind),

    /// Observation belongs to an older mutation than the descriptor has seen
    #[error("stale observation (generation {observed}, descriptor is at {current})")]
    StaleObservation { observed: u64, current: u64 },
}

/// A provider-confirmed status read, tagged with the generation it was
/// taken for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub status: ResourceStatus,
    pub generation: u64,
}

impl Observation {
    pub fn new(status: ResourceStatus, generation: u64) -> Self {
        Self { status, generation }
    }
}

/// Uniform representation of a managed cloud resource
///
/// `generation` counts the mutations applied through this descriptor. A
/// descriptor built fresh for a request starts at 0, so a single execution
/// ends at 1. Callers that keep a descriptor across requests carry the count
/// forward with [`ResourceDescriptor::with_generation`]; reads taken for an
/// earlier mutation are then rejected by [`ResourceDescriptor::observe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    kind: ResourceKind,
    /// Provider-assigned identifier, empty until the creating call succeeds
    id: String,
    /// Caller-chosen name (key name, group name)
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    region: String,
    status: ResourceStatus,
    generation: u64,
}

impl ResourceDescriptor {
    /// Descriptor for a resource that does not exist yet
    pub fn new(kind: ResourceKind, region: impl Into<String>) -> Self {
        Self {
            kind,
            id: String::new(),
            name: None,
            region: region.into(),
            status: ResourceStatus::Unknown,
            generation: 0,
        }
    }

    /// Descriptor for an existing resource addressed by its provider id
    pub fn existing(kind: ResourceKind, region: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(kind, region)
        }
    }

    /// Set the caller-chosen name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Resume from a generation seen by an earlier execution
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the provider has assigned an id
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Id if assigned, otherwise the caller-chosen name
    pub fn handle(&self) -> Option<&str> {
        if self.has_id() {
            Some(&self.id)
        } else {
            self.name()
        }
    }

    /// Record the provider-assigned id.
    ///
    /// Assigning the same id twice is a no-op; assigning a different one fails.
    pub fn assign_id(&mut self, id: impl Into<String>) -> Result<(), DescriptorError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DescriptorError::EmptyId(self.kind));
        }
        if self.has_id() && self.id != id {
            return Err(DescriptorError::IdAlreadyAssigned {
                kind: self.kind,
                current: self.id.clone(),
                attempted: id,
            });
        }
        self.id = id;
        Ok(())
    }

    /// Bump the generation after a successful mutating call and return it
    pub fn record_mutation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Apply a provider-confirmed status read
    pub fn observe(&mut self, observation: Observation) -> Result<(), DescriptorError> {
        if observation.generation < self.generation {
            return Err(DescriptorError::StaleObservation {
                observed: observation.generation,
                current: self.generation,
            });
        }
        self.status = observation.status;
        Ok(())
    }

    /// Short description for logging, e.g. "EC2 instance i-123"
    pub fn description(&self) -> String {
        match self.handle() {
            Some(handle) => format!("{} {}", self.kind.label(), handle),
            None => format!("new {}", self.kind.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_write_once() {
        let mut desc = ResourceDescriptor::new(ResourceKind::Instance, "ap-south-1");
        assert!(!desc.has_id());

        desc.assign_id("i-123").unwrap();
        desc.assign_id("i-123").unwrap();
        let err = desc.assign_id("i-456").unwrap_err();
        assert!(matches!(err, DescriptorError::IdAlreadyAssigned { .. }));
        assert_eq!(desc.id(), "i-123");
    }

    #[test]
    fn empty_id_rejected() {
        let mut desc = ResourceDescriptor::new(ResourceKind::KeyPair, "us-east-1");
        assert_eq!(
            desc.assign_id(""),
            Err(DescriptorError::EmptyId(ResourceKind::KeyPair))
        );
    }

    #[test]
    fn stale_observation_is_rejected() {
        let mut desc = ResourceDescriptor::existing(ResourceKind::Instance, "us-east-1", "i-1");
        desc.record_mutation();
        desc.observe(Observation::new(ResourceStatus::Running, 1))
            .unwrap();
        assert_eq!(desc.status(), ResourceStatus::Running);

        desc.record_mutation();
        let err = desc
            .observe(Observation::new(ResourceStatus::Stopped, 1))
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::StaleObservation {
                observed: 1,
                current: 2
            }
        );
        assert_eq!(desc.status(), ResourceStatus::Running);
    }

    #[test]
    fn resumed_generation_rejects_older_reads() {
        let mut desc = ResourceDescriptor::existing(ResourceKind::Instance, "us-east-1", "i-1")
            .with_generation(4);
        assert_eq!(desc.record_mutation(), 5);
        assert!(desc
            .observe(Observation::new(ResourceStatus::Stopped, 4))
            .is_err());
        desc.observe(Observation::new(ResourceStatus::Stopped, 5))
            .unwrap();
        assert_eq!(desc.status(), ResourceStatus::Stopped);
    }

    #[test]
    fn handle_falls_back_to_name() {
        let desc = ResourceDescriptor::new(ResourceKind::KeyPair, "us-east-1").with_name("deploy");
        assert_eq!(desc.handle(), Some("deploy"));
        assert_eq!(desc.description(), "key pair deploy");

        let anon = ResourceDescriptor::new(ResourceKind::Instance, "us-east-1");
        assert_eq!(anon.handle(), None);
        assert_eq!(anon.description(), "new EC2 instance");
    }

    #[test]
    fn serializes_flat() {
        let mut desc = ResourceDescriptor::existing(ResourceKind::SecurityGroup, "eu-west-1", "sg-1")
            .with_name("web");
        desc.observe(Observation::new(ResourceStatus::Present, 0))
            .unwrap();
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["kind"], "security-group");
        assert_eq!(json["id"], "sg-1");
        assert_eq!(json["name"], "web");
        assert_eq!(json["status"], "present");
        assert_eq!(json["generation"], 0);
    }
}
