// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Builder patterns for constructing mock address spaces and proxy
//! configurations with sensible defaults.
//!
//! ## Design Principles
//!
//! - Chainable methods for a fluent address space DSL
//! - Nodes first, references after; references to missing nodes are kept
//!   half-sided, the way a server with dangling references behaves
//! - Configuration defaults tuned for fast tests

use std::time::Duration;

use ua_proxy::client::UaValue;
use ua_proxy::ids::{reference_types, types};
use ua_proxy::{NodeClass, NodeId, ProxyConfig, ProxyConfigBuilder, QualifiedName};

use crate::common::mocks::{MockAddressSpace, MockNode, MockTransport};

// =============================================================================
// Address Space Builder
// =============================================================================

/// Fluent construction of a [`MockAddressSpace`].
///
/// # Example
///
/// ```rust,ignore
/// let space = AddressSpaceBuilder::with_standard_types()
///     .object(pump.clone(), "1:Pump", types::BASE_OBJECT_TYPE)
///     .variable(speed.clone(), "1:Speed", types::BASE_DATA_VARIABLE_TYPE, 1450.0)
///     .component(&pump, &speed)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct AddressSpaceBuilder {
    space: MockAddressSpace,
}

impl AddressSpaceBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder preloaded with the standard namespace 0 types.
    pub fn with_standard_types() -> Self {
        Self::new().standard_types()
    }

    /// Add the standard type hierarchy the resolver needs.
    ///
    /// ```text
    /// BaseObjectType (58)
    /// ├── FolderType (61)
    /// ├── StateMachineType (2299)
    /// │   └── FiniteStateMachineType (2771)
    /// │       └── ProgramStateMachineType (2391)
    /// ├── StateType (2307)
    /// │   └── InitialStateType (2309)
    /// └── TransitionType (2310)
    /// BaseVariableType (62)
    /// ├── BaseDataVariableType (63)
    /// │   └── StateVariableType (2755)
    /// │       └── FiniteStateVariableType (2760)
    /// └── PropertyType (68)
    /// ```
    pub fn standard_types(self) -> Self {
        self.object_type(types::BASE_OBJECT_TYPE, "BaseObjectType", None)
            .object_type(types::FOLDER_TYPE, "FolderType", Some(types::BASE_OBJECT_TYPE))
            .object_type(
                types::STATE_MACHINE_TYPE,
                "StateMachineType",
                Some(types::BASE_OBJECT_TYPE),
            )
            .object_type(
                types::FINITE_STATE_MACHINE_TYPE,
                "FiniteStateMachineType",
                Some(types::STATE_MACHINE_TYPE),
            )
            .object_type(
                types::PROGRAM_STATE_MACHINE_TYPE,
                "ProgramStateMachineType",
                Some(types::FINITE_STATE_MACHINE_TYPE),
            )
            .object_type(types::STATE_TYPE, "StateType", Some(types::BASE_OBJECT_TYPE))
            .object_type(
                types::INITIAL_STATE_TYPE,
                "InitialStateType",
                Some(types::STATE_TYPE),
            )
            .object_type(
                types::TRANSITION_TYPE,
                "TransitionType",
                Some(types::BASE_OBJECT_TYPE),
            )
            .variable_type(types::BASE_VARIABLE_TYPE, "BaseVariableType", None)
            .variable_type(
                types::BASE_DATA_VARIABLE_TYPE,
                "BaseDataVariableType",
                Some(types::BASE_VARIABLE_TYPE),
            )
            .variable_type(
                types::STATE_VARIABLE_TYPE,
                "StateVariableType",
                Some(types::BASE_DATA_VARIABLE_TYPE),
            )
            .variable_type(
                types::FINITE_STATE_VARIABLE_TYPE,
                "FiniteStateVariableType",
                Some(types::STATE_VARIABLE_TYPE),
            )
            .variable_type(
                types::PROPERTY_TYPE,
                "PropertyType",
                Some(types::BASE_VARIABLE_TYPE),
            )
            .object(
                ua_proxy::ids::objects::OBJECTS_FOLDER,
                "Objects",
                types::FOLDER_TYPE,
            )
    }

    /// Add an ObjectType, linked to its supertype by HasSubtype.
    pub fn object_type(
        self,
        node_id: NodeId,
        name: impl Into<QualifiedName>,
        supertype: Option<NodeId>,
    ) -> Self {
        self.type_node(node_id, NodeClass::ObjectType, name, supertype)
    }

    /// Add a VariableType, linked to its supertype by HasSubtype.
    pub fn variable_type(
        self,
        node_id: NodeId,
        name: impl Into<QualifiedName>,
        supertype: Option<NodeId>,
    ) -> Self {
        self.type_node(node_id, NodeClass::VariableType, name, supertype)
    }

    fn type_node(
        mut self,
        node_id: NodeId,
        node_class: NodeClass,
        name: impl Into<QualifiedName>,
        supertype: Option<NodeId>,
    ) -> Self {
        self.space
            .add_node(MockNode::new(node_id.clone(), node_class, name));
        if let Some(supertype) = supertype {
            self.space
                .add_reference(&supertype, reference_types::HAS_SUBTYPE, &node_id);
        }
        self
    }

    /// Add an Object with a type definition.
    pub fn object(
        mut self,
        node_id: NodeId,
        name: impl Into<QualifiedName>,
        type_definition: NodeId,
    ) -> Self {
        self.space
            .add_node(MockNode::new(node_id.clone(), NodeClass::Object, name));
        self.space
            .add_reference(&node_id, reference_types::HAS_TYPE_DEFINITION, &type_definition);
        self
    }

    /// Add an Object without a HasTypeDefinition reference.
    pub fn untyped_object(mut self, node_id: NodeId, name: impl Into<QualifiedName>) -> Self {
        self.space
            .add_node(MockNode::new(node_id, NodeClass::Object, name));
        self
    }

    /// Add a Variable with a type definition and a good value.
    pub fn variable(
        mut self,
        node_id: NodeId,
        name: impl Into<QualifiedName>,
        type_definition: NodeId,
        value: impl Into<UaValue>,
    ) -> Self {
        self.space
            .add_node(MockNode::new(node_id.clone(), NodeClass::Variable, name));
        self.space
            .add_reference(&node_id, reference_types::HAS_TYPE_DEFINITION, &type_definition);
        self.space.set_value(&node_id, value);
        self
    }

    /// Add a Property: a Variable of PropertyType attached by HasProperty.
    pub fn property(
        self,
        parent: &NodeId,
        node_id: NodeId,
        name: impl Into<QualifiedName>,
        value: impl Into<UaValue>,
    ) -> Self {
        self.variable(node_id.clone(), name, types::PROPERTY_TYPE, value)
            .reference(parent, reference_types::HAS_PROPERTY, &node_id)
    }

    /// Add a Method with its Executable attributes.
    pub fn method(mut self, node_id: NodeId, name: impl Into<QualifiedName>, executable: bool) -> Self {
        self.space
            .add_node(MockNode::new(node_id.clone(), NodeClass::Method, name));
        self.space.set_executable(&node_id, executable);
        self
    }

    /// Link `parent` HasComponent `child`.
    pub fn component(self, parent: &NodeId, child: &NodeId) -> Self {
        self.reference(parent, reference_types::HAS_COMPONENT, child)
    }

    /// Link `parent` Organizes `child`.
    pub fn organizes(self, parent: &NodeId, child: &NodeId) -> Self {
        self.reference(parent, reference_types::ORGANIZES, child)
    }

    /// Add an arbitrary reference.
    pub fn reference(mut self, source: &NodeId, reference_type: NodeId, target: &NodeId) -> Self {
        self.space.add_reference(source, reference_type, target);
        self
    }

    /// Deny access to a node.
    pub fn deny(mut self, node_id: &NodeId) -> Self {
        self.space.deny(node_id);
        self
    }

    /// Finish the address space.
    pub fn build(self) -> MockAddressSpace {
        self.space
    }

    /// Finish and wrap the address space in a transport.
    pub fn into_transport(self) -> MockTransport {
        MockTransport::new(self.space)
    }
}

// =============================================================================
// Config Builder
// =============================================================================

/// Proxy configurations for tests.
pub struct TestConfig;

impl TestConfig {
    /// A builder with defaults suitable for tests: a short request timeout
    /// and operation tracing on.
    pub fn builder() -> ProxyConfigBuilder {
        ProxyConfig::builder()
            .request_timeout(Duration::from_secs(2))
            .trace_operations(true)
    }

    /// The test defaults.
    pub fn default_config() -> ProxyConfig {
        Self::builder().build().expect("test config is valid")
    }

    /// Test defaults with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> ProxyConfig {
        Self::builder()
            .request_timeout(timeout)
            .build()
            .expect("test config is valid")
    }

    /// Test defaults with a custom depth bound.
    pub fn with_max_depth(max_depth: usize) -> ProxyConfig {
        Self::builder()
            .max_depth(max_depth)
            .build()
            .expect("test config is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_types_are_linked() {
        let space = AddressSpaceBuilder::with_standard_types().build();
        let program = space.node(&types::PROGRAM_STATE_MACHINE_TYPE).unwrap();
        assert_eq!(program.node_class, NodeClass::ObjectType);
        assert!(program.references.iter().any(|r| !r.is_forward
            && r.reference_type_id == reference_types::HAS_SUBTYPE
            && r.target == types::FINITE_STATE_MACHINE_TYPE));
    }

    #[test]
    fn test_property_is_typed_and_linked() {
        let parent = NodeId::numeric(1, 1);
        let space = AddressSpaceBuilder::with_standard_types()
            .untyped_object(parent.clone(), "1:Parent")
            .property(&parent, NodeId::numeric(1, 2), "1:Serial", "SN-1")
            .build();

        let property = space.node(&NodeId::numeric(1, 2)).unwrap();
        assert_eq!(property.type_definition(), Some(&types::PROPERTY_TYPE));
        assert_eq!(
            space.value(&NodeId::numeric(1, 2)),
            Some(UaValue::String("SN-1".into()))
        );
    }
}
