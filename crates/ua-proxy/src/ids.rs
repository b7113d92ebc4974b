// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Well-known namespace 0 node identifiers.
//!
//! The resolver and builder only need a small slice of the standard
//! namespace: the reference types that shape the hierarchy, the base types
//! that anchor type searches, and the state machine types.

use crate::types::NodeId;

/// Standard reference types.
pub mod reference_types {
    use crate::types::NodeId;

    /// References (abstract base type) - i=31.
    pub const REFERENCES: NodeId = NodeId::numeric(0, 31);
    /// NonHierarchicalReferences (abstract) - i=32.
    pub const NON_HIERARCHICAL_REFERENCES: NodeId = NodeId::numeric(0, 32);
    /// HierarchicalReferences (abstract) - i=33.
    pub const HIERARCHICAL_REFERENCES: NodeId = NodeId::numeric(0, 33);
    /// HasChild (abstract) - i=34.
    pub const HAS_CHILD: NodeId = NodeId::numeric(0, 34);
    /// Organizes - i=35.
    pub const ORGANIZES: NodeId = NodeId::numeric(0, 35);
    /// HasEventSource - i=36.
    pub const HAS_EVENT_SOURCE: NodeId = NodeId::numeric(0, 36);
    /// HasModellingRule - i=37.
    pub const HAS_MODELLING_RULE: NodeId = NodeId::numeric(0, 37);
    /// HasTypeDefinition - i=40.
    pub const HAS_TYPE_DEFINITION: NodeId = NodeId::numeric(0, 40);
    /// GeneratesEvent - i=41.
    pub const GENERATES_EVENT: NodeId = NodeId::numeric(0, 41);
    /// Aggregates (abstract) - i=44.
    pub const AGGREGATES: NodeId = NodeId::numeric(0, 44);
    /// HasSubtype - i=45.
    pub const HAS_SUBTYPE: NodeId = NodeId::numeric(0, 45);
    /// HasProperty - i=46.
    pub const HAS_PROPERTY: NodeId = NodeId::numeric(0, 46);
    /// HasComponent - i=47.
    pub const HAS_COMPONENT: NodeId = NodeId::numeric(0, 47);
    /// HasNotifier - i=48.
    pub const HAS_NOTIFIER: NodeId = NodeId::numeric(0, 48);
    /// HasOrderedComponent - i=49.
    pub const HAS_ORDERED_COMPONENT: NodeId = NodeId::numeric(0, 49);
    /// FromState - i=51.
    pub const FROM_STATE: NodeId = NodeId::numeric(0, 51);
    /// ToState - i=52.
    pub const TO_STATE: NodeId = NodeId::numeric(0, 52);
    /// HasCause - i=53.
    pub const HAS_CAUSE: NodeId = NodeId::numeric(0, 53);
    /// HasEffect - i=54.
    pub const HAS_EFFECT: NodeId = NodeId::numeric(0, 54);
}

/// Standard object and variable types.
pub mod types {
    use crate::types::NodeId;

    /// BaseObjectType - i=58.
    pub const BASE_OBJECT_TYPE: NodeId = NodeId::numeric(0, 58);
    /// FolderType - i=61.
    pub const FOLDER_TYPE: NodeId = NodeId::numeric(0, 61);
    /// BaseVariableType - i=62.
    pub const BASE_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 62);
    /// BaseDataVariableType - i=63.
    pub const BASE_DATA_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 63);
    /// PropertyType - i=68.
    pub const PROPERTY_TYPE: NodeId = NodeId::numeric(0, 68);
    /// StateMachineType - i=2299.
    pub const STATE_MACHINE_TYPE: NodeId = NodeId::numeric(0, 2299);
    /// StateType - i=2307.
    pub const STATE_TYPE: NodeId = NodeId::numeric(0, 2307);
    /// InitialStateType - i=2309.
    pub const INITIAL_STATE_TYPE: NodeId = NodeId::numeric(0, 2309);
    /// TransitionType - i=2310.
    pub const TRANSITION_TYPE: NodeId = NodeId::numeric(0, 2310);
    /// ProgramStateMachineType - i=2391.
    pub const PROGRAM_STATE_MACHINE_TYPE: NodeId = NodeId::numeric(0, 2391);
    /// StateVariableType - i=2755.
    pub const STATE_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 2755);
    /// FiniteStateVariableType - i=2760.
    pub const FINITE_STATE_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 2760);
    /// FiniteStateMachineType - i=2771.
    pub const FINITE_STATE_MACHINE_TYPE: NodeId = NodeId::numeric(0, 2771);
}

/// Standard folders.
pub mod objects {
    use crate::types::NodeId;

    /// Root folder - i=84.
    pub const ROOT_FOLDER: NodeId = NodeId::numeric(0, 84);
    /// Objects folder - i=85.
    pub const OBJECTS_FOLDER: NodeId = NodeId::numeric(0, 85);
    /// Types folder - i=86.
    pub const TYPES_FOLDER: NodeId = NodeId::numeric(0, 86);
    /// ObjectTypes folder - i=88.
    pub const OBJECT_TYPES_FOLDER: NodeId = NodeId::numeric(0, 88);
}

/// Browse names of standard properties.
pub mod browse_names {
    /// Number of a state within its machine.
    pub const STATE_NUMBER: &str = "StateNumber";
    /// Number of a transition within its machine.
    pub const TRANSITION_NUMBER: &str = "TransitionNumber";
    /// Argument description of a method.
    pub const INPUT_ARGUMENTS: &str = "InputArguments";
    /// Result description of a method.
    pub const OUTPUT_ARGUMENTS: &str = "OutputArguments";
}

/// Returns the direct supertype of a standard reference type.
///
/// Only the standard hierarchy is known here; servers resolve subtypes of
/// their own reference types themselves.
pub fn reference_supertype(reference_type: &NodeId) -> Option<NodeId> {
    use reference_types::*;

    if !reference_type.is_standard() {
        return None;
    }
    let parent = match reference_type.as_numeric()? {
        32 | 33 => REFERENCES,
        34 | 35 | 36 => HIERARCHICAL_REFERENCES,
        44 | 45 => HAS_CHILD,
        46 | 47 => AGGREGATES,
        48 => HAS_EVENT_SOURCE,
        49 => HAS_COMPONENT,
        37 | 40 | 41 | 51 | 52 | 53 | 54 => NON_HIERARCHICAL_REFERENCES,
        _ => return None,
    };
    Some(parent)
}

/// Returns `true` if `candidate` equals `base` or derives from it.
pub fn is_reference_subtype(candidate: &NodeId, base: &NodeId) -> bool {
    let mut current = Some(candidate.clone());
    while let Some(node) = current {
        if &node == base {
            return true;
        }
        current = reference_supertype(&node);
    }
    false
}

/// Returns `true` if the reference type produces children in the proxy tree.
///
/// HasSubtype is hierarchical but links types, not instances, so it is
/// excluded here.
pub fn is_child_reference(reference_type: &NodeId) -> bool {
    *reference_type != reference_types::HAS_SUBTYPE
        && is_reference_subtype(reference_type, &reference_types::HIERARCHICAL_REFERENCES)
}

#[cfg(test)]
mod tests {
    use super::reference_types::*;
    use super::*;

    #[test]
    fn test_reference_hierarchy() {
        assert!(is_reference_subtype(&HAS_PROPERTY, &HIERARCHICAL_REFERENCES));
        assert!(is_reference_subtype(&HAS_ORDERED_COMPONENT, &HAS_COMPONENT));
        assert!(is_reference_subtype(&ORGANIZES, &REFERENCES));
        assert!(is_reference_subtype(&HAS_CAUSE, &NON_HIERARCHICAL_REFERENCES));
        assert!(!is_reference_subtype(&HAS_TYPE_DEFINITION, &HIERARCHICAL_REFERENCES));
        assert!(!is_reference_subtype(&HIERARCHICAL_REFERENCES, &HAS_COMPONENT));
    }

    #[test]
    fn test_child_references() {
        assert!(is_child_reference(&HAS_COMPONENT));
        assert!(is_child_reference(&HAS_PROPERTY));
        assert!(is_child_reference(&ORGANIZES));
        assert!(!is_child_reference(&HAS_SUBTYPE));
        assert!(!is_child_reference(&HAS_TYPE_DEFINITION));
        assert!(!is_child_reference(&NodeId::numeric(2, 47)));
    }
}
