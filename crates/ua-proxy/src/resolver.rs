// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Type definition resolution and state machine introspection.
//!
//! The resolver follows HasTypeDefinition and inverse HasSubtype links to
//! describe the types of remote instances, and assembles
//! [`StateMachineType`]s from the State and Transition instance declarations
//! of a type and its supertypes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        TypeResolver                             │
//! │   resolve_type_definition / resolve_supertype_chain /           │
//! │   find_type_by_name / resolve_state_machine_type                │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//! ┌───────────────────────────────┐  ┌──────────────────────────────┐
//! │         GraphBrowser          │  │          TypeCache           │
//! │  (single-level browse/read)   │  │  (by NodeId and by name)     │
//! └───────────────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! Cached entries are never invalidated implicitly; the owning manager
//! clears the cache when it stops.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browse::{ChildReference, GraphBrowser};
use crate::client::{CancellationToken, ProxySession};
use crate::error::{ProxyError, ProxyResult, TypeError};
use crate::ids::{browse_names, reference_types, types};
use crate::types::{AttributeId, BrowseDirection, NodeClass, NodeId, QualifiedName};

// =============================================================================
// TypeDefinition
// =============================================================================

/// An ObjectType or VariableType node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// The type node.
    pub node_id: NodeId,

    /// Browse name of the type.
    pub browse_name: QualifiedName,

    /// ObjectType or VariableType.
    pub node_class: NodeClass,

    /// Direct supertype, found through an inverse HasSubtype reference.
    pub supertype: Option<NodeId>,
}

impl TypeDefinition {
    /// Returns the type name without namespace.
    pub fn name(&self) -> &str {
        &self.browse_name.name
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.browse_name, self.node_id)
    }
}

// =============================================================================
// StateMachineTypeRef
// =============================================================================

/// Identifies a state machine type by browse name or by NodeId.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateMachineTypeRef {
    /// Browse name; namespace 0 matches any namespace.
    Name(QualifiedName),

    /// Exact type node.
    Id(NodeId),
}

impl From<&str> for StateMachineTypeRef {
    /// Parses NodeId text (`ns=1;i=5`) as an id and anything else as a name.
    fn from(s: &str) -> Self {
        match NodeId::from_str(s) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(QualifiedName::from(s)),
        }
    }
}

impl From<NodeId> for StateMachineTypeRef {
    fn from(id: NodeId) -> Self {
        Self::Id(id)
    }
}

impl From<QualifiedName> for StateMachineTypeRef {
    fn from(name: QualifiedName) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for StateMachineTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Id(id) => write!(f, "{}", id),
        }
    }
}

// =============================================================================
// StateMachineType
// =============================================================================

/// A state declared by a state machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescription {
    /// Browse name of the state.
    pub name: String,

    /// The state node.
    pub node_id: NodeId,

    /// Value of the StateNumber property, if present.
    pub number: Option<u32>,

    /// `true` for an InitialStateType state.
    pub is_initial: bool,
}

/// A transition declared by a state machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescription {
    /// Browse name of the transition.
    pub name: String,

    /// The transition node.
    pub node_id: NodeId,

    /// Name of the FromState target.
    pub from: String,

    /// Name of the ToState target.
    pub to: String,

    /// Browse names of methods that cause the transition.
    pub causes: Vec<String>,

    /// Value of the TransitionNumber property, if present.
    pub number: Option<u32>,
}

impl TransitionDescription {
    /// Returns `true` if `method` causes this transition. Case-insensitive.
    pub fn is_caused_by(&self, method: &str) -> bool {
        self.causes.iter().any(|c| c.eq_ignore_ascii_case(method))
    }
}

/// States and transitions of a state machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMachineType {
    definition: TypeDefinition,
    states: Vec<StateDescription>,
    transitions: Vec<TransitionDescription>,
}

impl StateMachineType {
    /// Creates a state machine description and checks its consistency.
    pub fn new(
        definition: TypeDefinition,
        states: Vec<StateDescription>,
        transitions: Vec<TransitionDescription>,
    ) -> ProxyResult<Self> {
        let machine = Self {
            definition,
            states,
            transitions,
        };
        machine.validate()?;
        Ok(machine)
    }

    /// Returns the type definition.
    pub fn definition(&self) -> &TypeDefinition {
        &self.definition
    }

    /// Returns the type name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the type node.
    pub fn node_id(&self) -> &NodeId {
        &self.definition.node_id
    }

    /// Returns every state.
    pub fn states(&self) -> &[StateDescription] {
        &self.states
    }

    /// Returns every transition.
    pub fn transitions(&self) -> &[TransitionDescription] {
        &self.transitions
    }

    /// Returns the initial state, if one is declared.
    pub fn initial_state(&self) -> Option<&StateDescription> {
        self.states.iter().find(|s| s.is_initial)
    }

    /// Looks up a state by name.
    pub fn state(&self, name: &str) -> Option<&StateDescription> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Looks up a transition by name.
    pub fn transition(&self, name: &str) -> Option<&TransitionDescription> {
        self.transitions.iter().find(|t| t.name == name)
    }

    /// Returns the transitions leaving `state`.
    pub fn transitions_from(&self, state: &str) -> Vec<&TransitionDescription> {
        self.transitions.iter().filter(|t| t.from == state).collect()
    }

    /// Returns `true` if a single transition leads from `from` to `to`.
    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.transitions.iter().any(|t| t.from == from && t.to == to)
    }

    /// Returns the transitions caused by a method. Case-insensitive.
    pub fn transitions_caused_by(&self, method: &str) -> Vec<&TransitionDescription> {
        self.transitions
            .iter()
            .filter(|t| t.is_caused_by(method))
            .collect()
    }

    /// Checks that every transition endpoint is a declared state and that at
    /// most one initial state exists.
    pub fn validate(&self) -> ProxyResult<()> {
        let invalid = |reason: String| {
            Err(ProxyError::type_error(TypeError::invalid_state_machine(
                self.name(),
                reason,
            )))
        };

        let initial: Vec<&str> = self
            .states
            .iter()
            .filter(|s| s.is_initial)
            .map(|s| s.name.as_str())
            .collect();
        if initial.len() > 1 {
            return invalid(format!("multiple initial states: {}", initial.join(", ")));
        }

        let names: HashSet<&str> = self.states.iter().map(|s| s.name.as_str()).collect();
        if names.len() != self.states.len() {
            return invalid("duplicate state names".to_string());
        }

        for transition in &self.transitions {
            for (role, endpoint) in [("from", &transition.from), ("to", &transition.to)] {
                if !names.contains(endpoint.as_str()) {
                    return invalid(format!(
                        "transition '{}' {} state '{}' is not a declared state",
                        transition.name, role, endpoint
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for StateMachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.definition)?;
        match self.initial_state() {
            Some(state) => writeln!(f, "  initial: {}", state.name)?,
            None => writeln!(f, "  initial: -")?,
        }
        let states: Vec<&str> = self.states.iter().map(|s| s.name.as_str()).collect();
        writeln!(f, "  states: {}", states.join(", "))?;
        for t in &self.transitions {
            write!(f, "  {}: {} -> {}", t.name, t.from, t.to)?;
            if !t.causes.is_empty() {
                write!(f, " [{}]", t.causes.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// =============================================================================
// TypeCache
// =============================================================================

/// Resolution results by NodeId and by name.
#[derive(Debug, Default)]
pub struct TypeCache {
    definitions: DashMap<NodeId, TypeDefinition>,
    instance_types: DashMap<NodeId, Option<NodeId>>,
    names: DashMap<QualifiedName, NodeId>,
    state_machines: DashMap<NodeId, Arc<StateMachineType>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TypeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cached type definition.
    pub fn definition(&self, type_id: &NodeId) -> Option<TypeDefinition> {
        self.lookup(self.definitions.get(type_id).map(|e| e.value().clone()))
    }

    /// Returns a cached state machine.
    pub fn state_machine(&self, type_id: &NodeId) -> Option<Arc<StateMachineType>> {
        self.lookup(self.state_machines.get(type_id).map(|e| e.value().clone()))
    }

    fn instance_type(&self, node_id: &NodeId) -> Option<Option<NodeId>> {
        self.lookup(self.instance_types.get(node_id).map(|e| e.value().clone()))
    }

    fn name(&self, name: &QualifiedName) -> Option<NodeId> {
        self.lookup(self.names.get(name).map(|e| e.value().clone()))
    }

    fn lookup<T>(&self, entry: Option<T>) -> Option<T> {
        let counter = if entry.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        entry
    }

    /// Returns the number of cached type definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if no type definitions are cached.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns `(hits, misses)`.
    pub fn hit_stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.definitions.clear();
        self.instance_types.clear();
        self.names.clear();
        self.state_machines.clear();
    }
}

// =============================================================================
// TypeResolver
// =============================================================================

/// Resolves and caches type information of the remote address space.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    browser: GraphBrowser,
    session: Arc<ProxySession>,
    cache: Arc<TypeCache>,
}

enum Declaration {
    State { initial: bool },
    Transition,
}

impl TypeResolver {
    /// Creates a resolver with an empty cache.
    pub fn new(session: Arc<ProxySession>) -> Self {
        Self {
            browser: GraphBrowser::new(session.clone()),
            session,
            cache: Arc::new(TypeCache::new()),
        }
    }

    /// Returns the cache.
    pub fn cache(&self) -> &TypeCache {
        &self.cache
    }

    /// Returns the type of an instance node.
    ///
    /// With `required`, a missing HasTypeDefinition reference is `NotFound`;
    /// otherwise it resolves to `None`.
    pub async fn resolve_type_definition(
        &self,
        node_id: &NodeId,
        required: bool,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Option<TypeDefinition>> {
        let type_id = match self.cache.instance_type(node_id) {
            Some(type_id) => type_id,
            None => {
                let reference = self
                    .browser
                    .follow(
                        node_id,
                        BrowseDirection::Forward,
                        &reference_types::HAS_TYPE_DEFINITION,
                        cancel,
                    )
                    .await?;
                let type_id = reference.map(|r| r.node_id);
                self.cache
                    .instance_types
                    .insert(node_id.clone(), type_id.clone());
                type_id
            }
        };

        match type_id {
            Some(type_id) => Ok(Some(self.resolve_type(&type_id, cancel).await?)),
            None if required => Err(ProxyError::type_error(
                TypeError::missing_type_definition(node_id.to_string()),
            )),
            None => Ok(None),
        }
    }

    /// Describes a type node.
    pub async fn resolve_type(
        &self,
        type_id: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<TypeDefinition> {
        if let Some(definition) = self.cache.definition(type_id) {
            return Ok(definition);
        }

        let node_class = self.browser.read_node_class(type_id, cancel).await?;
        if !node_class.is_type() {
            return Err(ProxyError::type_error(TypeError::malformed(
                type_id.to_string(),
                format!("{} is not a type node", node_class),
            )));
        }
        let browse_name = self.browser.read_browse_name(type_id, cancel).await?;
        let supertype = self
            .browser
            .follow(
                type_id,
                BrowseDirection::Inverse,
                &reference_types::HAS_SUBTYPE,
                cancel,
            )
            .await?
            .map(|r| r.node_id);

        let definition = TypeDefinition {
            node_id: type_id.clone(),
            browse_name,
            node_class,
            supertype,
        };
        debug!(type_id = %type_id, browse_name = %definition.browse_name, "Resolved type");
        self.cache
            .definitions
            .insert(type_id.clone(), definition.clone());
        Ok(definition)
    }

    /// Returns the supertype chain of a type, root first, ending with the
    /// type itself.
    pub async fn resolve_supertype_chain(
        &self,
        type_id: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Vec<TypeDefinition>> {
        let max_hops = self.session.config().max_type_depth;
        let mut chain: Vec<TypeDefinition> = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(type_id.clone());

        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                return Err(ProxyError::type_error(TypeError::CyclicType {
                    type_id: id.to_string(),
                    chain: chain.iter().map(|t| t.browse_name.to_string()).collect(),
                }));
            }
            if chain.len() > max_hops {
                return Err(ProxyError::type_error(TypeError::malformed(
                    type_id.to_string(),
                    format!("supertype chain exceeds {} hops", max_hops),
                )));
            }
            let definition = self.resolve_type(&id, cancel).await?;
            current = definition.supertype.clone();
            chain.push(definition);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Returns `true` if `type_id` is `base` or one of its subtypes.
    pub async fn is_subtype_of(
        &self,
        type_id: &NodeId,
        base: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<bool> {
        let chain = self.resolve_supertype_chain(type_id, cancel).await?;
        Ok(chain.iter().any(|t| &t.node_id == base))
    }

    /// Finds a type by browse name below the configured search root.
    ///
    /// Breadth-first over forward HasSubtype references. A name in
    /// namespace 0 matches the same name in any namespace.
    pub async fn find_type_by_name(
        &self,
        name: &QualifiedName,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<NodeId> {
        if let Some(type_id) = self.cache.name(name) {
            return Ok(type_id);
        }

        let root = self.session.config().type_search_root.clone();
        let root_definition = self.resolve_type(&root, cancel).await?;
        if name.matches(&root_definition.browse_name) {
            self.cache.names.insert(name.clone(), root.clone());
            return Ok(root);
        }

        let mut queue = VecDeque::from([root.clone()]);
        let mut visited = HashSet::from([root]);

        while let Some(parent) = queue.pop_front() {
            let subtypes = self
                .browser
                .browse_references(
                    &parent,
                    BrowseDirection::Forward,
                    Some(&reference_types::HAS_SUBTYPE),
                    false,
                    cancel,
                )
                .await?;

            for subtype in subtypes {
                if !visited.insert(subtype.node_id.clone()) {
                    continue;
                }
                // The browse already carries everything a definition needs.
                if subtype.node_class.is_type() {
                    self.cache
                        .definitions
                        .entry(subtype.node_id.clone())
                        .or_insert_with(|| TypeDefinition {
                            node_id: subtype.node_id.clone(),
                            browse_name: subtype.browse_name.clone(),
                            node_class: subtype.node_class,
                            supertype: Some(parent.clone()),
                        });
                }
                if name.matches(&subtype.browse_name) {
                    debug!(name = %name, type_id = %subtype.node_id, "Found type by name");
                    self.cache
                        .names
                        .insert(name.clone(), subtype.node_id.clone());
                    return Ok(subtype.node_id);
                }
                queue.push_back(subtype.node_id);
            }
        }

        Err(ProxyError::type_error(TypeError::not_found(name.to_string())))
    }

    /// Assembles a state machine type from its instance declarations.
    pub async fn resolve_state_machine_type(
        &self,
        type_ref: impl Into<StateMachineTypeRef>,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Arc<StateMachineType>> {
        let type_id = match type_ref.into() {
            StateMachineTypeRef::Id(id) => id,
            StateMachineTypeRef::Name(name) => self.find_type_by_name(&name, cancel).await?,
        };

        if let Some(machine) = self.cache.state_machine(&type_id) {
            return Ok(machine);
        }

        let chain = self.resolve_supertype_chain(&type_id, cancel).await?;
        let definition = chain
            .last()
            .cloned()
            .ok_or_else(|| ProxyError::type_error(TypeError::not_found(type_id.to_string())))?;

        let mut inherited: Vec<ChildReference> = Vec::new();
        for ancestor in &chain {
            let children = self.browser.browse_children(&ancestor.node_id, cancel).await?;
            inherited.extend(
                children
                    .into_iter()
                    .filter(|c| c.node_class == NodeClass::Object),
            );
        }

        let classified = try_join_all(
            inherited
                .iter()
                .map(|child| self.classify_declaration(child, cancel)),
        )
        .await?;

        // Every state declaration along the chain, overridden or not. An
        // endpoint naming an overridden state resolves to its replacement.
        let state_ids: HashMap<NodeId, String> = inherited
            .iter()
            .zip(&classified)
            .filter(|(_, kind)| matches!(kind, Some(Declaration::State { .. })))
            .map(|(child, _)| (child.node_id.clone(), child.browse_name.name.clone()))
            .collect();

        // Root first, so a subtype redeclaring a name replaces the inherited node.
        let mut declared: Vec<(&ChildReference, &Declaration)> = Vec::new();
        for (child, kind) in inherited.iter().zip(&classified) {
            let Some(kind) = kind else { continue };
            let name = &child.browse_name.name;
            match declared
                .iter_mut()
                .find(|(d, _)| &d.browse_name.name == name)
            {
                Some(existing) => *existing = (child, kind),
                None => declared.push((child, kind)),
            }
        }

        let mut states = Vec::new();
        let mut transitions = Vec::new();
        for (child, kind) in declared {
            match kind {
                Declaration::State { initial } => {
                    let number = self
                        .read_number_property(&child.node_id, browse_names::STATE_NUMBER, cancel)
                        .await?;
                    states.push(StateDescription {
                        name: child.browse_name.name.clone(),
                        node_id: child.node_id.clone(),
                        number,
                        is_initial: *initial,
                    });
                }
                Declaration::Transition => {
                    transitions.push(
                        self.describe_transition(&definition, child, &state_ids, cancel)
                            .await?,
                    );
                }
            }
        }

        let machine = Arc::new(StateMachineType::new(definition, states, transitions)?);
        debug!(
            type_id = %type_id,
            states = machine.states().len(),
            transitions = machine.transitions().len(),
            "Resolved state machine type"
        );
        self.cache
            .state_machines
            .insert(type_id.clone(), machine.clone());
        Ok(machine)
    }

    async fn classify_declaration(
        &self,
        child: &ChildReference,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Option<Declaration>> {
        let type_id = match &child.type_definition {
            Some(type_id) => type_id.clone(),
            None => match self
                .resolve_type_definition(&child.node_id, false, cancel)
                .await?
            {
                Some(definition) => definition.node_id,
                None => return Ok(None),
            },
        };

        let chain = self.resolve_supertype_chain(&type_id, cancel).await?;
        let has = |base: &NodeId| chain.iter().any(|t| &t.node_id == base);

        Ok(if has(&types::INITIAL_STATE_TYPE) {
            Some(Declaration::State { initial: true })
        } else if has(&types::STATE_TYPE) {
            Some(Declaration::State { initial: false })
        } else if has(&types::TRANSITION_TYPE) {
            Some(Declaration::Transition)
        } else {
            None
        })
    }

    async fn describe_transition(
        &self,
        definition: &TypeDefinition,
        child: &ChildReference,
        state_ids: &HashMap<NodeId, String>,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<TransitionDescription> {
        let name = child.browse_name.name.clone();
        let from = self
            .transition_endpoint(definition, child, &reference_types::FROM_STATE, state_ids, cancel)
            .await?;
        let to = self
            .transition_endpoint(definition, child, &reference_types::TO_STATE, state_ids, cancel)
            .await?;

        let causes = self
            .browser
            .browse_references(
                &child.node_id,
                BrowseDirection::Forward,
                Some(&reference_types::HAS_CAUSE),
                false,
                cancel,
            )
            .await?
            .into_iter()
            .map(|r| r.browse_name.name)
            .collect();

        let number = self
            .read_number_property(&child.node_id, browse_names::TRANSITION_NUMBER, cancel)
            .await?;

        Ok(TransitionDescription {
            name,
            node_id: child.node_id.clone(),
            from,
            to,
            causes,
            number,
        })
    }

    /// Returns the state name a FromState or ToState reference points at.
    ///
    /// The target must be one of the state declarations by NodeId; a node
    /// that merely shares a state's browse name is rejected.
    async fn transition_endpoint(
        &self,
        definition: &TypeDefinition,
        transition: &ChildReference,
        reference_type: &NodeId,
        state_ids: &HashMap<NodeId, String>,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<String> {
        let role = if *reference_type == reference_types::FROM_STATE {
            "FromState"
        } else {
            "ToState"
        };
        let invalid = |reason: String| {
            ProxyError::type_error(TypeError::invalid_state_machine(definition.name(), reason))
        };

        let target = self
            .browser
            .follow(&transition.node_id, BrowseDirection::Forward, reference_type, cancel)
            .await?
            .ok_or_else(|| {
                invalid(format!(
                    "transition '{}' has no {} reference",
                    transition.browse_name.name, role
                ))
            })?;

        state_ids.get(&target.node_id).cloned().ok_or_else(|| {
            invalid(format!(
                "transition '{}' {} '{}' ({}) is not a declared state",
                transition.browse_name.name, role, target.browse_name.name, target.node_id
            ))
        })
    }

    /// Reads an optional numeric property such as StateNumber.
    async fn read_number_property(
        &self,
        node_id: &NodeId,
        property: &str,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Option<u32>> {
        let children = self.browser.browse_children(node_id, cancel).await?;
        let Some(property) = children
            .iter()
            .find(|c| c.node_class == NodeClass::Variable && c.browse_name.name == property)
        else {
            return Ok(None);
        };

        let value = self
            .session
            .read(&property.node_id, AttributeId::Value, cancel)
            .await?;
        if value.status.is_bad() {
            return Err(ProxyError::from_status(
                "read",
                property.node_id.to_string(),
                value.status,
            ));
        }
        Ok(value
            .good_value()
            .and_then(|v| v.as_i64())
            .and_then(|n| u32::try_from(n).ok()))
    }

    /// Resolves the base types every state machine needs.
    pub(crate) async fn warm(&self, cancel: Option<&CancellationToken>) -> ProxyResult<()> {
        for type_id in [
            &types::STATE_TYPE,
            &types::INITIAL_STATE_TYPE,
            &types::TRANSITION_TYPE,
        ] {
            self.resolve_supertype_chain(type_id, cancel).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn definition() -> TypeDefinition {
        TypeDefinition {
            node_id: NodeId::numeric(1, 1000),
            browse_name: QualifiedName::new(1, "PumpStateMachineType"),
            node_class: NodeClass::ObjectType,
            supertype: Some(types::FINITE_STATE_MACHINE_TYPE),
        }
    }

    fn state(name: &str, id: u32, is_initial: bool) -> StateDescription {
        StateDescription {
            name: name.into(),
            node_id: NodeId::numeric(1, id),
            number: Some(id),
            is_initial,
        }
    }

    fn transition(name: &str, from: &str, to: &str, causes: &[&str]) -> TransitionDescription {
        TransitionDescription {
            name: name.into(),
            node_id: NodeId::string(1, name),
            from: from.into(),
            to: to.into(),
            causes: causes.iter().map(|c| c.to_string()).collect(),
            number: None,
        }
    }

    fn pump() -> StateMachineType {
        StateMachineType::new(
            definition(),
            vec![state("Off", 1, true), state("On", 2, false)],
            vec![
                transition("OffToOn", "Off", "On", &["Start"]),
                transition("OnToOff", "On", "Off", &["Stop", "Trip"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_queries() {
        let machine = pump();
        assert_eq!(machine.initial_state().map(|s| s.name.as_str()), Some("Off"));
        assert_eq!(machine.state("On").and_then(|s| s.number), Some(2));
        assert!(machine.state("Standby").is_none());
        assert_eq!(machine.transitions_from("Off").len(), 1);
        assert!(machine.can_transition("Off", "On"));
        assert!(!machine.can_transition("Off", "Off"));
        let caused: Vec<_> = machine
            .transitions_caused_by("trip")
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(caused, vec!["OnToOff"]);
    }

    #[test]
    fn test_validate_rejects_unknown_endpoint() {
        let err = StateMachineType::new(
            definition(),
            vec![state("Off", 1, true)],
            vec![transition("OffToOn", "Off", "On", &[])],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateMachine);
        assert!(err.to_string().contains("OffToOn"));
    }

    #[test]
    fn test_validate_rejects_multiple_initial_states() {
        let err = StateMachineType::new(
            definition(),
            vec![state("Off", 1, true), state("On", 2, true)],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateMachine);
    }

    #[test]
    fn test_display_summary() {
        let text = pump().to_string();
        assert!(text.contains("initial: Off"));
        assert!(text.contains("OnToOff: On -> Off [Stop, Trip]"));
    }

    #[test]
    fn test_type_ref_parsing() {
        assert_eq!(
            StateMachineTypeRef::from("i=2391"),
            StateMachineTypeRef::Id(types::PROGRAM_STATE_MACHINE_TYPE)
        );
        assert_eq!(
            StateMachineTypeRef::from("ProgramStateMachineType"),
            StateMachineTypeRef::Name(QualifiedName::new(0, "ProgramStateMachineType"))
        );
    }

    #[test]
    fn test_cache_clear() {
        let cache = TypeCache::new();
        cache.definitions.insert(definition().node_id, definition());
        assert_eq!(cache.len(), 1);
        assert!(cache.definition(&NodeId::numeric(1, 1000)).is_some());
        assert!(cache.definition(&NodeId::numeric(1, 1)).is_none());
        assert_eq!(cache.hit_stats(), (1, 1));
        cache.clear();
        assert!(cache.is_empty());
    }
}
