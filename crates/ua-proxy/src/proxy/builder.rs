// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Recursive construction of proxy trees.

use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::browse::{ChildReference, GraphBrowser};
use crate::client::{CancellationToken, ProxySession};
use crate::error::{BuildError, ProxyError, ProxyResult};
use crate::gate::read_executable;
use crate::proxy::object::{ChildKeys, Children, MethodProxy, NodeInfo, ObjectProxy, VariableProxy};
use crate::proxy::ProxyNode;
use crate::resolver::{TypeDefinition, TypeResolver};
use crate::types::{AttributeId, NodeClass, NodeId};

/// Position of a node in the build, from the root down.
#[derive(Clone)]
struct BuildPath {
    ancestors: Vec<NodeId>,
    names: Vec<String>,
}

impl BuildPath {
    fn root(node_id: &NodeId, name: &str) -> Self {
        Self {
            ancestors: vec![node_id.clone()],
            names: vec![name.to_string()],
        }
    }

    /// Depth of a child of the last node; the root is depth 0.
    fn child_depth(&self) -> usize {
        self.ancestors.len()
    }

    fn contains(&self, node_id: &NodeId) -> bool {
        self.ancestors.contains(node_id)
    }

    fn push(&self, node_id: &NodeId, name: &str) -> Self {
        let mut next = self.clone();
        next.ancestors.push(node_id.clone());
        next.names.push(name.to_string());
        next
    }
}

// =============================================================================
// ProxyBuilder
// =============================================================================

/// Builds proxy trees below an Object root.
#[derive(Debug, Clone)]
pub(crate) struct ProxyBuilder {
    session: Arc<ProxySession>,
    browser: GraphBrowser,
    resolver: TypeResolver,
}

impl ProxyBuilder {
    pub(crate) fn new(session: Arc<ProxySession>, resolver: TypeResolver) -> Self {
        Self {
            browser: GraphBrowser::new(session.clone()),
            session,
            resolver,
        }
    }

    /// Builds the tree below `root`, which must be an Object.
    ///
    /// Any child failure aborts the whole build.
    pub(crate) async fn build_object(
        &self,
        root: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<ObjectProxy> {
        let node_class = self.browser.read_node_class(root, cancel).await?;
        if node_class != NodeClass::Object {
            return Err(ProxyError::build(BuildError::not_an_object(
                root.to_string(),
                node_class.to_string(),
            )));
        }

        let browse_name = self.browser.read_browse_name(root, cancel).await?;
        let type_definition = self
            .resolver
            .resolve_type_definition(root, false, cancel)
            .await?;

        let path = BuildPath::root(root, &browse_name.name);
        let children = self.build_children(root, root, &path, cancel).await?;

        debug!(
            node_id = %root,
            browse_name = %browse_name,
            children = children.len(),
            "Built object proxy"
        );

        Ok(ObjectProxy::new(
            NodeInfo {
                node_id: root.clone(),
                browse_name,
                node_class,
                type_definition,
            },
            children,
        ))
    }

    /// Builds every child of `parent`.
    ///
    /// `object_id` is the nearest Object at or above `parent`; methods found
    /// here are invoked on it.
    async fn build_children(
        &self,
        parent: &NodeId,
        object_id: &NodeId,
        path: &BuildPath,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Children> {
        let references = self.browser.browse_children(parent, cancel).await?;
        let references: Vec<ChildReference> = references
            .into_iter()
            .filter(|r| r.node_class.is_instance())
            .collect();

        // Fail on colliding keys before any recursion.
        let mut keys = ChildKeys::default();
        for reference in &references {
            keys.claim(parent, &reference.browse_name, reference.node_class)?;
        }

        let nodes = if self.session.config().concurrent_build {
            try_join_all(
                references
                    .iter()
                    .map(|r| self.build_child(r, object_id, path, cancel)),
            )
            .await?
        } else {
            let mut nodes = Vec::with_capacity(references.len());
            for reference in &references {
                nodes.push(self.build_child(reference, object_id, path, cancel).await?);
            }
            nodes
        };

        let mut children = Children::new();
        for node in nodes {
            children.insert(parent, node)?;
        }
        Ok(children)
    }

    /// Builds one child, attributing a failure to it unless a descendant
    /// already claimed it.
    async fn build_child(
        &self,
        reference: &ChildReference,
        object_id: &NodeId,
        path: &BuildPath,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<ProxyNode> {
        self.build_node(reference, object_id, path, cancel)
            .await
            .map_err(|e| match e {
                ProxyError::Build(BuildError::ChildFailed { .. }) => e,
                e => ProxyError::build(BuildError::child_failed(
                    reference.node_id.to_string(),
                    reference.browse_name.to_string(),
                    e,
                )),
            })
    }

    fn build_node<'a>(
        &'a self,
        reference: &'a ChildReference,
        object_id: &'a NodeId,
        path: &'a BuildPath,
        cancel: Option<&'a CancellationToken>,
    ) -> BoxFuture<'a, ProxyResult<ProxyNode>> {
        async move {
            let node_id = &reference.node_id;
            let name = reference.browse_name.name.as_str();

            if path.contains(node_id) {
                let mut names = path.names.clone();
                names.push(name.to_string());
                return Err(ProxyError::build(BuildError::cyclic_graph(
                    node_id.to_string(),
                    names,
                )));
            }

            let depth = path.child_depth();
            let max_depth = self.session.config().max_depth;
            if depth > max_depth {
                return Err(ProxyError::build(BuildError::depth_exceeded(
                    node_id.to_string(),
                    depth,
                    max_depth,
                )));
            }

            trace!(node_id = %node_id, browse_name = name, depth, "Building child");

            match reference.node_class {
                NodeClass::Method => self.build_method(reference, object_id, cancel).await,
                NodeClass::Object => {
                    let info = self.node_info(reference, cancel).await?;
                    let children = self
                        .build_children(node_id, node_id, &path.push(node_id, name), cancel)
                        .await?;
                    Ok(ProxyNode::Object(ObjectProxy::new(info, children)))
                }
                _ => {
                    let info = self.node_info(reference, cancel).await?;
                    let children = self
                        .build_children(node_id, object_id, &path.push(node_id, name), cancel)
                        .await?;
                    let initial = if self.session.config().read_initial_values {
                        Some(self.session.read(node_id, AttributeId::Value, cancel).await?)
                    } else {
                        None
                    };
                    Ok(ProxyNode::Variable(VariableProxy::new(
                        info,
                        children,
                        self.session.clone(),
                        initial,
                    )))
                }
            }
        }
        .boxed()
    }

    async fn build_method(
        &self,
        reference: &ChildReference,
        object_id: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<ProxyNode> {
        let executable = if self.session.config().read_initial_executable_flags {
            Some(read_executable(&self.session, &reference.node_id, cancel).await?)
        } else {
            None
        };

        Ok(ProxyNode::Method(MethodProxy::new(
            NodeInfo {
                node_id: reference.node_id.clone(),
                browse_name: reference.browse_name.clone(),
                node_class: NodeClass::Method,
                type_definition: None,
            },
            object_id.clone(),
            self.session.clone(),
            executable,
        )))
    }

    async fn node_info(
        &self,
        reference: &ChildReference,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<NodeInfo> {
        let type_definition: Option<TypeDefinition> = match &reference.type_definition {
            Some(type_id) => Some(self.resolver.resolve_type(type_id, cancel).await?),
            None => {
                self.resolver
                    .resolve_type_definition(&reference.node_id, false, cancel)
                    .await?
            }
        };

        Ok(NodeInfo {
            node_id: reference.node_id.clone(),
            browse_name: reference.browse_name.clone(),
            node_class: reference.node_class,
            type_definition,
        })
    }
}
