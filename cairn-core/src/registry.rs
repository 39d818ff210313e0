//! Fixed-capacity node registry
//!
//! A node is a named logical subsystem (sensor, radio, display) exposing
//! readable and optionally writable properties through a request handler.
//! The registry maps node names to handlers for the dispatcher; entry 0 is
//! always the built-in SYS introspection node.

use heapless::Vec;
use log::{error, info};

use cairn_protocol::{Request, Response};

/// Maximum number of registered nodes, SYS included
pub const MAX_NODE_COUNT: usize = 8;

/// Name of the built-in introspection node
pub(crate) const SYS_NODE_NAME: &str = "SYS";

/// SYS contributes no bits to the device capability bitmask
const SYS_CAPS: u32 = 0;

/// Errors reported at registration time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Node name is empty or contains the field separator
    InvalidNode,
    /// A node with the same name is already registered
    DuplicateNode,
    /// Registry reached [`MAX_NODE_COUNT`]
    RegistryFull,
}

/// Opaque failure returned by a node handler.
///
/// The dispatcher answers the client with `e/UNK_ERROR`; the handler is
/// expected to have logged the specifics itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandlerError {
    /// Handler could not process the request
    Failed,
}

/// Request handler implemented by each node.
///
/// Handlers are invoked synchronously from the poll cycle and must not
/// block; the returned response may borrow from the handler's own state.
pub trait RequestHandler {
    /// Process one request and compose the reply
    fn handle<'s>(&'s mut self, request: &Request<'_>) -> Result<Response<'s>, HandlerError>;
}

/// A node to be registered with the command server.
///
/// The handler storage is owned by the defining module and must outlive the
/// registry; the registry keeps only this reference.
pub struct Node<'n> {
    /// Stable identity, unique among registered nodes
    pub name: &'n str,
    /// Capability bits this node contributes to the `AVAIL` bitmask
    pub caps: u32,
    /// Property request handler
    pub handler: &'n mut dyn RequestHandler,
}

/// Name and capability snapshot of a registered node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeInfo<'n> {
    /// Node name
    pub name: &'n str,
    /// Capability bits
    pub caps: u32,
}

/// How a registry entry is invoked
pub(crate) enum Handler<'n> {
    /// Built-in SYS node, answered by the server itself
    Sys,
    /// External node handler
    Node(&'n mut dyn RequestHandler),
}

struct NodeEntry<'n> {
    name: &'n str,
    caps: u32,
    handler: Handler<'n>,
}

/// Ordered, fixed-capacity node table
pub struct Registry<'n> {
    nodes: Vec<NodeEntry<'n>, MAX_NODE_COUNT>,
}

impl Default for Registry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'n> Registry<'n> {
    /// Create a registry with the SYS node installed at index 0
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        // Capacity is never zero, the built-in entry always fits
        let _ = nodes.push(NodeEntry {
            name: SYS_NODE_NAME,
            caps: SYS_CAPS,
            handler: Handler::Sys,
        });
        Self { nodes }
    }

    /// Register an external node.
    ///
    /// A failed registration leaves the registry unchanged.
    pub fn register(&mut self, node: Node<'n>) -> Result<(), RegistryError> {
        if node.name.is_empty() || node.name.contains('/') {
            error!("failed to register node: invalid name");
            return Err(RegistryError::InvalidNode);
        }
        if self.find(node.name).is_some() {
            error!("failed to register node '{}': name already taken", node.name);
            return Err(RegistryError::DuplicateNode);
        }

        let entry = NodeEntry {
            name: node.name,
            caps: node.caps,
            handler: Handler::Node(node.handler),
        };
        if self.nodes.push(entry).is_err() {
            error!("reached maximum node count");
            return Err(RegistryError::RegistryFull);
        }

        info!("registered node '{}'", node.name);
        Ok(())
    }

    /// Find a node by name, first exact match in registration order
    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|entry| entry.name == name)
    }

    /// Number of registered nodes, SYS included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; the SYS node is installed at construction
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of every node's name and capability bits, in registration
    /// order (SYS at index 0)
    pub fn infos(&self) -> Vec<NodeInfo<'n>, MAX_NODE_COUNT> {
        let mut infos = Vec::new();
        for entry in &self.nodes {
            // Same capacity as the registry, the push cannot fail
            let _ = infos.push(NodeInfo {
                name: entry.name,
                caps: entry.caps,
            });
        }
        infos
    }

    pub(crate) fn handler_mut(&mut self, index: usize) -> Option<&mut Handler<'n>> {
        self.nodes.get_mut(index).map(|entry| &mut entry.handler)
    }
}
