//! Built-in SYS introspection node
//!
//! SYS lets a remote client discover the device without prior knowledge:
//! enumerate the registered nodes, read the combined capability bitmask, and
//! fetch the configuration text page by page. It sits at registry index 0
//! and is addressed like any other node; clients number the remaining nodes
//! from 0 with SYS excluded.

use log::error;

use cairn_protocol::{ErrorCode, Request, Response};

use crate::config::ConfigPages;
use crate::registry::NodeInfo;

/// Read-only view of the server state the SYS handler answers from
pub(crate) struct SysView<'v> {
    /// All registered nodes in registration order, SYS at index 0
    pub nodes: &'v [NodeInfo<'v>],
    /// Installed config blob, if any
    pub config: Option<&'v ConfigPages<'v>>,
}

/// Dispatch one request addressed to SYS
pub(crate) fn handle<'v>(request: &Request<'_>, view: &SysView<'v>) -> Response<'v> {
    // CONF is the only read/write property
    if request.property == "CONF" {
        return conf(request, view);
    }

    if request.is_write() {
        error!("SYS properties other than CONF are read-only");
        return Response::Error(ErrorCode::Access);
    }

    match request.property {
        "AVAIL" => {
            let caps = view.nodes.iter().fold(0u32, |bits, node| bits | node.caps);
            Response::Hex(caps)
        }
        "NODE" => Response::Integer((view.nodes.len() - 1) as i32),
        property => node_by_index(property, view),
    }
}

fn conf<'v>(request: &Request<'_>, view: &SysView<'v>) -> Response<'v> {
    let Some(value) = request.value else {
        // Read: page count, 0 until a config is installed
        let pages = view.config.map_or(0, |config| config.page_count());
        return Response::Integer(pages as i32);
    };

    let Some(config) = view.config else {
        return Response::Error(ErrorCode::NoConf);
    };

    match value.parse::<usize>() {
        Ok(index) => match config.page(index) {
            Some(page) => Response::Text(page),
            None => Response::Error(ErrorCode::InvIndex),
        },
        Err(_) => Response::Error(ErrorCode::InvIndex),
    }
}

/// `NODE<k>`: name of the k-th non-SYS node
fn node_by_index<'v>(property: &str, view: &SysView<'v>) -> Response<'v> {
    if let Some(digits) = property.strip_prefix("NODE") {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return match digits.parse::<usize>() {
                Ok(index) if index + 1 < view.nodes.len() => {
                    Response::Name(view.nodes[index + 1].name)
                }
                _ => {
                    error!("out of bound NODE{} request", digits);
                    Response::Error(ErrorCode::InvIndex)
                }
            };
        }
    }

    error!("SYS property '{}' does not exist", property);
    Response::Error(ErrorCode::UnkProp)
}
