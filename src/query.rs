use crate::backend::{Action, BackendRequest};
use crate::protocol::Protocol;

/// Query assembled from one form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    AclCheck(AclCheckRequest),
    Reachability(ReachabilityRequest),
}

/// Checks addresses and ports against a named policy file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclCheckRequest {
    pub policy_file: String,
    pub protocols: Vec<Protocol>,
    pub destination_addresses: String,
    pub destination_ports: String,
    pub source_addresses: String,
    pub source_ports: String,
}

/// Checks connectivity between two address/port sets in both directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityRequest {
    pub protocols: Vec<Protocol>,
    pub addresses1: String,
    pub ports1: String,
    pub addresses2: String,
    pub ports2: String,
}

impl QueryRequest {
    pub fn action(&self) -> Action {
        match self {
            Self::AclCheck(_) => Action::CheckAcl,
            Self::Reachability(_) => Action::CheckUtnet,
        }
    }

    pub fn to_backend_request(&self) -> BackendRequest {
        match self {
            Self::AclCheck(r) => BackendRequest::new(Action::CheckAcl)
                .param("policy_file", &r.policy_file)
                .param("protocols", join_protocols(&r.protocols))
                .param("destination_addresses", &r.destination_addresses)
                .param("destination_ports", &r.destination_ports)
                .param("source_addresses", &r.source_addresses)
                .param("source_ports", &r.source_ports),
            Self::Reachability(r) => BackendRequest::new(Action::CheckUtnet)
                .param("protocols", join_protocols(&r.protocols))
                .param("addresses1", &r.addresses1)
                .param("ports1", &r.ports1)
                .param("addresses2", &r.addresses2)
                .param("ports2", &r.ports2),
        }
    }
}

/// Space-separated wire names; an empty selection yields an empty string
pub fn join_protocols(protocols: &[Protocol]) -> String {
    protocols
        .iter()
        .map(|p| p.wire_name())
        .collect::<Vec<_>>()
        .join(" ")
}
