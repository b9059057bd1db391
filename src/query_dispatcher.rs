use crate::backend::{self, BackendError, QueryBackend};
use crate::protocol::Protocol;
use crate::query::{AclCheckRequest, QueryRequest, ReachabilityRequest};
use crate::query_response::QueryResponse;
use crate::result_renderer::{RenderPass, ResultRenderer};
use std::rc::Rc;
use thiserror::Error;

pub const ACL_PROTOCOL_SCOPE: &str = "protocols_acl";
pub const UTNET_PROTOCOL_SCOPE: &str = "protocols_utnet";

/// Protocol checkboxes belonging to one form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolCheckboxes {
    scope: &'static str,
    boxes: Vec<(Protocol, bool)>,
}

impl ProtocolCheckboxes {
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            boxes: Protocol::ALL.iter().map(|&p| (p, false)).collect(),
        }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn set_checked(&mut self, protocol: Protocol, checked: bool) {
        for (p, c) in &mut self.boxes {
            if *p == protocol {
                *c = checked;
            }
        }
    }

    /// Checked protocols in checkbox order
    pub fn checked(&self) -> Vec<Protocol> {
        self.boxes
            .iter()
            .filter(|(_, checked)| *checked)
            .map(|(p, _)| *p)
            .collect()
    }
}

impl std::fmt::Display for ProtocolCheckboxes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:", self.scope)?;
        for protocol in self.checked() {
            write!(f, " {}", protocol)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("Unknown policy file '{name}' (available: {})", .available.join(", "))]
pub struct UnknownPolicyError {
    pub name: String,
    pub available: Vec<String>,
}

/// Selection control listing the policy files offered by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySelect {
    options: Vec<String>,
    selected: Option<usize>,
}

impl PolicySelect {
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn append_options(&mut self, policies: impl IntoIterator<Item = String>) {
        self.options.extend(policies);
    }

    pub fn select(&mut self, name: &str) -> Result<(), UnknownPolicyError> {
        match self.options.iter().position(|o| o == name) {
            Some(index) => {
                self.selected = Some(index);
                Ok(())
            }
            None => Err(UnknownPolicyError {
                name: name.to_string(),
                available: self.options.clone(),
            }),
        }
    }

    /// Selected option, defaulting to the first one
    pub fn value(&self) -> Option<&str> {
        self.options
            .get(self.selected.unwrap_or(0))
            .map(String::as_str)
    }
}

/// Form whose submission produces a query
pub trait QueryForm {
    fn protocols(&self) -> &ProtocolCheckboxes;
    fn to_request(&self) -> QueryRequest;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclCheckForm {
    pub policy_file: PolicySelect,
    pub protocols: ProtocolCheckboxes,
    pub destination_addresses: String,
    pub destination_ports: String,
    pub source_addresses: String,
    pub source_ports: String,
}

impl AclCheckForm {
    pub fn new() -> Self {
        Self {
            policy_file: PolicySelect::default(),
            protocols: ProtocolCheckboxes::new(ACL_PROTOCOL_SCOPE),
            destination_addresses: String::new(),
            destination_ports: String::new(),
            source_addresses: String::new(),
            source_ports: String::new(),
        }
    }
}

impl QueryForm for AclCheckForm {
    fn protocols(&self) -> &ProtocolCheckboxes {
        &self.protocols
    }

    fn to_request(&self) -> QueryRequest {
        QueryRequest::AclCheck(AclCheckRequest {
            policy_file: self.policy_file.value().unwrap_or_default().to_string(),
            protocols: self.protocols.checked(),
            destination_addresses: self.destination_addresses.clone(),
            destination_ports: self.destination_ports.clone(),
            source_addresses: self.source_addresses.clone(),
            source_ports: self.source_ports.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityForm {
    pub protocols: ProtocolCheckboxes,
    pub addresses1: String,
    pub ports1: String,
    pub addresses2: String,
    pub ports2: String,
}

impl ReachabilityForm {
    pub fn new() -> Self {
        Self {
            protocols: ProtocolCheckboxes::new(UTNET_PROTOCOL_SCOPE),
            addresses1: String::new(),
            ports1: String::new(),
            addresses2: String::new(),
            ports2: String::new(),
        }
    }
}

impl QueryForm for ReachabilityForm {
    fn protocols(&self) -> &ProtocolCheckboxes {
        &self.protocols
    }

    fn to_request(&self) -> QueryRequest {
        QueryRequest::Reachability(ReachabilityRequest {
            protocols: self.protocols.checked(),
            addresses1: self.addresses1.clone(),
            ports1: self.ports1.clone(),
            addresses2: self.addresses2.clone(),
            ports2: self.ports2.clone(),
        })
    }
}

/// Turns submissions of one form into backend queries and hands the answers to the renderer
pub struct QueryDispatcher<F> {
    form: F,
    backend: Rc<dyn QueryBackend>,
    renderer: Rc<ResultRenderer>,
}

impl<F: QueryForm> QueryDispatcher<F> {
    pub fn new(form: F, backend: Rc<dyn QueryBackend>, renderer: Rc<ResultRenderer>) -> Self {
        Self {
            form,
            backend,
            renderer,
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    /// Sends the current form content as a single request and renders the answer.
    ///
    /// A transport failure is rendered as an error block as well, then returned.
    /// Must be awaited from within a `tokio::task::LocalSet`.
    pub async fn submit(&self) -> Result<RenderPass, BackendError> {
        let query = self.form.to_request();
        log::debug!(
            "Submitting '{}' query ({})",
            query.action(),
            self.form.protocols()
        );
        let request = query.to_backend_request();

        match self.backend.call(&request).await {
            Ok(value) => Ok(self.renderer.render(&QueryResponse::from_json(value))),
            Err(e) => {
                log::error!("'{}' query failed: {:#}", request.action, e);
                self.renderer.render(&QueryResponse::Error(e.to_string()));
                Err(e)
            }
        }
    }
}

impl QueryDispatcher<AclCheckForm> {
    /// Fills the policy selection with the identifiers offered by the backend
    pub async fn bootstrap(&mut self) -> Result<(), BackendError> {
        let policies = backend::fetch_policies(&*self.backend).await?;
        self.form.policy_file.append_options(policies);
        log::debug!(
            "Backend offers {} policy files",
            self.form.policy_file.options().len()
        );
        Ok(())
    }
}
