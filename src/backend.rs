pub mod http;

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Operations offered by the backend endpoint, selected with the `action` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Policies,
    CheckAcl,
    CheckUtnet,
    ReverseDns,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Self::Policies => "policies",
            Self::CheckAcl => "check_acl",
            Self::CheckUtnet => "check_utnet",
            Self::ReverseDns => "reverse_dns",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    pub action: Action,
    params: Vec<(&'static str, String)>,
}

impl BackendRequest {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Query string pairs, `action` first
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once(("action", self.action.name()))
            .chain(self.params.iter().map(|(k, v)| (*k, v.as_str())))
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend answered with HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("Unexpected '{action}' response from backend: {value}")]
    UnexpectedResponse { action: Action, value: Value },
}

/// HTTP-JSON capability used for every backend call.
///
/// Calls are issued from a single thread, so returned futures need not be `Send`.
pub trait QueryBackend {
    fn call<'a>(
        &'a self,
        request: &'a BackendRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, BackendError>> + 'a>>;
}

/// Fetches the ordered list of policy file identifiers
pub async fn fetch_policies(backend: &dyn QueryBackend) -> Result<Vec<String>, BackendError> {
    let request = BackendRequest::new(Action::Policies);
    let value = backend.call(&request).await?;
    serde_json::from_value(value.clone()).map_err(|_| BackendError::UnexpectedResponse {
        action: Action::Policies,
        value,
    })
}

/// Looks up the hostname of `address`; an empty string means the backend could not resolve it
pub async fn reverse_dns(backend: &dyn QueryBackend, address: &str) -> Result<String, BackendError> {
    let request = BackendRequest::new(Action::ReverseDns).param("address", address);
    match backend.call(&request).await? {
        Value::String(hostname) => Ok(hostname),
        value => Err(BackendError::UnexpectedResponse {
            action: Action::ReverseDns,
            value,
        }),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use tokio::sync::oneshot;

    /// In-memory backend recording every request.
    ///
    /// `check_acl`/`check_utnet`/`policies` answer with the configured value. Reverse DNS
    /// answers from `hostnames`; unknown addresses get an error unless `hold_reverse_dns`
    /// is set, in which case the answer is withheld until released through the returned sender.
    #[derive(Default)]
    pub struct FakeBackend {
        pub requests: RefCell<Vec<BackendRequest>>,
        pub responses: RefCell<HashMap<&'static str, Value>>,
        pub hostnames: RefCell<HashMap<String, String>>,
        pub hold_reverse_dns: bool,
        pub held: RefCell<Vec<(String, oneshot::Sender<String>)>>,
    }

    impl FakeBackend {
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        pub fn holding_reverse_dns() -> Rc<Self> {
            Rc::new(Self {
                hold_reverse_dns: true,
                ..Default::default()
            })
        }

        pub fn respond(&self, action: Action, value: Value) {
            self.responses.borrow_mut().insert(action.name(), value);
        }

        pub fn hostname(&self, address: &str, hostname: &str) {
            self.hostnames
                .borrow_mut()
                .insert(address.to_string(), hostname.to_string());
        }

        pub fn requests_for(&self, action: Action) -> Vec<BackendRequest> {
            self.requests
                .borrow()
                .iter()
                .filter(|r| r.action == action)
                .cloned()
                .collect()
        }

        /// Releases a withheld reverse DNS answer for `address`
        pub fn release(&self, address: &str, hostname: &str) {
            let mut held = self.held.borrow_mut();
            let position = held
                .iter()
                .position(|(a, _)| a == address)
                .expect("No lookup held for address");
            let (_, sender) = held.remove(position);
            let _ = sender.send(hostname.to_string());
        }
    }

    impl QueryBackend for FakeBackend {
        fn call<'a>(
            &'a self,
            request: &'a BackendRequest,
        ) -> Pin<Box<dyn Future<Output = Result<Value, BackendError>> + 'a>> {
            self.requests.borrow_mut().push(request.clone());

            Box::pin(async move {
                if request.action != Action::ReverseDns {
                    return self
                        .responses
                        .borrow()
                        .get(request.action.name())
                        .cloned()
                        .ok_or(BackendError::Status(reqwest::StatusCode::NOT_FOUND));
                }

                let address = request.get("address").unwrap_or_default().to_string();
                if self.hold_reverse_dns {
                    let (sender, receiver) = oneshot::channel();
                    self.held.borrow_mut().push((address, sender));
                    return match receiver.await {
                        Ok(hostname) => Ok(Value::String(hostname)),
                        Err(_) => Err(BackendError::Status(reqwest::StatusCode::GATEWAY_TIMEOUT)),
                    };
                }

                let hostname = self.hostnames.borrow().get(&address).cloned();
                hostname
                    .map(Value::String)
                    .ok_or(BackendError::Status(reqwest::StatusCode::BAD_GATEWAY))
            })
        }
    }

    #[test]
    fn query_pairs_start_with_action() {
        let request = BackendRequest::new(Action::CheckUtnet)
            .param("protocols", "tcp udp")
            .param("addresses1", "10.0.0.1");
        let pairs: Vec<_> = request.query_pairs().collect();
        assert_eq!(
            pairs,
            [
                ("action", "check_utnet"),
                ("protocols", "tcp udp"),
                ("addresses1", "10.0.0.1"),
            ]
        );
        assert_eq!(request.get("addresses1"), Some("10.0.0.1"));
        assert_eq!(request.get("ports1"), None);
    }

    #[tokio::test]
    async fn policies_are_decoded_in_order() {
        let backend = FakeBackend::new();
        backend.respond(Action::Policies, json!(["b-inbound", "a-outbound"]));
        let policies = fetch_policies(&*backend).await.unwrap();
        assert_eq!(policies, ["b-inbound", "a-outbound"]);
    }

    #[tokio::test]
    async fn policies_must_be_a_list_of_strings() {
        let backend = FakeBackend::new();
        backend.respond(Action::Policies, json!("Traceback"));
        assert_matches!(
            fetch_policies(&*backend).await,
            Err(BackendError::UnexpectedResponse { action: Action::Policies, .. })
        );
    }

    #[tokio::test]
    async fn reverse_dns_sends_address() {
        let backend = FakeBackend::new();
        backend.hostname("10.0.0.1", "gw.example");
        assert_eq!(reverse_dns(&*backend, "10.0.0.1").await.unwrap(), "gw.example");
        assert_eq!(
            backend.requests_for(Action::ReverseDns)[0].get("address"),
            Some("10.0.0.1")
        );
        assert_matches!(
            reverse_dns(&*backend, "10.0.0.2").await,
            Err(BackendError::Status(_))
        );
    }
}
