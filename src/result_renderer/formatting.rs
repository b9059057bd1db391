//! Classification rules applied to match records.
//!
//! The backend reports direction and verdict only as free text, so both are derived by
//! substring search exactly as documented on each function.

pub const ACCEPT_CLASS: &str = "accept";
pub const DENY_CLASS: &str = "deny";
pub const ERROR_CLASS: &str = "error";
pub const PORT_CLASS: &str = "port";
pub const HOSTNAME_CLASS: &str = "hostname";

const LEFTWARDS_ARROW: &str = "\u{2190}";
const RIGHTWARDS_ARROW: &str = "\u{2192}";

/// Protocol without ports; its addresses are shown bare
const PORTLESS_PROTOCOL: &str = "icmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Row reads [source] → [destination]
    Inbound,
    /// Row reads [destination] ← [source]
    Outbound,
}

impl Direction {
    /// Outbound iff the policy file name contains "outbound"
    pub fn of_policy_file(policy_file: &str) -> Self {
        if policy_file.contains("outbound") {
            Self::Outbound
        } else {
            Self::Inbound
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Inbound => RIGHTWARDS_ARROW,
            Self::Outbound => LEFTWARDS_ARROW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Deny,
}

impl Verdict {
    /// Accept iff the result text contains "accept"; everything else is a deny
    pub fn of_result(result: &str) -> Self {
        if result.contains("accept") {
            Self::Accept
        } else {
            Self::Deny
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Accept => ACCEPT_CLASS,
            Self::Deny => DENY_CLASS,
        }
    }
}

/// Address cell content: the (possibly bracketed) address plus an optional port suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEndpoint {
    pub address: String,
    /// Port including its leading colon, e.g. `:443`
    pub port: Option<String>,
}

/// Addresses containing a colon are bracketed; the port is omitted for ICMP
pub fn format_endpoint(protocol: &str, address: &str, port: &str) -> FormattedEndpoint {
    let address = if address.contains(':') {
        format!("[{}]", address)
    } else {
        address.to_string()
    };

    let port = if protocol == PORTLESS_PROTOCOL {
        None
    } else {
        Some(format!(":{}", port))
    };

    FormattedEndpoint { address, port }
}
