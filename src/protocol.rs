/// Protocols offered as checkboxes in both query forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    /// Checkbox order of both forms
    pub const ALL: [Protocol; 3] = [Protocol::Tcp, Protocol::Udp, Protocol::Icmp];

    pub fn parse(input: &str) -> Option<Protocol> {
        if input.eq_ignore_ascii_case("TCP") {
            Some(Protocol::Tcp)
        } else if input.eq_ignore_ascii_case("UDP") {
            Some(Protocol::Udp)
        } else if input.eq_ignore_ascii_case("ICMP") {
            Some(Protocol::Icmp)
        } else {
            None
        }
    }

    /// Name used in query parameters and in match records
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
            Self::Icmp => write!(f, "ICMP"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown protocol '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_case() {
        assert_eq!(Protocol::parse("tcp"), Some(Protocol::Tcp));
        assert_eq!(Protocol::parse("Udp"), Some(Protocol::Udp));
        assert_eq!(Protocol::parse("ICMP"), Some(Protocol::Icmp));
        assert_eq!(Protocol::parse("sctp"), None);
    }

    #[test]
    fn wire_names_are_lowercase() {
        let names: Vec<_> = Protocol::ALL.iter().map(|p| p.wire_name()).collect();
        assert_eq!(names, ["tcp", "udp", "icmp"]);
    }

    #[test]
    #[should_panic(expected = "Unknown protocol 'gre'")]
    fn unknown_protocol() {
        "gre".parse::<Protocol>().unwrap();
    }
}
