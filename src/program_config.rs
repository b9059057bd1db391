use crate::protocol::Protocol;
use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

#[derive(Debug, Parser)]
#[clap(name = "aclcheck")]
pub struct ProgramConfig {
    /// URL of the ACL check backend
    #[clap(
        long,
        env = "ACLCHECK_ENDPOINT",
        default_value = "http://localhost/cgi-bin/aclcheck_cgi.py"
    )]
    pub endpoint: Url,

    #[clap(flatten)]
    pub output: OutputConfig,

    #[clap(subcommand)]
    pub query: Query,
}

#[derive(Clone, Copy, Debug, Args)]
pub struct OutputConfig {
    /// Report format
    #[clap(long = "output", env = "OUTPUT", value_enum, ignore_case = true, default_value = "text")]
    pub format: OutputFormat,

    /// Time to wait for hostname lookups before printing the report, in seconds
    #[clap(long, env, default_value = "5")]
    pub enrichment_wait: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[allow(non_camel_case_types)]
pub enum OutputFormat {
    text,
    html,
}

#[derive(Debug, Subcommand)]
pub enum Query {
    /// List the policy files known to the backend
    Policies,

    /// Check addresses and ports against a policy file
    CheckAcl(AclCheckArgs),

    /// Check reachability between two sets of addresses and ports
    CheckUtnet(ReachabilityArgs),
}

#[derive(Debug, Args)]
pub struct AclCheckArgs {
    /// Policy file to check against (defaults to the first one offered by the backend)
    #[clap(long)]
    pub policy_file: Option<String>,

    /// Protocol to check (tcp, udp, icmp); may be repeated
    #[clap(long = "protocol")]
    pub protocols: Vec<Protocol>,

    /// Space-separated source addresses or hostnames
    #[clap(long, default_value = "")]
    pub source_addresses: String,

    /// Space-separated source ports
    #[clap(long, default_value = "")]
    pub source_ports: String,

    /// Space-separated destination addresses or hostnames
    #[clap(long, default_value = "")]
    pub destination_addresses: String,

    /// Space-separated destination ports
    #[clap(long, default_value = "")]
    pub destination_ports: String,
}

#[derive(Debug, Args)]
pub struct ReachabilityArgs {
    /// Protocol to check (tcp, udp, icmp); may be repeated
    #[clap(long = "protocol")]
    pub protocols: Vec<Protocol>,

    /// Space-separated addresses or hostnames of the first set
    #[clap(long, default_value = "")]
    pub addresses1: String,

    /// Space-separated ports of the first set
    #[clap(long, default_value = "")]
    pub ports1: String,

    /// Space-separated addresses or hostnames of the second set
    #[clap(long, default_value = "")]
    pub addresses2: String,

    /// Space-separated ports of the second set
    #[clap(long, default_value = "")]
    pub ports2: String,
}

impl ProgramConfig {
    pub fn parse() -> Self {
        Parser::parse()
    }
}
