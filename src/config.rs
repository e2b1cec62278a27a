//! Runtime configuration.
//!
//! Both binaries read their settings from CLI flags with environment-variable
//! fallbacks (a `.env` file is loaded first). The PyMOL endpoint flags are
//! shared through [`PymolArgs`].

use std::net::{IpAddr, SocketAddr};

use clap::{Args, Parser};

/// Default host of PyMOL's XML-RPC listener.
pub const DEFAULT_PYMOL_HOST: &str = "localhost";

/// PyMOL binds 9123 and walks upward when the port is taken.
pub const DEFAULT_PYMOL_PORT: u16 = 9123;

/// Number of consecutive ports probed starting at the base port.
pub const PORT_PROBE_WINDOW: u16 = 5;

/// Where to find PyMOL. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub base_port: u16,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, base_port: u16) -> Self {
        Self {
            host: host.into(),
            base_port,
        }
    }

    /// `base_port ..= base_port + 4`, stopping early at `u16::MAX`.
    pub fn candidate_ports(&self) -> impl Iterator<Item = u16> + '_ {
        (0..PORT_PROBE_WINDOW).filter_map(|offset| self.base_port.checked_add(offset))
    }

    /// XML-RPC URL for one candidate port.
    pub fn url_for(&self, port: u16) -> String {
        format!("http://{}:{}/RPC2", self.host, port)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PYMOL_HOST, DEFAULT_PYMOL_PORT)
    }
}

/// PyMOL endpoint flags, flattened into each binary's CLI.
#[derive(Debug, Clone, Args)]
pub struct PymolArgs {
    /// Host running PyMOL's XML-RPC server
    #[arg(long = "pymol-host", env = "PYMOL_HOST", default_value = DEFAULT_PYMOL_HOST)]
    pub pymol_host: String,

    /// First XML-RPC port to probe (the next four are tried as well)
    #[arg(long = "pymol-port", env = "PYMOL_PORT", default_value_t = DEFAULT_PYMOL_PORT)]
    pub pymol_port: u16,
}

impl PymolArgs {
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::new(self.pymol_host.clone(), self.pymol_port)
    }
}

/// Default bind address of the networked binary.
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";
pub const DEFAULT_BIND_PORT: u16 = 3000;

/// CLI of `pymol-mcp-server` (MCP over HTTP+SSE).
#[derive(Debug, Clone, Parser)]
#[command(name = "pymol-mcp-server", version, about = "MCP server for PyMOL over HTTP+SSE")]
pub struct ServerArgs {
    /// IP address to bind (IPv4 or IPv6)
    #[arg(long, env = "PYMOL_MCP_HOST", default_value = DEFAULT_BIND_HOST)]
    pub host: IpAddr,

    /// Port to bind
    #[arg(long, env = "PYMOL_MCP_PORT", default_value_t = DEFAULT_BIND_PORT)]
    pub port: u16,

    #[command(flatten)]
    pub pymol: PymolArgs,
}

impl ServerArgs {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// CLI of `pymol-mcp-stdio` (MCP over stdin/stdout).
#[derive(Debug, Clone, Parser)]
#[command(name = "pymol-mcp-stdio", version, about = "MCP server for PyMOL over stdio")]
pub struct StdioArgs {
    #[command(flatten)]
    pub pymol: PymolArgs,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn candidate_ports_cover_five_consecutive_ports() {
        let cfg = EndpointConfig::new("localhost", 9123);
        let ports: Vec<u16> = cfg.candidate_ports().collect();
        assert_eq!(ports, vec![9123, 9124, 9125, 9126, 9127]);
    }

    #[test]
    fn candidate_ports_stop_at_u16_max() {
        let cfg = EndpointConfig::new("localhost", u16::MAX - 1);
        let ports: Vec<u16> = cfg.candidate_ports().collect();
        assert_eq!(ports, vec![u16::MAX - 1, u16::MAX]);
    }

    #[test]
    fn url_targets_rpc2_path() {
        let cfg = EndpointConfig::new("10.0.0.5", 9123);
        assert_eq!(cfg.url_for(9124), "http://10.0.0.5:9124/RPC2");
    }

    #[test]
    fn default_matches_pymol_defaults() {
        let cfg = EndpointConfig::default();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.base_port, 9123);
    }

    /// Declared default and env var of a flag, independent of the process
    /// environment.
    fn declared(cmd: &clap::Command, long: &str) -> (Option<String>, Option<String>) {
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_long() == Some(long))
            .unwrap_or_else(|| panic!("no --{long} flag"));
        let default = arg
            .get_default_values()
            .first()
            .map(|v| v.to_string_lossy().into_owned());
        let env = arg.get_env().map(|v| v.to_string_lossy().into_owned());
        (default, env)
    }

    #[test]
    fn server_args_declare_defaults_and_env_vars() {
        let cmd = ServerArgs::command();
        let expected = [
            ("host", "127.0.0.1", "PYMOL_MCP_HOST"),
            ("port", "3000", "PYMOL_MCP_PORT"),
            ("pymol-host", "localhost", "PYMOL_HOST"),
            ("pymol-port", "9123", "PYMOL_PORT"),
        ];
        for (long, default, env) in expected {
            assert_eq!(
                declared(&cmd, long),
                (Some(default.to_string()), Some(env.to_string())),
                "--{long}"
            );
        }
    }

    #[test]
    fn server_args_flags_override() {
        let args = ServerArgs::try_parse_from([
            "pymol-mcp-server",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--pymol-host",
            "pymol.lab",
            "--pymol-port",
            "9200",
        ])
        .unwrap();
        assert_eq!(args.bind_addr(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(args.pymol.endpoint(), EndpointConfig::new("pymol.lab", 9200));
    }

    #[test]
    fn ipv6_bind_host_gives_bracketed_socket_addr() {
        let args =
            ServerArgs::try_parse_from(["pymol-mcp-server", "--host", "::1", "--port", "3001"]).unwrap();
        assert_eq!(args.bind_addr(), "[::1]:3001".parse::<SocketAddr>().unwrap());
        assert_eq!(args.bind_addr().to_string(), "[::1]:3001");
    }

    #[test]
    fn bind_host_must_be_an_ip_address() {
        assert!(ServerArgs::try_parse_from(["pymol-mcp-server", "--host", "not an ip"]).is_err());
    }

    #[test]
    fn stdio_args_accept_pymol_flags() {
        let args = StdioArgs::try_parse_from(["pymol-mcp-stdio", "--pymol-port", "9300"]).unwrap();
        assert_eq!(args.pymol.pymol_port, 9300);
    }
}
