//! Server configuration from command-line flags and environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use result_registry_sdk::ClientConfig;
use result_registry_types::Result;

/// Result registry service.
#[derive(Debug, Parser)]
#[command(name = "result-registry-server", version, about)]
pub struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "REGISTRY_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,

    /// Ledger JSON-RPC endpoint URL.
    #[arg(long, env = "REGISTRY_RPC_URL")]
    pub rpc_url: String,

    /// Institution signing key, hex (with or without 0x) or base64.
    #[arg(long, env = "REGISTRY_SIGNER_KEY", hide_env_values = true)]
    pub signer_key: String,

    /// Identifier of the deployed registry package.
    #[arg(long, env = "REGISTRY_PACKAGE_ID")]
    pub package_id: String,

    /// Identifier of the shared registry object.
    #[arg(long, env = "REGISTRY_OBJECT_ID")]
    pub registry_id: String,

    /// Identifier of the institution capability object.
    #[arg(long, env = "REGISTRY_INSTITUTION_CAP_ID")]
    pub institution_cap: String,

    /// Ledger request timeout in seconds.
    #[arg(long, env = "REGISTRY_RPC_TIMEOUT_SECS", default_value_t = 30)]
    pub rpc_timeout_secs: u64,
}

impl Cli {
    /// Builds a validated ledger client configuration from the flags.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArguments` for a non-HTTP URL, empty identifiers, or
    /// a zero timeout.
    pub fn client_config(&self) -> Result<ClientConfig> {
        ClientConfig::builder()
            .with_rpc_url(&self.rpc_url)
            .with_package_id(&self.package_id)
            .with_registry_id(&self.registry_id)
            .with_institution_cap(&self.institution_cap)
            .with_timeout(Duration::from_secs(self.rpc_timeout_secs))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(
            [
                "result-registry-server",
                "--rpc-url",
                "http://localhost:9000",
                "--signer-key",
                "0x0101010101010101010101010101010101010101010101010101010101010101",
                "--package-id",
                "0xpkg",
                "--registry-id",
                "0xreg",
                "--institution-cap",
                "0xcap",
            ]
            .into_iter()
            .chain(args.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn defaults_apply() {
        let cli = parse(&[]);
        assert_eq!(cli.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cli.rpc_timeout_secs, 30);
    }

    #[test]
    fn client_config_carries_flag_values() {
        let cli = parse(&["--rpc-timeout-secs", "5"]);
        let config = cli.client_config().unwrap();
        assert_eq!(config.rpc_url(), "http://localhost:9000");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.institution_cap(), "0xcap");
    }

    #[test]
    fn missing_required_flag_is_a_parse_error() {
        let result = Cli::try_parse_from(["result-registry-server", "--rpc-url", "http://x"]);
        assert!(result.is_err());
    }
}
