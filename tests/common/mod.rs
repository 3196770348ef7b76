//! Integration test common infrastructure.
//!
//! Provides a scripted fake IRC server and config builders for driving
//! real sessions over loopback TCP.

pub mod ircd;

#[allow(unused_imports)]
pub use ircd::{FakeIrcd, IrcdPeer};

use skuzzy::config::ServerConfig;

/// Plaintext config pointed at `port`, with short timings for tests.
#[allow(dead_code)]
pub fn server_config(port: u16, extra: &str) -> ServerConfig {
    let toml = format!(
        r##"
name = "test"
host = "127.0.0.1"
port = {port}
tls = false
nick = "skuzzy"
{extra}

[timing]
read_timeout_secs = 5
reconnect_delay_secs = 1
connect_timeout_secs = 2
pacing_ms = 0
"##
    );
    toml::from_str(&toml).expect("test config should parse")
}
