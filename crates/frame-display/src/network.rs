//! Reconnect action for a host with an OS-managed network: re-resolve and
//! reach the last.fm endpoint, then re-sync the clock.

use std::time::Duration;

use reqwest::Url;
use tokio::net::{lookup_host, TcpStream};
use tracing::{info, warn};

use frame_proto::config::Config;
use frame_proto::link::{Link, Reassociation};

use crate::ntp::NtpSync;

pub struct NetworkLink {
    /// `host:port` of the service whose reachability decides the link state.
    probe_addr: String,
    timeout: Duration,
    ntp: NtpSync,
}

impl NetworkLink {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = config.network.timeout();
        Ok(Self {
            probe_addr: probe_addr(&config.lastfm.api_base)?,
            timeout,
            ntp: NtpSync::from_config(&config.clock, timeout),
        })
    }

    async fn probe(&self) -> anyhow::Result<()> {
        let probe = async {
            let addr = lookup_host(self.probe_addr.as_str())
                .await?
                .next()
                .ok_or_else(|| anyhow::anyhow!("{} resolved to nothing", self.probe_addr))?;
            TcpStream::connect(addr).await?;
            anyhow::Ok(())
        };
        tokio::time::timeout(self.timeout, probe)
            .await
            .map_err(|_| anyhow::anyhow!("{} unreachable within {:?}", self.probe_addr, self.timeout))?
    }
}

impl Link for NetworkLink {
    async fn reassociate(&mut self) -> Reassociation {
        info!("[link] probing {}", self.probe_addr);
        let reachable = match self.probe().await {
            Ok(()) => true,
            Err(e) => {
                warn!("[link] {:#}", e);
                false
            }
        };
        let clock_correction = self.ntp.correction().await;
        Reassociation {
            reachable,
            clock_correction,
        }
    }
}

fn probe_addr(api_base: &str) -> anyhow::Result<String> {
    let url = Url::parse(api_base)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("api_base {api_base:?} has no host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow::anyhow!("api_base {api_base:?} has no port"))?;
    Ok(format!("{host}:{port}"))
}
