//! Minimal SNTP client: one request packet, the server's transmit timestamp,
//! half the round trip as the latency estimate.

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::net::UdpSocket;
use tracing::{info, warn};

use frame_proto::config::ClockConfig;

/// Seconds from 1900-01-01 (NTP era 0) to 1970-01-01.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;
/// Seconds per NTP era; era 1 starts 2036-02-07T06:28:16Z.
const NTP_ERA: i64 = 1 << 32;
const PACKET_LEN: usize = 48;
/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_HEADER: u8 = 0x1B;

fn request_packet() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Server transmit timestamp (bytes 40..48) of a reply.
fn transmit_time(reply: &[u8]) -> Option<DateTime<Utc>> {
    if reply.len() < PACKET_LEN {
        return None;
    }
    let secs = u32::from_be_bytes(reply[40..44].try_into().ok()?);
    let frac = u32::from_be_bytes(reply[44..48].try_into().ok()?) as u64;
    if secs == 0 {
        // Kiss-o'-death or unsynchronised server.
        return None;
    }
    // With the top bit clear the timestamp has wrapped into era 1.
    let secs = if secs & 0x8000_0000 == 0 {
        secs as i64 + NTP_ERA
    } else {
        secs as i64
    };
    let nanos = ((frac * 1_000_000_000) >> 32) as u32;
    DateTime::from_timestamp(secs - NTP_UNIX_OFFSET, nanos)
}

/// One exchange with `server`; returns network time minus local time.
async fn query(server: &str, timeout: Duration) -> anyhow::Result<TimeDelta> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket
        .connect(server)
        .await
        .with_context(|| format!("resolving {server}"))?;

    let sent = Utc::now();
    socket.send(&request_packet()).await?;
    let mut reply = [0u8; PACKET_LEN];
    let len = tokio::time::timeout(timeout, socket.recv(&mut reply))
        .await
        .map_err(|_| anyhow::anyhow!("no reply from {server} within {timeout:?}"))??;
    let received = Utc::now();

    let remote = transmit_time(&reply[..len])
        .ok_or_else(|| anyhow::anyhow!("unusable reply from {server} ({len} bytes)"))?;
    let midpoint = sent + (received - sent) / 2;
    Ok(remote - midpoint)
}

#[derive(Debug, Clone)]
pub struct NtpSync {
    server: String,
    attempts: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl NtpSync {
    pub fn from_config(clock: &ClockConfig, timeout: Duration) -> Self {
        Self {
            server: clock.ntp_server.clone(),
            attempts: clock.ntp_attempts.max(1),
            retry_delay: clock.ntp_retry_delay(),
            timeout,
        }
    }

    /// Clock correction from the configured server, or `None` once every
    /// attempt has failed.
    pub async fn correction(&self) -> Option<TimeDelta> {
        for attempt in 1..=self.attempts {
            match query(&self.server, self.timeout).await {
                Ok(correction) => {
                    info!(
                        "[ntp] {} says local clock is off by {} ms",
                        self.server,
                        correction.num_milliseconds()
                    );
                    return Some(correction);
                }
                Err(e) => {
                    warn!("[ntp] attempt {}/{} failed: {:#}", attempt, self.attempts, e);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        None
    }
}
