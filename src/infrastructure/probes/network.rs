use std::collections::BTreeMap;

use async_trait::async_trait;
use sysinfo::Networks;

use crate::domain::entities::snapshot::{fields, probes, MetricSnapshot};
use crate::domain::ports::probe::{Probe, ProbeError};

const PROC_NET_TCP: [&str; 2] = ["/proc/net/tcp", "/proc/net/tcp6"];
const PROC_NET_DEV: &str = "/proc/net/dev";
const LOOPBACK: &str = "lo";

// Hex socket states in /proc/net/tcp
const TCP_ESTABLISHED: &str = "01";
const TCP_LISTEN: &str = "0A";

/// TCP connection counts and per-interface error/drop counters.
pub struct NetworkProbe;

#[async_trait]
impl Probe for NetworkProbe {
    fn name(&self) -> &'static str {
        probes::NETWORK
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        let errors = tokio::task::spawn_blocking(interface_errors)
            .await
            .map_err(|e| ProbeError::Unavailable(format!("network sampling task failed: {e}")))?;

        let mut tcp_tables = Vec::new();
        for path in PROC_NET_TCP {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => tcp_tables.push(content),
                Err(e) => tracing::debug!("Cannot read {path}: {e}"),
            }
        }
        let drops = match tokio::fs::read_to_string(PROC_NET_DEV).await {
            Ok(content) => Some(parse_net_dev_drops(&content)),
            Err(e) => {
                tracing::debug!("Cannot read {PROC_NET_DEV}: {e}");
                None
            }
        };

        if tcp_tables.is_empty() && errors.is_empty() && drops.is_none() {
            return Err(ProbeError::Unavailable(
                "no socket table or interface counters readable".to_string(),
            ));
        }

        let mut builder = MetricSnapshot::builder(probes::NETWORK);
        builder = if tcp_tables.is_empty() {
            builder.unreadable(fields::CONNECTIONS_TOTAL, None, "socket tables unreadable")
        } else {
            let counts = tcp_tables
                .iter()
                .map(|t| count_tcp_states(t))
                .fold(TcpCounts::default(), TcpCounts::merge);
            builder
                .number(fields::CONNECTIONS_TOTAL, counts.total as f64)
                .number(fields::CONNECTIONS_ESTABLISHED, counts.established as f64)
                .number(fields::CONNECTIONS_LISTENING, counts.listening as f64)
        };
        for (iface, count) in &errors {
            builder = builder.keyed(fields::IFACE_ERRORS, iface, *count as f64);
        }
        for (iface, count) in drops.iter().flatten() {
            builder = builder.keyed(fields::IFACE_DROPS, iface, *count as f64);
        }
        Ok(builder.build())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TcpCounts {
    total: u64,
    established: u64,
    listening: u64,
}

impl TcpCounts {
    const fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            established: self.established + other.established,
            listening: self.listening + other.listening,
        }
    }
}

/// Receive + transmit errors per non-loopback interface.
fn interface_errors() -> BTreeMap<String, u64> {
    let networks = Networks::new_with_refreshed_list();
    networks
        .iter()
        .filter(|(name, _)| name.as_str() != LOOPBACK)
        .map(|(name, data)| {
            (
                name.clone(),
                data.total_errors_on_received() + data.total_errors_on_transmitted(),
            )
        })
        .collect()
}

/// Counts sockets in `/proc/net/tcp` format; the fourth column is the state.
fn count_tcp_states(content: &str) -> TcpCounts {
    content
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(3))
        .fold(TcpCounts::default(), |mut counts, state| {
            counts.total += 1;
            match state {
                TCP_ESTABLISHED => counts.established += 1,
                TCP_LISTEN => counts.listening += 1,
                _ => {}
            }
            counts
        })
}

/// Receive + transmit drops per non-loopback interface from `/proc/net/dev`.
///
/// After `iface:` the columns are 8 receive counters then 8 transmit
/// counters; drops are the fourth of each group.
fn parse_net_dev_drops(content: &str) -> BTreeMap<String, u64> {
    content
        .lines()
        .skip(2)
        .filter_map(|line| {
            let (name, counters) = line.split_once(':')?;
            let name = name.trim();
            if name == LOOPBACK {
                return None;
            }
            let cols: Vec<u64> = counters
                .split_whitespace()
                .map(str::parse)
                .collect::<Result<_, _>>()
                .ok()?;
            if cols.len() < 12 {
                return None;
            }
            Some((name.to_string(), cols[3] + cols[11]))
        })
        .collect()
}
