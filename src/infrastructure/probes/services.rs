use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use super::command;
use crate::domain::entities::snapshot::{context, fields, probes, MetricSnapshot};
use crate::domain::ports::probe::{Probe, ProbeError};

const PORT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Critical service state, failed units and local TCP port reachability.
pub struct ServicesProbe {
    critical: Vec<String>,
    ports: BTreeMap<String, u16>,
}

impl ServicesProbe {
    #[must_use]
    pub const fn new(critical: Vec<String>, ports: BTreeMap<String, u16>) -> Self {
        Self { critical, ports }
    }
}

#[async_trait]
impl Probe for ServicesProbe {
    fn name(&self) -> &'static str {
        probes::SERVICES
    }

    async fn capture(&self) -> Result<MetricSnapshot, ProbeError> {
        let mut builder = MetricSnapshot::builder(probes::SERVICES);

        for service in &self.critical {
            // is-active exits non-zero for anything but "active"; only stdout matters
            let output = command::run("systemctl", &["is-active", service.as_str()]).await?;
            let state = String::from_utf8_lossy(&output.stdout);
            let active = is_active(&state);
            if !active {
                tracing::debug!(service = %service, state = %state.trim(), "Service not active");
            }
            builder = builder.keyed(fields::SERVICE_ACTIVE, service, if active { 1.0 } else { 0.0 });
        }

        let failed = command::stdout_of("systemctl", &["--failed", "--no-legend", "--plain"])
            .await
            .and_then(|stdout| parse_failed_units(&stdout));
        builder = match failed {
            Ok(failed) => {
                #[allow(clippy::cast_precision_loss)]
                let count = failed.len() as f64;
                builder
                    .number(fields::FAILED_UNIT_COUNT, count)
                    .context(context::FAILED_UNITS, failed)
            }
            Err(e @ ProbeError::Unavailable(_)) => return Err(e),
            Err(e) => builder.unreadable(fields::FAILED_UNIT_COUNT, None, &e.to_string()),
        };

        for (name, port) in &self.ports {
            let open = port_open(*port).await;
            builder = builder.keyed(
                fields::SERVICE_PORT_OPEN,
                &format!("{name}:{port}"),
                if open { 1.0 } else { 0.0 },
            );
        }

        Ok(builder.build())
    }
}

fn is_active(state: &str) -> bool {
    state.trim() == "active"
}

/// Unit names from `systemctl --failed --no-legend --plain`.
///
/// Rows are `UNIT LOAD ACTIVE SUB DESCRIPTION...` with ACTIVE always
/// `failed`; any other row means the output is not what was asked for.
fn parse_failed_units(stdout: &str) -> Result<Vec<String>, ProbeError> {
    stdout
        .lines()
        .map(|line| line.trim_start_matches('●').trim())
        .filter(|line| !line.is_empty())
        .map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 || cols[2] != "failed" {
                return Err(ProbeError::Parse(format!("unexpected failed-unit row '{line}'")));
            }
            Ok(cols[0].to_string())
        })
        .collect()
}

async fn port_open(port: u16) -> bool {
    matches!(
        tokio::time::timeout(PORT_CONNECT_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await,
        Ok(Ok(_))
    )
}
