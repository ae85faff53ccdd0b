//! Protocol-migration guidance responder
//!
//! Declines when no known protocol is named ("migrate my photos" is not ours).

use super::Responder;
use crate::extractor::{contains_phrase, normalize};
use crate::models::Response;
use crate::Result;

pub const HANDLER_ID: &str = "protocol_migration";

struct MigrationPlaybook {
    protocol: &'static str,
    aliases: &'static [&'static str],
    steps: &'static [&'static str],
}

const PLAYBOOKS: &[MigrationPlaybook] = &[
    MigrationPlaybook {
        protocol: "IPv6",
        aliases: &["ipv6"],
        steps: &[
            "Inventory every address literal and IPv4-only dependency",
            "Run dual-stack at the edge first, then internal services",
            "Publish AAAA records once health checks pass on both stacks",
            "Retire IPv4 per segment only after traffic has drained",
        ],
    },
    MigrationPlaybook {
        protocol: "HTTP/2",
        aliases: &["http/2", "http2", "h2"],
        steps: &[
            "Terminate TLS with ALPN support on the load balancer",
            "Remove HTTP/1.1 workarounds such as domain sharding and sprite sheets",
            "Watch head-of-line blocking on lossy mobile links",
        ],
    },
    MigrationPlaybook {
        protocol: "HTTP/3",
        aliases: &["http/3", "http3", "quic"],
        steps: &[
            "Open UDP/443 through every firewall on the path",
            "Advertise via Alt-Svc and keep HTTP/2 as fallback",
            "Compare tail latency per network type before widening rollout",
        ],
    },
    MigrationPlaybook {
        protocol: "TLS 1.3",
        aliases: &["tls 1.3", "tls1.3"],
        steps: &[
            "Audit clients for TLS 1.3 support and pinned cipher suites",
            "Enable 1.3 alongside 1.2, then disable 1.0 and 1.1",
            "Keep 0-RTT off unless every affected endpoint is idempotent",
        ],
    },
];

pub struct ProtocolMigrationResponder;

impl Responder for ProtocolMigrationResponder {
    fn id(&self) -> &'static str {
        HANDLER_ID
    }

    fn respond(&self, text: &str) -> Result<Option<Response>> {
        let normalized = normalize(text);

        let Some(playbook) = PLAYBOOKS
            .iter()
            .find(|p| p.aliases.iter().any(|a| contains_phrase(&normalized, a)))
        else {
            return Ok(None);
        };

        let mut out = format!("### Migrating to {}\n\n", playbook.protocol);
        for (i, step) in playbook.steps.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }

        Ok(Some(Response::from_handler(HANDLER_ID, out)))
    }
}
