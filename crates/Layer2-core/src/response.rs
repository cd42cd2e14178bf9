//! Response head serialization
//!
//! The proxy relays the origin response as an HTTP/1.1 byte stream and closes
//! the connection afterwards. Hop-by-hop headers describe the upstream
//! connection, not the client one, so they are dropped. The body arrives
//! already de-chunked, hence `Transfer-Encoding` goes too.

use std::fmt::Write;

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Status line plus end-to-end headers plus `Connection: close`
pub fn encode_head(status: u16, reason: Option<&str>, headers: &[(String, String)]) -> Vec<u8> {
    let mut head = String::with_capacity(64 + headers.len() * 32);
    let _ = write!(head, "HTTP/1.1 {} {}\r\n", status, reason.unwrap_or(""));
    for (name, value) in headers {
        if is_hop_by_hop(name) {
            continue;
        }
        let _ = write!(head, "{}: {}\r\n", name, value);
    }
    head.push_str("Connection: close\r\n\r\n");
    head.into_bytes()
}
