//! Inet socket enumeration from /proc/net.
//!
//! The kernel socket tables (`/proc/net/tcp{,6}`, `/proc/net/udp{,6}`)
//! store addresses as little-endian hex and states as a hex nibble.
//! Owning pids are recovered by scanning `/proc/[pid]/fd` for
//! `socket:[inode]` links; sockets whose inode has no owner stay at -1.

use crate::CollectError;
use hostlens_events::ConnectionRecord;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::warn;

/// TCP connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    Unknown,
}

impl TcpState {
    /// Parse from the /proc/net/tcp state nibble.
    pub fn from_hex(hex: u8) -> Self {
        match hex {
            0x01 => TcpState::Established,
            0x02 => TcpState::SynSent,
            0x03 => TcpState::SynRecv,
            0x04 => TcpState::FinWait1,
            0x05 => TcpState::FinWait2,
            0x06 => TcpState::TimeWait,
            0x07 => TcpState::Close,
            0x08 => TcpState::CloseWait,
            0x09 => TcpState::LastAck,
            0x0A => TcpState::Listen,
            0x0B => TcpState::Closing,
            _ => TcpState::Unknown,
        }
    }

    /// Uppercase state name as reported in the `state` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TcpState::Established => "ESTABLISHED",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynRecv => "SYN_RECV",
            TcpState::FinWait1 => "FIN_WAIT1",
            TcpState::FinWait2 => "FIN_WAIT2",
            TcpState::TimeWait => "TIME_WAIT",
            TcpState::Close => "CLOSE",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::LastAck => "LAST_ACK",
            TcpState::Listen => "LISTEN",
            TcpState::Closing => "CLOSING",
            TcpState::Unknown => "UNKNOWN",
        }
    }
}

/// One row of a kernel socket table.
#[derive(Debug, Clone)]
struct SocketEntry {
    local_addr: String,
    local_port: u16,
    remote_addr: String,
    remote_port: u16,
    state: TcpState,
    inode: u64,
}

/// Snapshot of all inet sockets, with owning pids resolved where possible.
///
/// Enumeration failure (including unsupported platforms) degrades to an
/// empty sequence after a warning; it never propagates.
pub fn connections() -> Vec<ConnectionRecord> {
    match enumerate_connections(true) {
        Ok(records) => records,
        Err(e) => {
            warn!("connection enumeration failed: {e}");
            Vec::new()
        }
    }
}

/// Current sockets for the monitor's poll cycle, without pid resolution.
///
/// Errors propagate so the caller can report permission problems and
/// treat the cycle as empty.
pub fn current_connections() -> Result<Vec<ConnectionRecord>, CollectError> {
    enumerate_connections(false)
}

#[cfg(target_os = "linux")]
fn enumerate_connections(resolve_pids: bool) -> Result<Vec<ConnectionRecord>, CollectError> {
    let inode_pids = if resolve_pids {
        socket_inode_pids()
    } else {
        HashMap::new()
    };

    let mut records = Vec::new();
    for (path, is_ipv6, protocol) in [
        ("/proc/net/tcp", false, "TCP"),
        ("/proc/net/tcp6", true, "TCP"),
        ("/proc/net/udp", false, "UDP"),
        ("/proc/net/udp6", true, "UDP"),
    ] {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            // tcp6/udp6 are absent on ipv6-disabled kernels.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(CollectError::from_io(path, e)),
        };

        for entry in parse_socket_table(&content, is_ipv6) {
            records.push(to_record(entry, protocol, &inode_pids));
        }
    }

    Ok(records)
}

#[cfg(not(target_os = "linux"))]
fn enumerate_connections(_resolve_pids: bool) -> Result<Vec<ConnectionRecord>, CollectError> {
    Err(CollectError::Unsupported {
        what: "inet socket enumeration",
    })
}

fn to_record(
    entry: SocketEntry,
    protocol: &str,
    inode_pids: &HashMap<u64, i64>,
) -> ConnectionRecord {
    // Unconnected sockets report an all-zero remote endpoint; surface
    // that as empty, matching how the snapshot table stores it.
    let unconnected = entry.remote_port == 0
        && (entry.remote_addr == "0.0.0.0" || entry.remote_addr == "::");

    let state = if protocol == "UDP" {
        "NONE".to_string()
    } else {
        entry.state.as_str().to_string()
    };

    ConnectionRecord {
        pid: inode_pids.get(&entry.inode).copied().unwrap_or(-1),
        local_address: entry.local_addr,
        local_port: i64::from(entry.local_port),
        remote_address: if unconnected {
            String::new()
        } else {
            entry.remote_addr
        },
        remote_port: if unconnected {
            0
        } else {
            i64::from(entry.remote_port)
        },
        state,
        protocol: protocol.to_string(),
    }
}

/// Map socket inodes to owning pids by walking /proc/[pid]/fd.
///
/// Unreadable fd directories (other users' processes) are skipped.
#[cfg(target_os = "linux")]
fn socket_inode_pids() -> HashMap<u64, i64> {
    let mut map = HashMap::new();
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return map;
    };

    for entry in entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<i64>().ok()) else {
            continue;
        };
        let Ok(fds) = std::fs::read_dir(entry.path().join("fd")) else {
            continue;
        };
        for fd in fds.flatten() {
            if let Ok(target) = std::fs::read_link(fd.path()) {
                let target = target.to_string_lossy();
                if let Some(inode) = target
                    .strip_prefix("socket:[")
                    .and_then(|s| s.strip_suffix(']'))
                    .and_then(|s| s.parse().ok())
                {
                    map.insert(inode, pid);
                }
            }
        }
    }

    map
}

/// Parse one kernel socket table.
///
/// Format per line (after the header):
/// `sl local_address rem_address st tx:rx tr:tm retrnsmt uid timeout inode ...`
fn parse_socket_table(content: &str, is_ipv6: bool) -> Vec<SocketEntry> {
    let mut entries = Vec::new();

    for line in content.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 10 {
            continue;
        }

        let (local_addr, local_port) = parse_addr_port(parts[1], is_ipv6);
        let (remote_addr, remote_port) = parse_addr_port(parts[2], is_ipv6);
        let state = u8::from_str_radix(parts[3], 16)
            .map(TcpState::from_hex)
            .unwrap_or(TcpState::Unknown);
        let inode = parts[9].parse().unwrap_or(0);

        entries.push(SocketEntry {
            local_addr,
            local_port,
            remote_addr,
            remote_port,
            state,
            inode,
        });
    }

    entries
}

/// Parse "ADDR:PORT" where both halves are hex.
fn parse_addr_port(addr_port: &str, is_ipv6: bool) -> (String, u16) {
    let Some((addr_hex, port_hex)) = addr_port.split_once(':') else {
        return (String::new(), 0);
    };

    let port = u16::from_str_radix(port_hex, 16).unwrap_or(0);
    let addr = if is_ipv6 {
        parse_ipv6_addr(addr_hex)
    } else {
        parse_ipv4_addr(addr_hex)
    };

    (addr, port)
}

/// IPv4 from little-endian hex.
fn parse_ipv4_addr(hex: &str) -> String {
    if hex.len() != 8 {
        return "0.0.0.0".to_string();
    }

    let bytes: Vec<u8> = (0..4)
        .filter_map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok())
        .collect();

    if bytes.len() != 4 {
        return "0.0.0.0".to_string();
    }

    Ipv4Addr::new(bytes[3], bytes[2], bytes[1], bytes[0]).to_string()
}

/// IPv6 from four little-endian 32-bit hex words.
fn parse_ipv6_addr(hex: &str) -> String {
    if hex.len() != 32 {
        return "::".to_string();
    }

    let mut segments = [0u16; 8];
    for i in 0..4 {
        let word_hex = &hex[i * 8..(i + 1) * 8];
        if let Ok(word) = u32::from_str_radix(word_hex, 16) {
            let word = word.swap_bytes();
            segments[i * 2] = (word >> 16) as u16;
            segments[i * 2 + 1] = (word & 0xFFFF) as u16;
        }
    }

    Ipv6Addr::new(
        segments[0],
        segments[1],
        segments[2],
        segments[3],
        segments[4],
        segments[5],
        segments[6],
        segments[7],
    )
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TCP_SAMPLE: &str = r#"  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:1388 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 12345 1 0000000000000000 100 0 0 10 0
   1: 0100007F:1388 0100007F:1770 01 00000000:00000000 00:00000000 00000000  1000        0 67890 1 0000000000000000 20 0 0 10 -1
"#;

    #[test]
    fn test_tcp_state_from_hex() {
        assert_eq!(TcpState::from_hex(0x01), TcpState::Established);
        assert_eq!(TcpState::from_hex(0x0A), TcpState::Listen);
        assert_eq!(TcpState::from_hex(0xFF), TcpState::Unknown);
    }

    #[test]
    fn test_parse_ipv4_addr() {
        // 127.0.0.1 is stored little-endian as 0100007F.
        assert_eq!(parse_ipv4_addr("0100007F"), "127.0.0.1");
        assert_eq!(parse_ipv4_addr("00000000"), "0.0.0.0");
        assert_eq!(parse_ipv4_addr("0101A8C0"), "192.168.1.1");
    }

    #[test]
    fn test_parse_ipv6_loopback() {
        // ::1 as four little-endian words.
        assert_eq!(
            parse_ipv6_addr("00000000000000000000000001000000"),
            "::1"
        );
    }

    #[test]
    fn test_parse_addr_port() {
        let (addr, port) = parse_addr_port("0100007F:0035", false);
        assert_eq!(addr, "127.0.0.1");
        assert_eq!(port, 53);
    }

    #[test]
    fn test_parse_socket_table() {
        let entries = parse_socket_table(TCP_SAMPLE, false);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].local_addr, "127.0.0.1");
        assert_eq!(entries[0].local_port, 5000);
        assert_eq!(entries[0].state, TcpState::Listen);
        assert_eq!(entries[0].inode, 12345);

        assert_eq!(entries[1].remote_port, 6000);
        assert_eq!(entries[1].state, TcpState::Established);
    }

    #[test]
    fn test_to_record_blanks_unconnected_remote() {
        let entries = parse_socket_table(TCP_SAMPLE, false);
        let record = to_record(entries[0].clone(), "TCP", &HashMap::new());
        assert_eq!(record.remote_address, "");
        assert_eq!(record.remote_port, 0);
        assert_eq!(record.state, "LISTEN");
        assert_eq!(record.pid, -1);

        let record = to_record(entries[1].clone(), "TCP", &HashMap::new());
        assert_eq!(record.remote_address, "127.0.0.1");
        assert_eq!(record.remote_port, 6000);
        assert_eq!(record.state, "ESTABLISHED");
    }

    #[test]
    fn test_udp_rows_report_none_state() {
        let entries = parse_socket_table(TCP_SAMPLE, false);
        let record = to_record(entries[1].clone(), "UDP", &HashMap::new());
        assert_eq!(record.state, "NONE");
        assert_eq!(record.protocol, "UDP");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let entries = parse_socket_table("header\ngarbage line\n 0: nonsense\n", false);
        assert!(entries.is_empty());
    }

    proptest! {
        #[test]
        fn prop_parse_addr_port_never_panics(s in "\\PC*") {
            let _ = parse_addr_port(&s, false);
            let _ = parse_addr_port(&s, true);
        }

        #[test]
        fn prop_ipv4_round_trip(a: u8, b: u8, c: u8, d: u8) {
            // Re-encode the address the way the kernel does and parse it back.
            let hex = format!("{:02X}{:02X}{:02X}{:02X}", d, c, b, a);
            prop_assert_eq!(parse_ipv4_addr(&hex), format!("{}.{}.{}.{}", a, b, c, d));
        }
    }
}
