// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// LAN address detection for the bind address and start-up banner.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::warn;

/// Public address used only to make the OS pick the outbound interface.
/// Nothing is sent: `connect` on UDP just sets the default peer.
const PROBE_ADDR: &str = "8.8.8.8:80";

/// The machine's primary LAN address, or loopback if none can be found.
pub fn detect_local_ip() -> IpAddr {
    match probe_local_ip() {
        Ok(ip) => ip,
        Err(e) => {
            warn!(error = %e, "could not detect the LAN address, using 127.0.0.1");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn probe_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}
