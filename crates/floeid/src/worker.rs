use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::debug;

use crate::error::{Error, Result};

/// Strategy for resolving this process's worker ID.
///
/// The generator invokes the source exactly once, at construction; a
/// failure there fails construction. Worker-ID allocation across a fleet is
/// the caller's problem: any stable, fleet-unique integer works, whether it
/// comes from configuration, a coordination service, or the default
/// address-derived source.
///
/// Closures implement the trait directly:
///
/// ```
/// use floeid::SnowflakeGenerator;
///
/// let generator = SnowflakeGenerator::builder()
///     .worker_id_source(|| Ok(42))
///     .build()
///     .unwrap();
/// assert_eq!(generator.worker_id(), 42);
/// ```
pub trait WorkerIdSource {
    /// Produces the worker ID for this process.
    ///
    /// # Errors
    ///
    /// Implementations report whatever prevented resolution; the error is
    /// propagated out of generator construction unchanged.
    fn resolve(&self) -> Result<i64>;
}

impl<F> WorkerIdSource for F
where
    F: Fn() -> Result<i64>,
{
    fn resolve(&self) -> Result<i64> {
        self()
    }
}

/// Default worker-ID source, derived from the local IPv4 address.
///
/// The last two octets of the first non-loopback IPv4 address are combined
/// as `(octet3 << 8 | octet4) & 0x0fff`, masked to the default 12-bit
/// worker field. Hosts sharing the low 12 bits of their address collide;
/// supply your own [`WorkerIdSource`] when that can happen.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalIpWorkerId;

impl WorkerIdSource for LocalIpWorkerId {
    fn resolve(&self) -> Result<i64> {
        let ip = local_ipv4()?;
        let [_, _, octet3, octet4] = ip.octets();
        let worker_id = ((i64::from(octet3) << 8) + i64::from(octet4)) & 0x0fff;
        debug!(local_ip = %ip, worker_id, "derived worker id from local address");
        Ok(worker_id)
    }
}

/// Finds the local IPv4 address used for outbound traffic.
///
/// Connecting a UDP socket to a public address does not send any packets,
/// but makes the OS select the outbound interface and bind to its address.
fn local_ipv4() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:53")?;

    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() => Ok(ip),
        _ => Err(Error::NoIpv4Address),
    }
}
