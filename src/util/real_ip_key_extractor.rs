use actix_governor::{KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Keys the inbound rate limit by client IP.
///
/// `Forwarded`/`X-Forwarded-For` are only believed when the connection comes
/// from the trusted reverse proxy; everyone else is keyed by peer address.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RealIpKeyExtractor {
    trusted_proxy: IpAddr,
}

impl RealIpKeyExtractor {
    pub fn new(trusted_proxy: IpAddr) -> Self {
        RealIpKeyExtractor { trusted_proxy }
    }
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    SocketAddr::from_str(value)
        .map(|socket| socket.ip())
        .or_else(|_| IpAddr::from_str(value))
        .ok()
}

impl KeyExtractor for RealIpKeyExtractor {
    type Key = IpAddr;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let peer = req.peer_addr().map(|socket| socket.ip()).ok_or_else(|| {
            SimpleKeyExtractionError::new("Could not extract peer IP address from request")
        })?;
        if peer != self.trusted_proxy {
            return Ok(peer);
        }
        let connection_info = req.connection_info();
        connection_info
            .realip_remote_addr()
            .and_then(parse_ip)
            .ok_or_else(|| {
                SimpleKeyExtractionError::new("Could not extract real IP address from request")
            })
    }
}
