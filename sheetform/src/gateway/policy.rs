use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

/// Hosts answers may be sent to by default: spreadsheet and script hosting.
pub const DEFAULT_ALLOWED_HOSTS: [&str; 4] = [
    "script.google.com",
    "script.googleusercontent.com",
    "docs.google.com",
    "sheets.googleapis.com",
];

/// Why a sink address was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsafeEndpoint {
    #[error("no endpoint configured")]
    Empty,

    #[error("not a valid URL: {0}")]
    Malformed(String),

    #[error("only https endpoints are allowed, got '{0}'")]
    NotHttps(String),

    #[error("endpoint has no host")]
    MissingHost,

    #[error("'{0}' is a private or loopback address")]
    PrivateHost(String),

    #[error("host '{0}' is not on the allow-list")]
    HostNotAllowed(String),
}

/// The rule a sink address must satisfy before anything is sent to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicy {
    allowed_hosts: Vec<String>,
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS)
    }
}

impl EndpointPolicy {
    /// Create a policy allowing exactly the given hosts.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_hosts: hosts
                .into_iter()
                .map(|h| h.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// The allowed host names.
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// Check an address, returning the parsed URL when it is acceptable.
    ///
    /// Private and loopback hosts are refused even if they appear on the
    /// allow-list.
    pub fn check(&self, address: &str) -> Result<Url, UnsafeEndpoint> {
        let address = address.trim();
        if address.is_empty() {
            return Err(UnsafeEndpoint::Empty);
        }

        let url = Url::parse(address).map_err(|e| UnsafeEndpoint::Malformed(e.to_string()))?;
        if url.scheme() != "https" {
            return Err(UnsafeEndpoint::NotHttps(url.scheme().to_string()));
        }

        let host = url.host().ok_or(UnsafeEndpoint::MissingHost)?;
        if is_private_host(&host) {
            return Err(UnsafeEndpoint::PrivateHost(host.to_string()));
        }

        let name = host.to_string().to_ascii_lowercase();
        if !self.allowed_hosts.iter().any(|allowed| *allowed == name) {
            return Err(UnsafeEndpoint::HostNotAllowed(name));
        }

        Ok(url)
    }

    /// Convenience wrapper around [`check`](Self::check).
    pub fn is_allowed(&self, address: &str) -> bool {
        self.check(address).is_ok()
    }
}

fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".local")
                || domain.ends_with(".internal")
        }
        Host::Ipv4(ip) => is_private_ipv4(ip),
        Host::Ipv6(ip) => is_private_ipv6(ip),
    }
}

fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
}

fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80
        || ip.to_ipv4_mapped().is_some_and(|v4| is_private_ipv4(&v4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_https_hosts() {
        let policy = EndpointPolicy::default();
        assert!(policy.is_allowed("https://script.google.com/macros/s/abc/exec"));
        assert!(policy.is_allowed("https://DOCS.google.com/spreadsheets/d/x"));
    }

    #[test]
    fn rejects_plain_http() {
        let err = EndpointPolicy::default()
            .check("http://script.google.com/x")
            .unwrap_err();
        assert_eq!(err, UnsafeEndpoint::NotHttps("http".into()));
    }

    #[test]
    fn rejects_empty_and_malformed() {
        let policy = EndpointPolicy::default();
        assert_eq!(policy.check("  "), Err(UnsafeEndpoint::Empty));
        assert!(matches!(policy.check("script.google.com"), Err(UnsafeEndpoint::Malformed(_))));
    }

    #[test]
    fn rejects_unlisted_hosts() {
        let err = EndpointPolicy::default()
            .check("https://evil.example.com/hook")
            .unwrap_err();
        assert_eq!(err, UnsafeEndpoint::HostNotAllowed("evil.example.com".into()));
        assert!(!EndpointPolicy::default().is_allowed("https://script.google.com.evil.io/x"));
    }

    #[test]
    fn private_hosts_rejected_even_when_listed() {
        let policy = EndpointPolicy::new([
            "localhost",
            "127.0.0.1",
            "10.1.2.3",
            "192.168.0.5",
            "172.16.0.1",
            "[::1]",
            "metadata.internal",
        ]);
        for address in [
            "https://localhost/x",
            "https://127.0.0.1/x",
            "https://10.1.2.3/x",
            "https://192.168.0.5/x",
            "https://172.16.0.1/x",
            "https://[::1]/x",
            "https://metadata.internal/x",
        ] {
            assert!(
                matches!(policy.check(address), Err(UnsafeEndpoint::PrivateHost(_))),
                "{address}"
            );
        }
    }
}
