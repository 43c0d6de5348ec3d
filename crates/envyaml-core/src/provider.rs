//! Computed value providers
//!
//! Providers produce values that do not come from the environment, such as
//! the host's name or the address of a network interface. A policy binds
//! each provider to the placeholder name it answers.

use std::net::IpAddr;

use crate::error::TokenErrorKind;

/// Outcome of a provider lookup
pub type ProviderResult = std::result::Result<String, TokenErrorKind>;

/// Trait for computed value providers
pub trait Provider: Send + Sync {
    /// Compute the value
    fn provide(&self) -> ProviderResult;

    /// Get the name of this provider (for logs)
    fn name(&self) -> &str;
}

/// A simple function-based provider
pub struct FnProvider<F>
where
    F: Fn() -> ProviderResult + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnProvider<F>
where
    F: Fn() -> ProviderResult + Send + Sync,
{
    /// Create a new function-based provider
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Provider for FnProvider<F>
where
    F: Fn() -> ProviderResult + Send + Sync,
{
    fn provide(&self) -> ProviderResult {
        (self.func)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// The name the host reports for itself
#[derive(Debug, Clone, Copy, Default)]
pub struct HostnameProvider;

impl Provider for HostnameProvider {
    fn provide(&self) -> ProviderResult {
        let host = gethostname::gethostname()
            .into_string()
            .map_err(|_| TokenErrorKind::HostnameUnavailable)?;
        if host.is_empty() {
            return Err(TokenErrorKind::HostnameUnavailable);
        }
        log::trace!("Host reports hostname {}", host);
        Ok(host)
    }

    fn name(&self) -> &str {
        "hostname"
    }
}

/// The first IPv4 address of a named network interface
#[derive(Debug, Clone)]
pub struct InterfaceAddrProvider {
    interface: String,
}

impl InterfaceAddrProvider {
    /// Create a provider for the given interface (e.g. "eth0")
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    /// The interface this provider reads
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl Provider for InterfaceAddrProvider {
    fn provide(&self) -> ProviderResult {
        let interfaces = if_addrs::get_if_addrs().map_err(|e| TokenErrorKind::Provider {
            provider: self.name().to_string(),
            message: format!("getting interfaces: {}", e),
        })?;
        log::trace!(
            "Found {} interface addresses while looking for {}",
            interfaces.len(),
            self.interface
        );
        first_ipv4(
            &self.interface,
            interfaces.iter().map(|iface| (iface.name.as_str(), iface.ip())),
        )
    }

    fn name(&self) -> &str {
        "interface"
    }
}

/// Pick the first IPv4 address listed for `interface`
///
/// `addrs` yields one `(interface name, address)` pair per configured
/// address, in system order.
fn first_ipv4<'a>(
    interface: &str,
    addrs: impl IntoIterator<Item = (&'a str, IpAddr)>,
) -> ProviderResult {
    let mut seen = false;
    for (name, addr) in addrs {
        if name != interface {
            continue;
        }
        seen = true;
        if let IpAddr::V4(v4) = addr {
            return Ok(v4.to_string());
        }
    }

    if seen {
        Err(TokenErrorKind::NoIpv4Address {
            interface: interface.to_string(),
        })
    } else {
        Err(TokenErrorKind::InterfaceNotFound {
            interface: interface.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_first_ipv4_skips_other_interfaces_and_v6() {
        let addrs = vec![
            ("lo", v4(127, 0, 0, 1)),
            ("eth0", IpAddr::V6(Ipv6Addr::LOCALHOST)),
            ("eth0", v4(10, 0, 0, 5)),
            ("eth0", v4(10, 0, 0, 6)),
        ];
        assert_eq!(first_ipv4("eth0", addrs), Ok("10.0.0.5".to_string()));
    }

    #[test]
    fn test_first_ipv4_interface_missing() {
        let addrs = vec![("lo", v4(127, 0, 0, 1))];
        assert_eq!(
            first_ipv4("eth0", addrs),
            Err(TokenErrorKind::InterfaceNotFound {
                interface: "eth0".into()
            })
        );
    }

    #[test]
    fn test_first_ipv4_only_v6() {
        let addrs = vec![("eth0", IpAddr::V6(Ipv6Addr::LOCALHOST))];
        assert_eq!(
            first_ipv4("eth0", addrs),
            Err(TokenErrorKind::NoIpv4Address {
                interface: "eth0".into()
            })
        );
    }

    #[test]
    fn test_fn_provider() {
        let provider = FnProvider::new("fixed", || Ok("10.1.2.3".to_string()));

        assert_eq!(provider.name(), "fixed");
        assert_eq!(provider.provide(), Ok("10.1.2.3".to_string()));
    }

    #[test]
    fn test_hostname_provider_returns_something() {
        // Every test host has a non-empty hostname
        let host = HostnameProvider.provide().unwrap();
        assert!(!host.is_empty());
    }

    #[test]
    fn test_interface_provider_unknown_interface() {
        let provider = InterfaceAddrProvider::new("envyaml-no-such-if0");

        assert_eq!(provider.interface(), "envyaml-no-such-if0");
        assert!(matches!(
            provider.provide(),
            Err(TokenErrorKind::InterfaceNotFound { .. }) | Err(TokenErrorKind::Provider { .. })
        ));
    }
}
