//! DNS-backed checks: `emailDNS` and `urlActive`
//!
//! Lookups go through [`DnsResolver`] so callers can swap the blocking system
//! resolver for something else. A lookup that exceeds the configured timeout is a
//! rule failure, never a fatal error.

use super::network::{accepted_url, is_email};
use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use serde_json::Value;
use std::collections::HashSet;
use std::net::ToSocketAddrs;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("emailDNS", Arity::Exact(0), email_dns);
    registry.register_fn("urlActive", Arity::Exact(0), url_active);
}

/// Answers whether a host name has address records
///
/// `emailDNS` asks [`DnsResolver::accepts_mail`], which by default falls back to
/// the address lookup. A resolver that can see MX records should override it so
/// that domains with mail exchangers but no address records pass.
pub trait DnsResolver: Send + Sync {
    fn resolves(&self, host: &str, timeout: Duration) -> Result<bool, PredicateError>;

    /// Whether a domain can receive mail
    fn accepts_mail(&self, domain: &str, timeout: Duration) -> Result<bool, PredicateError> {
        self.resolves(domain, timeout)
    }
}

/// Resolver backed by the operating system
///
/// Each lookup runs on its own thread; the caller stops waiting once the timeout
/// expires. The system lookup only returns A and AAAA records, so a domain that
/// publishes nothing but MX records fails `emailDNS` here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl DnsResolver for SystemResolver {
    fn resolves(&self, host: &str, timeout: Duration) -> Result<bool, PredicateError> {
        let host = host.trim_end_matches('.').to_string();
        let (sender, receiver) = mpsc::channel();
        let target = host.clone();
        thread::spawn(move || {
            let found = (target.as_str(), 0)
                .to_socket_addrs()
                .map(|mut addresses| addresses.next().is_some())
                .unwrap_or(false);
            // The receiver is gone when the lookup outlived its timeout
            let _ = sender.send(found);
        });

        receiver
            .recv_timeout(timeout)
            .map_err(|_| PredicateError::Timeout {
                host,
                timeout_ms: timeout.as_millis(),
            })
    }
}

/// Resolver answering from a fixed host list, for offline use and tests
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashSet<String>,
    mail_hosts: HashSet<String>,
    unreachable: bool,
}

fn normalise_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

impl StaticResolver {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(|host| normalise_host(&host.into())).collect(),
            ..Self::default()
        }
    }

    /// Add domains that only have mail exchangers
    pub fn with_mail_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mail_hosts
            .extend(hosts.into_iter().map(|host| normalise_host(&host.into())));
        self
    }

    /// Resolver whose every lookup times out
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }
}

impl StaticResolver {
    fn reachable(&self, host: &str, timeout: Duration) -> Result<String, PredicateError> {
        if self.unreachable {
            return Err(PredicateError::Timeout {
                host: host.to_string(),
                timeout_ms: timeout.as_millis(),
            });
        }
        Ok(normalise_host(host))
    }
}

impl DnsResolver for StaticResolver {
    fn resolves(&self, host: &str, timeout: Duration) -> Result<bool, PredicateError> {
        let host = self.reachable(host, timeout)?;
        Ok(self.hosts.contains(&host))
    }

    fn accepts_mail(&self, domain: &str, timeout: Duration) -> Result<bool, PredicateError> {
        let domain = self.reachable(domain, timeout)?;
        Ok(self.hosts.contains(&domain) || self.mail_hosts.contains(&domain))
    }
}

/// Valid e-mail syntax and a domain that accepts mail
pub fn email_dns(
    ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    let Some(address) = value.as_str().filter(|address| is_email(address)) else {
        return Ok(Truth::Bool(false));
    };
    let domain = address.rsplit_once('@').map_or("", |(_, domain)| domain);
    ctx.dns.accepts_mail(domain, ctx.dns_timeout).map(Truth::Bool)
}

/// Accepted URL whose host resolves
pub fn url_active(
    ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    let host = value
        .as_str()
        .and_then(|text| accepted_url(text, ctx.url_prefixes))
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
    match host {
        Some(host) => ctx.dns.resolves(&host, ctx.dns_timeout).map(Truth::Bool),
        None => Ok(Truth::Bool(false)),
    }
}
