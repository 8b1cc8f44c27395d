//! Per-agent TLS chain: a fresh root CA and two leaf certificates.

use std::net::IpAddr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Datelike, Duration, Utc};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, Ia5String, IsCa, KeyPair, KeyUsagePurpose, PKCS_RSA_SHA256,
    SanType, SerialNumber,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use super::{CryptoSettings, MintError, generate_rsa, private_pem, random_bytes};
use crate::domain::error::CryptoError;

/// Last year a certificate date can be encoded in.
const MAX_CERT_YEAR: i32 = 9999;

/// Protocols that get a certificate chain.
pub const TLS_PROTOCOLS: &[&str] = &["https", "wss"];

/// One agent's request for a connection certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub agent: String,
    pub proto: String,
    /// Host placed in the leaf SANs. IP literal or DNS name.
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCert {
    pub cert: String,
    pub key: String,
    pub spki_pin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaRoot {
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCertBundle {
    pub server_cert: IssuedCert,
    pub client_cert: IssuedCert,
    pub ca_root: CaRoot,
}

impl ConnectionCertBundle {
    /// What the remote agent needs to serve TLS and pin its peer: its server
    /// identity, the client pin and the CA certificate. Never the CA key or
    /// the client key.
    #[must_use]
    pub fn directive_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            "server_cert".to_string(),
            json!({
                "cert": self.server_cert.cert,
                "key": self.server_cert.key,
                "spki_pin": self.server_cert.spki_pin,
            }),
        );
        fields.insert(
            "client_spki_pin".to_string(),
            Value::String(self.client_cert.spki_pin.clone()),
        );
        fields.insert("ca_root".to_string(), json!({ "cert": self.ca_root.cert }));
        fields
    }
}

/// Mints a chain for every request whose protocol is in [`TLS_PROTOCOLS`].
/// Other requests yield `None` at the same position.
///
/// # Errors
///
/// Returns the first [`MintError`]; nothing minted for earlier requests is
/// returned in that case.
pub fn connection_cert_factory(
    requests: &[ConnectionRequest],
    settings: &CryptoSettings,
    now: DateTime<Utc>,
) -> Result<Vec<Option<ConnectionCertBundle>>, MintError> {
    requests
        .iter()
        .enumerate()
        .map(|(index, request)| {
            if !TLS_PROTOCOLS.contains(&request.proto.as_str()) {
                return Ok(None);
            }
            tracing::debug!(agent = %request.agent, proto = %request.proto, host = %request.host, "minting connection cert chain");
            mint_chain(request, settings, now)
                .map(Some)
                .map_err(|source| MintError {
                    index,
                    agent: request.agent.clone(),
                    source,
                })
        })
        .collect()
}

fn mint_chain(
    request: &ConnectionRequest,
    settings: &CryptoSettings,
    now: DateTime<Utc>,
) -> Result<ConnectionCertBundle, CryptoError> {
    let (ca_key, ca_key_pem) = key_pair(settings.ca_bits)?;
    let mut ca_params = base_params(&format!("{} root CA", request.agent), now, settings)?;
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    let ca_cert = ca_params.self_signed(&ca_key).map_err(cert_error)?;

    let san = subject_alt_name(&request.host)?;
    let server_cert = issue_leaf(request, "server", &san, &ca_cert, &ca_key, settings, now)?;
    let client_cert = issue_leaf(request, "client", &san, &ca_cert, &ca_key, settings, now)?;

    Ok(ConnectionCertBundle {
        server_cert,
        client_cert,
        ca_root: CaRoot {
            cert: ca_cert.pem(),
            key: ca_key_pem,
        },
    })
}

fn issue_leaf(
    request: &ConnectionRequest,
    role: &str,
    san: &SanType,
    ca_cert: &Certificate,
    ca_key: &KeyPair,
    settings: &CryptoSettings,
    now: DateTime<Utc>,
) -> Result<IssuedCert, CryptoError> {
    let (leaf_key, leaf_key_pem) = key_pair(settings.leaf_bits)?;
    let mut params = base_params(&format!("{} {role}", request.agent), now, settings)?;
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];
    params.subject_alt_names = vec![san.clone()];

    let cert = params
        .signed_by(&leaf_key, ca_cert, ca_key)
        .map_err(cert_error)?;
    Ok(IssuedCert {
        spki_pin: spki_pin(cert.der())?,
        cert: cert.pem(),
        key: leaf_key_pem,
    })
}

fn key_pair(bits: usize) -> Result<(KeyPair, String), CryptoError> {
    let pem = private_pem(&generate_rsa(bits)?)?;
    let pair = KeyPair::from_pem_and_sign_algo(&pem, &PKCS_RSA_SHA256).map_err(cert_error)?;
    Ok((pair, pem))
}

fn base_params(
    common_name: &str,
    now: DateTime<Utc>,
    settings: &CryptoSettings,
) -> Result<CertificateParams, CryptoError> {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, "swarm");
    params.distinguished_name = dn;

    let mut serial = random_bytes::<16>()?;
    serial[0] &= 0x7f;
    params.serial_number = Some(SerialNumber::from_slice(&serial));

    let expires = Duration::try_days(i64::from(settings.validity_days))
        .and_then(|validity| now.checked_add_signed(validity))
        .filter(|at| at.year() <= MAX_CERT_YEAR)
        .ok_or_else(|| CryptoError::Malformed {
            field: "validity_days",
            reason: format!("{} days from {now} is out of range", settings.validity_days),
        })?;
    params.not_before = rcgen::date_time_ymd(now.year(), month(now), day(now));
    params.not_after = rcgen::date_time_ymd(expires.year(), month(expires), day(expires));
    Ok(params)
}

fn month(at: DateTime<Utc>) -> u8 {
    u8::try_from(at.month()).unwrap_or(1)
}

fn day(at: DateTime<Utc>) -> u8 {
    u8::try_from(at.day()).unwrap_or(1)
}

/// IP literal when the host parses as one, DNS name otherwise.
fn subject_alt_name(host: &str) -> Result<SanType, CryptoError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SanType::IpAddress(ip));
    }
    Ia5String::try_from(host)
        .map(SanType::DnsName)
        .map_err(cert_error)
}

/// `base64(SHA-256(SubjectPublicKeyInfo DER))` of a DER certificate.
///
/// # Errors
///
/// Returns [`CryptoError::CertificateParse`] if `der` is not a certificate.
pub fn spki_pin(der: &[u8]) -> Result<String, CryptoError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| CryptoError::CertificateParse(e.to_string()))?;
    let digest = Sha256::digest(cert.tbs_certificate.subject_pki.raw);
    Ok(STANDARD.encode(digest))
}

#[allow(clippy::needless_pass_by_value)]
fn cert_error(e: rcgen::Error) -> CryptoError {
    CryptoError::Certificate(e.to_string())
}
