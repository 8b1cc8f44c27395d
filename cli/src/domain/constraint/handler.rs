//! Compile-time registration table mapping constraint classes to handlers.

use serde_json::{Map, Value};
use swarm_common::RegistryObject;

use crate::domain::path::ConfigPath;

// ── Autogen handlers ──────────────────────────────────────────────────────────

/// The three capabilities the crypto factory satisfies without operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutogenKind {
    PacketSigning,
    ConnectionCert,
    SymmetricEncryption,
}

impl AutogenKind {
    /// Key under `certs[universal_id]` holding the full private bundle.
    #[must_use]
    pub fn cert_path(self) -> ConfigPath {
        match self {
            Self::PacketSigning => ConfigPath::new(["signing"]),
            Self::ConnectionCert => ConfigPath::new(["connection_cert"]),
            Self::SymmetricEncryption => ConfigPath::new(["symmetric_encryption"]),
        }
    }

    /// Where the resolved settings nest in the node's output tree. Empty for
    /// connection certs, which only feed the connection block.
    #[must_use]
    pub fn config_path(self) -> ConfigPath {
        match self {
            Self::PacketSigning => ConfigPath::dotted("config.security.signing"),
            Self::ConnectionCert => ConfigPath::default(),
            Self::SymmetricEncryption => ConfigPath::dotted("config.security.symmetric_encryption"),
        }
    }

    /// Constraint settings copied from `raw` into the directive. Minted
    /// material is filtered separately by its bundle type.
    #[must_use]
    pub fn settings_allow(self) -> &'static [&'static str] {
        match self {
            Self::PacketSigning => &["out", "in"],
            Self::ConnectionCert => &["proto", "host", "port", "allowlist_ips"],
            Self::SymmetricEncryption => &["type"],
        }
    }

    #[must_use]
    pub fn is_connection(self) -> bool {
        matches!(self, Self::ConnectionCert)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutogenHandler {
    pub class: &'static str,
    pub kind: AutogenKind,
    /// Protocol assumed when neither the constraint nor the node names one.
    pub default_proto: Option<&'static str>,
}

// ── Registry handlers ─────────────────────────────────────────────────────────

/// A handler backed by an operator-assigned registry object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryHandler {
    pub class: &'static str,
    /// Fields that must be present and non-empty for the object to validate.
    pub required_fields: &'static [&'static str],
    /// Fields that may reach the directive.
    pub directive_allow: &'static [&'static str],
    pub default_path: &'static [&'static str],
    /// Opt-in: resolved fields are also merged into the connection block.
    pub inject_into_connection: bool,
    pub is_connection: bool,
}

impl RegistryHandler {
    /// Checks the object against `required_fields`.
    ///
    /// # Errors
    ///
    /// Returns the list of missing or empty fields.
    pub fn is_validated(&self, object: &RegistryObject) -> Result<(), Vec<&'static str>> {
        let missing: Vec<&'static str> = self
            .required_fields
            .iter()
            .copied()
            .filter(|field| is_blank(object.fields.get(*field)))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Full private projection of the object.
    #[must_use]
    pub fn deploy_fields(&self, object: &RegistryObject) -> Map<String, Value> {
        object.fields.clone()
    }

    /// Redacted projection: only allow-listed fields.
    #[must_use]
    pub fn directive_fields(&self, object: &RegistryObject) -> Map<String, Value> {
        allow_listed(&object.fields, self.directive_allow)
    }

    /// The object's own path if it declares one, else the handler default.
    #[must_use]
    pub fn path(&self, object: &RegistryObject) -> ConfigPath {
        match &object.path {
            Some(path) if !path.is_empty() => ConfigPath::new(path.iter().cloned()),
            _ => ConfigPath::new(self.default_path.iter().copied()),
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

/// Copies the keys of `fields` named in `allow`.
#[must_use]
pub fn allow_listed(fields: &Map<String, Value>, allow: &[&str]) -> Map<String, Value> {
    allow
        .iter()
        .filter_map(|key| fields.get(*key).map(|v| ((*key).to_string(), v.clone())))
        .collect()
}

// ── Table ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Autogen(AutogenHandler),
    Registry(RegistryHandler),
}

impl Handler {
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::Autogen(h) => h.class,
            Self::Registry(h) => h.class,
        }
    }

    #[must_use]
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Autogen(h) => h.kind.is_connection(),
            Self::Registry(h) => h.is_connection,
        }
    }

    #[must_use]
    pub fn inject_into_connection(&self) -> bool {
        match self {
            Self::Autogen(_) => false,
            Self::Registry(h) => h.inject_into_connection,
        }
    }
}

const fn autogen(class: &'static str, kind: AutogenKind, default_proto: Option<&'static str>) -> Handler {
    Handler::Autogen(AutogenHandler {
        class,
        kind,
        default_proto,
    })
}

const fn registry(
    class: &'static str,
    required_fields: &'static [&'static str],
    directive_allow: &'static [&'static str],
    default_path: &'static [&'static str],
) -> RegistryHandler {
    RegistryHandler {
        class,
        required_fields,
        directive_allow,
        default_path,
        inject_into_connection: false,
        is_connection: false,
    }
}

pub static HANDLERS: &[Handler] = &[
    autogen("packet_signing", AutogenKind::PacketSigning, None),
    autogen("connection_cert", AutogenKind::ConnectionCert, None),
    autogen("https", AutogenKind::ConnectionCert, Some("https")),
    autogen("wss", AutogenKind::ConnectionCert, Some("wss")),
    autogen("symmetric_encryption", AutogenKind::SymmetricEncryption, None),
    Handler::Registry(registry(
        "discord",
        &["bot_token", "channel_id"],
        &["bot_token", "channel_id"],
        &["config", "discord"],
    )),
    Handler::Registry(registry(
        "telegram",
        &["bot_token", "chat_id"],
        &["bot_token", "chat_id"],
        &["config", "telegram"],
    )),
    Handler::Registry(registry(
        "slack",
        &["webhook_url"],
        &["webhook_url", "channel"],
        &["config", "slack"],
    )),
    Handler::Registry(registry(
        "webhook",
        &["url"],
        &["url", "method", "headers"],
        &["config", "webhook"],
    )),
    Handler::Registry(registry(
        "ssh",
        &["host", "username", "private_key"],
        &["host", "port", "username", "private_key"],
        &["config", "ssh"],
    )),
    Handler::Registry(RegistryHandler {
        inject_into_connection: true,
        ..registry(
            "smtp",
            &["smtp_server", "smtp_port", "username", "password"],
            &["smtp_server", "smtp_port", "username", "password", "from_address"],
            &["config", "email"],
        )
    }),
    Handler::Registry(registry(
        "openai",
        &["api_key"],
        &["api_key", "model"],
        &["config", "openai"],
    )),
];

#[must_use]
pub fn lookup(class: &str) -> Option<&'static Handler> {
    HANDLERS.iter().find(|h| h.class() == class)
}

/// Classifier result for one constraint class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_autogen: bool,
    pub has_handler: bool,
    pub is_connection: bool,
}

#[must_use]
pub fn classify(class: &str) -> Classification {
    match lookup(class) {
        None => Classification::default(),
        Some(handler) => Classification {
            is_autogen: matches!(handler, Handler::Autogen(_)),
            has_handler: true,
            is_connection: handler.is_connection(),
        },
    }
}
