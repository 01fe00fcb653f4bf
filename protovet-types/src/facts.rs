use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which side of the protocol originates a method or notification.
///
/// Derived from membership in the client-side and server-side union
/// declarations of the schema. A shape found in neither union is `Unknown`
/// and stays visible in every downstream report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ClientToServer,
    ServerToClient,
    Bidirectional,
    Unknown,
}

impl Direction {
    /// Direction from the two independent union-membership tests.
    pub fn from_membership(in_client: bool, in_server: bool) -> Self {
        match (in_client, in_server) {
            (true, true) => Direction::Bidirectional,
            (true, false) => Direction::ClientToServer,
            (false, true) => Direction::ServerToClient,
            (false, false) => Direction::Unknown,
        }
    }

    pub fn requires_client_method(self) -> bool {
        matches!(self, Direction::ClientToServer | Direction::Bidirectional)
    }

    pub fn requires_server_method(self) -> bool {
        matches!(self, Direction::ServerToClient | Direction::Bidirectional)
    }

    /// Client-side handler registration is only required for pure
    /// server-to-client methods.
    pub fn requires_client_handler(self) -> bool {
        matches!(self, Direction::ServerToClient)
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::ClientToServer => "client_to_server",
            Direction::ServerToClient => "server_to_client",
            Direction::Bidirectional => "bidirectional",
            Direction::Unknown => "unknown",
        }
    }
}

/// A protocol request method as declared by the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodFact {
    /// The request type that carries the method constant.
    pub request_type: String,
    pub direction: Direction,
}

/// A protocol notification as declared by the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFact {
    /// The notification type that carries the method constant.
    pub notification_type: String,
    pub direction: Direction,
}

/// Capability properties for one side: property -> nested property -> scalar type.
pub type CapabilityMap = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFacts {
    pub client: CapabilityMap,
    pub server: CapabilityMap,
}

/// Canonical facts extracted from one schema version.
///
/// Immutable per run; all collections are ordered maps/sets so extraction
/// order never leaks into output. Enum case lists are sorted for stable
/// diffing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFacts {
    pub types: BTreeSet<String>,
    pub enums: BTreeMap<String, Vec<String>>,
    pub error_codes: BTreeMap<String, i64>,
    pub capabilities: CapabilityFacts,
    pub methods: BTreeMap<String, MethodFact>,
    pub notifications: BTreeMap<String, NotificationFact>,
    /// Deprecated type -> schema description.
    pub deprecated: BTreeMap<String, String>,
}
