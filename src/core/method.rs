//! Operation kinds and validation lifecycle groups

use serde::{Deserialize, Serialize};
use std::fmt;

/// The operation kinds a resource can expose
///
/// Every generated route is bound to exactly one method. The serialized form
/// is camelCase (`readOne`, `readMany`, ...) so YAML resource definitions can
/// use the same keys as the route options map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    Create,
    ReadOne,
    ReadMany,
    Search,
    Update,
    Upsert,
    Delete,
    Recover,
}

impl Method {
    /// All methods, in route registration order
    pub const ALL: [Method; 8] = [
        Method::Create,
        Method::ReadOne,
        Method::ReadMany,
        Method::Search,
        Method::Update,
        Method::Upsert,
        Method::Delete,
        Method::Recover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Create => "create",
            Method::ReadOne => "readOne",
            Method::ReadMany => "readMany",
            Method::Search => "search",
            Method::Update => "update",
            Method::Upsert => "upsert",
            Method::Delete => "delete",
            Method::Recover => "recover",
        }
    }

    /// The validation group used for payloads of this method
    pub fn group(&self) -> Group {
        match self {
            Method::Create => Group::Create,
            Method::ReadOne => Group::ReadOne,
            Method::ReadMany => Group::ReadMany,
            Method::Search => Group::Search,
            Method::Update => Group::Update,
            Method::Upsert => Group::Upsert,
            Method::Delete | Method::Recover => Group::Params,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle group selecting which declared rules apply to a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Group {
    Create,
    Update,
    Upsert,
    ReadOne,
    ReadMany,
    Search,
    Params,
}
