//! Strong type definitions for the Wear Data bridge.
//!
//! Identifiers and filter modes are newtypes so a path can't be passed where
//! a node id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// URI scheme used by data items.
pub const WEAR_SCHEME: &str = "wear";

/// Identity of a node (phone or wearable) in the data layer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from an opaque string.
    ///
    /// Node ids appear as the URI authority, so they must be non-empty and
    /// must not contain `/`.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() || id.contains('/') {
            return Err(CoreError::InvalidNodeId(id));
        }
        Ok(Self(id))
    }

    /// Derive a node id from raw bytes (lowercase hex).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a data item: `wear://<node>/<path>`, or a bare `/<path>` when
/// the node is left for the transport to decide.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataUri {
    node: Option<NodeId>,
    path: String,
}

impl DataUri {
    /// Build a uri from parts. `path` must start with `/`.
    pub fn new(node: Option<NodeId>, path: impl Into<String>) -> Result<Self, CoreError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(CoreError::InvalidUri(format!("path must start with '/': {path}")));
        }
        Ok(Self { node, path })
    }

    /// Parse `wear://node/path` or `/path`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.starts_with('/') {
            return Self::new(None, s);
        }

        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| CoreError::InvalidUri(s.to_string()))?;
        if scheme != WEAR_SCHEME {
            return Err(CoreError::InvalidUri(format!("unsupported scheme: {scheme}")));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, "/"),
        };
        let node = if authority.is_empty() {
            None
        } else {
            Some(NodeId::new(authority).map_err(|_| CoreError::InvalidUri(s.to_string()))?)
        };
        Self::new(node, path)
    }

    pub fn node(&self) -> Option<&NodeId> {
        self.node.as_ref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return this uri with its node filled in, unless it already has one.
    pub fn with_default_node(&self, node: &NodeId) -> Self {
        Self {
            node: Some(self.node.clone().unwrap_or_else(|| node.clone())),
            path: self.path.clone(),
        }
    }

    /// Whether `self` (a concrete item uri) is selected by `pattern`.
    ///
    /// A pattern without a node matches items on every node. Literal
    /// matching compares paths exactly; prefix matching selects the pattern
    /// path and everything below it on `/` boundaries.
    pub fn matches(&self, pattern: &DataUri, mode: MatchMode) -> bool {
        if let Some(node) = &pattern.node {
            if self.node.as_ref() != Some(node) {
                return false;
            }
        }
        match mode {
            MatchMode::Literal => self.path == pattern.path,
            MatchMode::Prefix => {
                let prefix = pattern.path.trim_end_matches('/');
                prefix.is_empty()
                    || self.path == prefix
                    || self
                        .path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "{WEAR_SCHEME}://{node}{}", self.path),
            None => write!(f, "{WEAR_SCHEME}://{}", self.path),
        }
    }
}

impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataUri({self})")
    }
}

impl FromStr for DataUri {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Filter mode for get/delete, exactly as the transport encodes it.
///
/// The integer is passed through untouched; [`FilterMode::match_mode`]
/// interprets the two values this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMode(pub i32);

impl FilterMode {
    /// Exact uri match.
    pub const LITERAL: Self = Self(0);
    /// Match the uri path and everything below it.
    pub const PREFIX: Self = Self(1);

    pub fn match_mode(self) -> Option<MatchMode> {
        match self {
            Self::LITERAL => Some(MatchMode::Literal),
            Self::PREFIX => Some(MatchMode::Prefix),
            _ => None,
        }
    }
}

impl Default for FilterMode {
    fn default() -> Self {
        Self::LITERAL
    }
}

/// Interpreted form of a known [`FilterMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Literal,
    Prefix,
}
