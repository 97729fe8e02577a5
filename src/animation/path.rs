use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, RigError};

/// Address of an animated property: `<node-path>` or
/// `<node-path>:<bone-or-property>`.
///
/// Examples: `Body_ArmatureNode:Hip`, `Lamp`, `Face:blend_shapes/Smile`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPath {
    pub node: String,
    pub subname: Option<String>,
}

impl TrackPath {
    #[must_use]
    pub fn node(node: &str) -> Self {
        Self {
            node: node.to_string(),
            subname: None,
        }
    }

    #[must_use]
    pub fn bone(skeleton_path: &str, bone: &str) -> Self {
        Self {
            node: skeleton_path.to_string(),
            subname: Some(bone.to_string()),
        }
    }

    #[must_use]
    pub fn blend_shape(node: &str, shape: &str) -> Self {
        Self {
            node: node.to_string(),
            subname: Some(format!("blend_shapes/{shape}")),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let (node, subname) = match text.split_once(':') {
            Some((node, sub)) => (node, Some(sub)),
            None => (text, None),
        };
        if node.is_empty() || subname.is_some_and(str::is_empty) {
            return Err(RigError::InvalidTrackPath(text.to_string()));
        }
        Ok(Self {
            node: node.to_string(),
            subname: subname.map(str::to_string),
        })
    }
}

impl FromStr for TrackPath {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TrackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subname {
            Some(sub) => write!(f, "{}:{}", self.node, sub),
            None => f.write_str(&self.node),
        }
    }
}
