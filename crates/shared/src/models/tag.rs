use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagFlag {
    Tee,
    Scone,
    Gramine,
    Gpu,
}

impl fmt::Display for TagFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFlag::Tee => write!(f, "tee"),
            TagFlag::Scone => write!(f, "scone"),
            TagFlag::Gramine => write!(f, "gramine"),
            TagFlag::Gpu => write!(f, "gpu"),
        }
    }
}

/// Capability flags carried by an order. Serialized as the marketplace's
/// lowercase tag list, e.g. `["tee", "scone"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag(BTreeSet<TagFlag>);

impl Tag {
    pub fn new(flags: impl IntoIterator<Item = TagFlag>) -> Self {
        Self(flags.into_iter().collect())
    }

    /// The confidential-enclave tag pair required on matched app and
    /// workerpool orders in this workflow.
    pub fn tee_scone() -> Self {
        Self::new([TagFlag::Tee, TagFlag::Scone])
    }

    pub fn contains(&self, flag: TagFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for flag in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{flag}")?;
            first = false;
        }
        Ok(())
    }
}
