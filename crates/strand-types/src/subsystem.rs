//! Subsystems brought up by the bootstrap, in bring-up order.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    StorageNetwork,
    Database,
    Wallet,
    LocalDaemon,
}

impl Subsystem {
    /// All subsystems in the order they are brought up.
    pub const ALL: [Subsystem; 4] = [
        Subsystem::StorageNetwork,
        Subsystem::Database,
        Subsystem::Wallet,
        Subsystem::LocalDaemon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StorageNetwork => "storage_network",
            Self::Database => "database",
            Self::Wallet => "wallet",
            Self::LocalDaemon => "local_daemon",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for subsystem in Subsystem::ALL {
            let json = serde_json::to_value(subsystem).expect("serialize");
            assert_eq!(json, subsystem.to_string());
        }
    }
}
