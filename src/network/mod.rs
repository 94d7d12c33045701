// Network parameters

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Chains a block archive can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Test,
    Signet,
    Regtest,
}

impl Network {
    pub const ALL: [Network; 4] = [Network::Main, Network::Test, Network::Signet, Network::Regtest];

    /// Magic bytes opening every block record, read big-endian
    pub fn magic(self) -> u32 {
        match self {
            Network::Main => 0xf9beb4d9,
            Network::Test => 0x0b110907,
            Network::Signet => 0x0a03cf40,
            Network::Regtest => 0xfabfb5da,
        }
    }

    /// Subdirectory of the data directory holding this network's files
    pub fn dir_name(self) -> &'static str {
        match self {
            Network::Main => "",
            Network::Test => "testnet3",
            Network::Signet => "signet",
            Network::Regtest => "regtest",
        }
    }

    /// The network whose magic bytes equal `magic`
    pub fn from_magic(magic: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.magic() == magic)
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Signet => "signet",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.name() == s)
            .ok_or_else(|| format!("Unsupported network \"{}\"", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_lookup() {
        for network in Network::ALL {
            assert_eq!(Network::from_magic(network.magic()), Some(network));
        }
        assert_eq!(Network::from_magic(0), None);
    }

    #[test]
    fn test_magic_bytes_on_disk() {
        // mainnet records start with f9 be b4 d9
        assert_eq!(Network::Main.magic().to_be_bytes(), [0xf9, 0xbe, 0xb4, 0xd9]);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!("signet".parse::<Network>(), Ok(Network::Signet));
        assert_eq!(Network::Test.to_string(), "test");
        assert!("mainnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_dir_names() {
        assert_eq!(Network::Main.dir_name(), "");
        assert_eq!(Network::Test.dir_name(), "testnet3");
    }
}
