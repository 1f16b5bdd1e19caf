//! Final disk image codec selection.

use crate::bundler::Error;
use std::fmt;
use std::str::FromStr;

/// Compressed, read-only codecs accepted for the distributed image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmgFormat {
    /// LZFSE compression, readable on macOS 10.11 and later.
    Ulfo,
    /// zlib compression, readable everywhere.
    Udzo,
}

impl DmgFormat {
    /// Minor version from which LZFSE images can be mounted.
    const ULFO_MIN_MINOR: u32 = 11;

    /// Picks the codec for an app's `LSMinimumSystemVersion`.
    ///
    /// Only the minor component is compared: `10.11` and above select ULFO.
    /// A missing or unparsable minor component counts as `0`.
    pub fn for_minimum_system_version(version: &str) -> Self {
        let minor = version
            .split('.')
            .nth(1)
            .and_then(|m| m.trim().parse::<u32>().ok())
            .unwrap_or(0);

        if minor >= Self::ULFO_MIN_MINOR {
            DmgFormat::Ulfo
        } else {
            DmgFormat::Udzo
        }
    }

    /// Name passed to `hdiutil -format`.
    pub fn as_str(self) -> &'static str {
        match self {
            DmgFormat::Ulfo => "ULFO",
            DmgFormat::Udzo => "UDZO",
        }
    }
}

impl fmt::Display for DmgFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DmgFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ULFO" => Ok(DmgFormat::Ulfo),
            "UDZO" => Ok(DmgFormat::Udzo),
            other => Err(Error::InvalidFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lzfse_from_minor_eleven() {
        assert_eq!(DmgFormat::for_minimum_system_version("10.11"), DmgFormat::Ulfo);
        assert_eq!(DmgFormat::for_minimum_system_version("10.15.7"), DmgFormat::Ulfo);
    }

    #[test]
    fn zlib_below_minor_eleven() {
        assert_eq!(DmgFormat::for_minimum_system_version("10.10"), DmgFormat::Udzo);
        assert_eq!(DmgFormat::for_minimum_system_version("10.9.5"), DmgFormat::Udzo);
    }

    #[test]
    fn only_the_minor_component_counts() {
        assert_eq!(DmgFormat::for_minimum_system_version("11.0"), DmgFormat::Udzo);
        assert_eq!(DmgFormat::for_minimum_system_version("12"), DmgFormat::Udzo);
        assert_eq!(DmgFormat::for_minimum_system_version("10.x"), DmgFormat::Udzo);
        assert_eq!(DmgFormat::for_minimum_system_version(""), DmgFormat::Udzo);
    }

    #[test]
    fn parses_only_known_codecs() {
        assert_eq!("ULFO".parse::<DmgFormat>().unwrap(), DmgFormat::Ulfo);
        assert_eq!("UDZO".parse::<DmgFormat>().unwrap(), DmgFormat::Udzo);
        assert!(matches!("UDRW".parse::<DmgFormat>(), Err(Error::InvalidFormat(_))));
        assert_eq!(DmgFormat::Ulfo.to_string(), "ULFO");
    }
}
