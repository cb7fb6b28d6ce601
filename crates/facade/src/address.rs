//! External point addresses.
//!
//! An address has the shape `scheme://case/point`, where `case` and `point`
//! match `[A-Za-z0-9_.-]+`. The case segment must name the case this
//! facade serves, either by test case name or by case identifier.

use crate::FacadeError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*)://([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$")
        .expect("is valid pattern")
});

/// A parsed external address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointAddress {
    raw: String,
    scheme_end: usize,
    case_end: usize,
}

impl PointAddress {
    /// Parse an address without checking it against any case.
    pub fn parse(raw: &str) -> Result<Self, FacadeError> {
        let captures = ADDRESS_PATTERN
            .captures(raw)
            .ok_or_else(|| FacadeError::invalid_address(raw, "expected scheme://case/point"))?;

        let scheme = captures.get(1).map_or(0, |m| m.end());
        let case = captures.get(2).map_or(0, |m| m.end());
        Ok(Self {
            raw: raw.to_string(),
            scheme_end: scheme,
            case_end: case,
        })
    }

    /// The scheme, e.g. `boptest`.
    pub fn scheme(&self) -> &str {
        &self.raw[..self.scheme_end]
    }

    /// The case segment.
    pub fn case(&self) -> &str {
        &self.raw[self.scheme_end + 3..self.case_end]
    }

    /// The bare internal point name.
    pub fn point(&self) -> &str {
        &self.raw[self.case_end + 1..]
    }

    /// The address exactly as the caller wrote it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validates addresses for one case and builds addresses for its points.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    scheme: String,
    case_name: String,
    case_id: String,
}

impl AddressResolver {
    /// Create a resolver for the given scheme and case.
    pub fn new(
        scheme: impl Into<String>,
        case_name: impl Into<String>,
        case_id: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            case_name: case_name.into(),
            case_id: case_id.into(),
        }
    }

    /// Parse an address and check it belongs to this case.
    pub fn resolve(&self, raw: &str) -> Result<PointAddress, FacadeError> {
        let address = PointAddress::parse(raw)?;
        if address.scheme() != self.scheme {
            return Err(FacadeError::invalid_address(
                raw,
                format!("scheme must be '{}'", self.scheme),
            ));
        }
        if address.case() != self.case_name && address.case() != self.case_id {
            return Err(FacadeError::invalid_address(
                raw,
                format!("case must be '{}' or '{}'", self.case_name, self.case_id),
            ));
        }
        Ok(address)
    }

    /// External address for an internal point name.
    pub fn external(&self, point: &str) -> String {
        format!("{}://{}/{}", self.scheme, self.case_name, point)
    }

    /// The scheme addresses must use.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AddressResolver {
        AddressResolver::new("sim", "bestest_air", "61df7871-dabe-4383-805a-50413c991b85")
    }

    #[test]
    fn test_parse_segments() {
        let address = PointAddress::parse("sim://bestest_air/zon_reaTRooAir_y").unwrap();
        assert_eq!(address.scheme(), "sim");
        assert_eq!(address.case(), "bestest_air");
        assert_eq!(address.point(), "zon_reaTRooAir_y");
        assert_eq!(address.as_str(), "sim://bestest_air/zon_reaTRooAir_y");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "",
            "zon_reaTRooAir_y",
            "sim://bestest_air",
            "sim://bestest_air/",
            "sim:///zon_reaTRooAir_y",
            "sim://bestest_air/zone/temp",
            "sim://best est/zon",
            "://bestest_air/zon",
            "sim:/bestest_air/zon",
            "sim://bestest_air/zon?x=1",
        ] {
            assert!(
                matches!(
                    PointAddress::parse(raw),
                    Err(FacadeError::InvalidAddress { .. })
                ),
                "accepted malformed address {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_resolve_checks_scheme_and_case() {
        let resolver = resolver();
        assert!(resolver.resolve("sim://bestest_air/zon_reaTRooAir_y").is_ok());
        assert!(resolver
            .resolve("sim://61df7871-dabe-4383-805a-50413c991b85/zon_reaTRooAir_y")
            .is_ok());
        assert!(resolver.resolve("bos://bestest_air/zon_reaTRooAir_y").is_err());
        assert!(resolver.resolve("sim://bestest_hydronic/zon_reaTRooAir_y").is_err());
    }

    #[test]
    fn test_external_round_trip() {
        let resolver = resolver();
        let external = resolver.external("oveTSetHea_u");
        assert_eq!(external, "sim://bestest_air/oveTSetHea_u");
        assert_eq!(resolver.resolve(&external).unwrap().point(), "oveTSetHea_u");
    }
}
