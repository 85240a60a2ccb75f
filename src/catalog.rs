//! # Tag Catalog
//!
//! Maps the symbolic fields the station talks about to the controller's
//! protocol addresses. Addresses use the `ns=<namespace>;s=<name>` syntax and
//! are kept bit-exact, since existing controller programs are configured
//! against them.

use crate::error::LinkError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A named logical field on a line controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolicTag {
    StartOrder,
    OrderCode,
    OrderQuantity,
    OrderDate,
    MachineState,
}

impl SymbolicTag {
    pub const ALL: [SymbolicTag; 5] = [
        SymbolicTag::StartOrder,
        SymbolicTag::OrderCode,
        SymbolicTag::OrderQuantity,
        SymbolicTag::OrderDate,
        SymbolicTag::MachineState,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SymbolicTag::StartOrder => "start-order-number",
            SymbolicTag::OrderCode => "order-code",
            SymbolicTag::OrderQuantity => "order-quantity",
            SymbolicTag::OrderDate => "order-date",
            SymbolicTag::MachineState => "machine-state",
        }
    }
}

impl fmt::Display for SymbolicTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymbolicTag {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymbolicTag::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| LinkError::UnknownTag(s.to_string()))
    }
}

/// A string node address on the controller, `ns=<namespace>;s=<identifier>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    pub namespace: u16,
    pub identifier: String,
}

impl NodeAddress {
    pub fn new(namespace: u16, identifier: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};s={}", self.namespace, self.identifier)
    }
}

impl FromStr for NodeAddress {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LinkError::InvalidAddress(s.to_string());
        let (ns_part, id_part) = s.split_once(';').ok_or_else(invalid)?;
        let namespace = ns_part
            .strip_prefix("ns=")
            .and_then(|n| n.parse::<u16>().ok())
            .ok_or_else(invalid)?;
        let identifier = id_part.strip_prefix("s=").ok_or_else(invalid)?;
        if identifier.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(namespace, identifier))
    }
}

/// Tags written by a full order start, in write order.
pub const DISPATCH_TAGS: [SymbolicTag; 4] = [
    SymbolicTag::StartOrder,
    SymbolicTag::OrderCode,
    SymbolicTag::OrderQuantity,
    SymbolicTag::OrderDate,
];

/// Read-only table from symbolic tag to node address.
#[derive(Debug, Clone, PartialEq)]
pub struct TagCatalog {
    entries: BTreeMap<SymbolicTag, NodeAddress>,
}

impl TagCatalog {
    /// The addresses configured on the LGN line controllers.
    pub fn standard() -> Self {
        Self::with_entries([
            (SymbolicTag::StartOrder, NodeAddress::new(4, "StartOrder")),
            (SymbolicTag::OrderCode, NodeAddress::new(4, "OrderCode")),
            (SymbolicTag::OrderQuantity, NodeAddress::new(4, "OrderQuantity")),
            (SymbolicTag::OrderDate, NodeAddress::new(4, "OrderDate")),
            (SymbolicTag::MachineState, NodeAddress::new(2, "State")),
        ])
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (SymbolicTag, NodeAddress)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn resolve(&self, tag: SymbolicTag) -> Result<&NodeAddress, LinkError> {
        self.entries
            .get(&tag)
            .ok_or_else(|| LinkError::UnknownTag(tag.name().to_string()))
    }

    /// Looks a tag up by its symbolic name (e.g. `"order-code"`).
    pub fn resolve_name(&self, name: &str) -> Result<&NodeAddress, LinkError> {
        self.resolve(name.parse()?)
    }

    /// Fails on the first tag used by dispatch or polling that has no address.
    pub fn validate(&self) -> Result<(), LinkError> {
        for tag in DISPATCH_TAGS.iter().chain([&SymbolicTag::MachineState]) {
            self.resolve(*tag)?;
        }
        Ok(())
    }
}

impl Default for TagCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_addresses_are_bit_exact() {
        let catalog = TagCatalog::standard();
        let rendered: Vec<String> = SymbolicTag::ALL
            .iter()
            .map(|tag| catalog.resolve(*tag).unwrap().to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "ns=4;s=StartOrder",
                "ns=4;s=OrderCode",
                "ns=4;s=OrderQuantity",
                "ns=4;s=OrderDate",
                "ns=2;s=State",
            ]
        );
    }

    #[test]
    fn test_node_address_parse_round_trip() {
        let node: NodeAddress = "ns=4;s=StartOrder".parse().unwrap();
        assert_eq!(node, NodeAddress::new(4, "StartOrder"));
        assert_eq!(node.to_string(), "ns=4;s=StartOrder");
    }

    #[test]
    fn test_malformed_node_address() {
        for bad in ["StartOrder", "ns=x;s=A", "ns=4;i=12", "ns=4;s=", "ns=70000;s=A"] {
            assert!(
                matches!(bad.parse::<NodeAddress>(), Err(LinkError::InvalidAddress(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_by_name() {
        let catalog = TagCatalog::standard();
        assert_eq!(
            catalog.resolve_name("machine-state").unwrap().to_string(),
            "ns=2;s=State"
        );
        assert_eq!(
            catalog.resolve_name("order-colour"),
            Err(LinkError::UnknownTag("order-colour".to_string()))
        );
    }

    #[test]
    fn test_validate_reports_missing_tag() {
        let catalog = TagCatalog::with_entries([(SymbolicTag::StartOrder, NodeAddress::new(4, "StartOrder"))]);
        assert_eq!(
            catalog.validate(),
            Err(LinkError::UnknownTag("order-code".to_string()))
        );
        assert!(TagCatalog::standard().validate().is_ok());
    }
}
