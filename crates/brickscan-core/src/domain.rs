//! The set of identifiers a record is allowed to carry.
//!
//! An [`IdentifierDomain`] is built once (typically from part descriptor
//! exports) and then shared by reference across every extraction call. It
//! is never mutated after construction.

use std::collections::{HashMap, HashSet};

/// Immutable membership set of valid identifiers and their aliases.
///
/// Membership covers primary identifiers, alias identifiers and alias
/// targets alike. The alias map is kept so callers can resolve an alias back
/// to its primary identifier after extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierDomain {
    members: HashSet<u32>,
    primaries: usize,
    aliases: HashMap<u32, u32>,
}

impl IdentifierDomain {
    /// Creates an empty domain builder
    pub fn builder() -> DomainBuilder {
        DomainBuilder::default()
    }

    /// Returns true if `id` is a primary identifier or an alias
    pub fn contains(&self, id: u32) -> bool {
        self.members.contains(&id)
    }

    /// Maps an alias to its primary identifier; other ids are returned as is
    pub fn resolve(&self, id: u32) -> u32 {
        self.aliases.get(&id).copied().unwrap_or(id)
    }

    /// Returns true if `id` is registered as an alias
    pub fn is_alias(&self, id: u32) -> bool {
        self.aliases.contains_key(&id)
    }

    /// Number of distinct identifiers accepted by the domain
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if no identifier is accepted
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of primary identifiers the domain was built from
    pub fn primary_count(&self) -> usize {
        self.primaries
    }

    /// Number of alias entries
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

impl FromIterator<u32> for IdentifierDomain {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DomainBuilder::default(), DomainBuilder::primary)
            .build()
    }
}

/// Builder for [`IdentifierDomain`]
#[derive(Debug, Clone, Default)]
pub struct DomainBuilder {
    primaries: HashSet<u32>,
    aliases: HashMap<u32, u32>,
}

impl DomainBuilder {
    /// Adds a primary identifier
    pub fn primary(mut self, id: u32) -> Self {
        self.primaries.insert(id);
        self
    }

    /// Registers `alias` as another name for `primary`
    ///
    /// The primary side is not implicitly added as a primary identifier, but
    /// it does become a member of the finished domain.
    pub fn alias(mut self, alias: u32, primary: u32) -> Self {
        self.aliases.insert(alias, primary);
        self
    }

    /// Adds a primary identifier in place
    pub fn add_primary(&mut self, id: u32) {
        self.primaries.insert(id);
    }

    /// Registers an alias in place; a later registration for the same alias wins
    pub fn add_alias(&mut self, alias: u32, primary: u32) {
        self.aliases.insert(alias, primary);
    }

    /// Freezes the builder into a domain
    pub fn build(self) -> IdentifierDomain {
        let mut members = self.primaries.clone();
        for (&alias, &primary) in &self.aliases {
            members.insert(alias);
            members.insert(primary);
        }

        IdentifierDomain {
            members,
            primaries: self.primaries.len(),
            aliases: self.aliases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iter() {
        let domain: IdentifierDomain = [5, 7, 7].into_iter().collect();
        assert_eq!(domain.len(), 2);
        assert!(domain.contains(5));
        assert!(domain.contains(7));
        assert!(!domain.contains(6));
        assert_eq!(domain.alias_count(), 0);
    }

    #[test]
    fn test_aliases_are_members() {
        let domain = IdentifierDomain::builder()
            .primary(3001)
            .alias(3002, 3001)
            .alias(4000, 9999)
            .build();

        assert!(domain.contains(3001));
        assert!(domain.contains(3002));
        assert!(domain.contains(4000));
        assert!(domain.contains(9999));
        assert_eq!(domain.len(), 4);
        assert_eq!(domain.primary_count(), 1);
        assert_eq!(domain.alias_count(), 2);
    }

    #[test]
    fn test_resolve() {
        let domain = IdentifierDomain::builder()
            .primary(3001)
            .alias(3002, 3001)
            .build();

        assert_eq!(domain.resolve(3002), 3001);
        assert_eq!(domain.resolve(3001), 3001);
        assert_eq!(domain.resolve(42), 42);
        assert!(domain.is_alias(3002));
        assert!(!domain.is_alias(3001));
    }

    #[test]
    fn test_empty() {
        let domain = IdentifierDomain::default();
        assert!(domain.is_empty());
        assert!(!domain.contains(0));
    }
}
