//! Processor factory keyed by reverse-DNS class identifier.

use std::collections::HashMap;

use log::debug;

use super::Processor;

type Constructor = Box<dyn Fn(&str) -> Processor + Send + Sync>;

/// Creates processors from class identifier strings, e.g. when loading a
/// workspace. Unknown identifiers are not an error here — workspaces may
/// reference processors from modules that are not loaded — so `create`
/// returns `None` instead of failing.
#[derive(Default)]
pub struct ProcessorFactory {
    constructors: HashMap<String, Constructor>,
}

impl ProcessorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. The closure receives the instance identifier
    /// for the processor to be built. Re-registration replaces the previous
    /// constructor.
    pub fn register(
        &mut self,
        class_identifier: impl Into<String>,
        constructor: impl Fn(&str) -> Processor + Send + Sync + 'static,
    ) {
        let class_identifier = class_identifier.into();
        debug!("registering processor type '{}'", class_identifier);
        self.constructors
            .insert(class_identifier, Box::new(constructor));
    }

    pub fn is_valid_type(&self, class_identifier: &str) -> bool {
        self.constructors.contains_key(class_identifier)
    }

    pub fn create(&self, class_identifier: &str, identifier: &str) -> Option<Processor> {
        self.constructors
            .get(class_identifier)
            .map(|ctor| ctor(identifier))
    }

    /// All registered class identifiers, sorted for stable listings.
    pub fn class_identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.constructors.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::basics;

    #[test]
    fn unknown_type_returns_none() {
        let factory = ProcessorFactory::new();
        assert!(!factory.is_valid_type("org.example.missing"));
        assert!(factory.create("org.example.missing", "m1").is_none());
    }

    #[test]
    fn registered_type_builds_named_instance() {
        let mut factory = ProcessorFactory::new();
        basics::register_basics(&mut factory);
        let p = factory.create(basics::SOURCE_CLASS, "source1").unwrap();
        assert_eq!(p.identifier(), "source1");
        assert_eq!(p.info().class_identifier, basics::SOURCE_CLASS);
    }
}
