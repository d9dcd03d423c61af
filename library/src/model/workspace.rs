//! Workspace persistence: the versioned JSON document a network is saved as.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::link::PropertyLink;
use crate::model::property::PropertyValue;
use crate::model::Connection;
use crate::network::ProcessorNetwork;
use crate::processor::factory::ProcessorFactory;

/// Format version written by this build. Loading rejects anything newer.
pub const WORKSPACE_VERSION: u32 = 1;

/// One saved processor: its class, instance name and the flattened values
/// of its serializable properties.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProcessorEntry {
    pub class_identifier: String,
    pub identifier: String,
    /// Dotted property path -> value. A `BTreeMap` keeps the file diffable.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

/// The persisted form of a network.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorkspaceDocument {
    pub version: u32,
    pub processors: Vec<ProcessorEntry>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub links: Vec<PropertyLink>,
}

impl WorkspaceDocument {
    /// Snapshot a network. Processors appear in creation order; properties
    /// marked non-serializable are left out.
    pub fn from_network(network: &ProcessorNetwork) -> Self {
        let processors = network
            .processors()
            .map(|processor| {
                let mut values = HashMap::new();
                for property in processor.properties() {
                    property.flatten_into("", &mut values);
                }
                ProcessorEntry {
                    class_identifier: processor.info().class_identifier.clone(),
                    identifier: processor.identifier().to_string(),
                    properties: values.into_iter().collect(),
                }
            })
            .collect();
        Self {
            version: WORKSPACE_VERSION,
            processors,
            connections: network.connections().to_vec(),
            links: network.links().to_vec(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        info!("saved workspace to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let file = File::open(path.as_ref())?;
        let document: WorkspaceDocument = serde_json::from_reader(BufReader::new(file))?;
        if document.version > WORKSPACE_VERSION {
            return Err(EngineError::Serialization(format!(
                "workspace version {} is newer than supported version {}",
                document.version, WORKSPACE_VERSION
            )));
        }
        Ok(document)
    }

    /// Rebuild the document's content inside `network`.
    ///
    /// Loading is forgiving: unknown processor classes, vanished properties
    /// and rejected connections or links are reported in the returned
    /// problem list instead of aborting, so one missing module does not make
    /// the whole workspace unloadable. The network stays locked for the
    /// duration, so observers see a single batched change.
    pub fn instantiate(
        &self,
        factory: &ProcessorFactory,
        network: &mut ProcessorNetwork,
    ) -> Result<Vec<String>, EngineError> {
        let mut problems = Vec::new();
        let mut guard = network.lock();

        for entry in &self.processors {
            let Some(mut processor) = factory.create(&entry.class_identifier, &entry.identifier)
            else {
                problems.push(format!(
                    "unknown processor class '{}' for '{}'",
                    entry.class_identifier, entry.identifier
                ));
                continue;
            };
            for (path, value) in &entry.properties {
                match processor.property_mut(path) {
                    Some(property) => {
                        property.set_value(value.clone());
                    }
                    None => problems.push(format!(
                        "processor '{}' has no property '{}'",
                        entry.identifier, path
                    )),
                }
            }
            if let Err(e) = guard.add_processor(processor) {
                problems.push(e.to_string());
            }
        }

        for connection in &self.connections {
            if let Err(e) = guard.add_connection(connection.clone()) {
                problems.push(format!(
                    "connection {} -> {}: {}",
                    connection.from, connection.to, e
                ));
            }
        }

        for link in &self.links {
            if let Err(e) = guard.add_link(link.clone()) {
                problems.push(format!("link {} -> {}: {}", link.src, link.dst, e));
            }
        }

        drop(guard);
        for problem in &problems {
            warn!("workspace load: {}", problem);
        }
        Ok(problems)
    }
}
