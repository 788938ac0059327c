//! Broker lookup by node ID.
//!
//! Partitions refer to their leader and replicas by node ID only. This index resolves such an ID to an address.

use std::collections::{HashMap, hash_map::Entry};
use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::protocol::messages::MetadataResponseBroker;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BrokerTopology {
    topology: HashMap<i32, Broker>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broker {
    pub host: String,
    pub port: i32,
}

impl Display for Broker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl<'a> From<&'a MetadataResponseBroker> for Broker {
    fn from(b: &'a MetadataResponseBroker) -> Self {
        Self {
            host: b.host.0.clone(),
            port: b.port.0,
        }
    }
}

impl BrokerTopology {
    pub fn new(brokers: &[MetadataResponseBroker]) -> Self {
        let mut topology = Self::default();
        topology.update(brokers);
        topology
    }

    pub fn is_empty(&self) -> bool {
        self.topology.is_empty()
    }

    pub fn len(&self) -> usize {
        self.topology.len()
    }

    pub fn get(&self, broker_id: i32) -> Option<&Broker> {
        self.topology.get(&broker_id)
    }

    /// Returns the broker URL for the provided broker
    pub fn get_broker_url(&self, broker_id: i32) -> Option<String> {
        self.topology.get(&broker_id).map(ToString::to_string)
    }

    /// Returns a list of all broker URLs, ordered by node ID
    pub fn get_broker_urls(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.topology.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.get_broker_url(id))
            .collect()
    }

    /// Updates with the provided broker metadata
    ///
    /// Brokers missing from `brokers` are kept.
    pub fn update(&mut self, brokers: &[MetadataResponseBroker]) {
        for broker in brokers {
            match self.topology.entry(broker.node_id.0) {
                Entry::Occupied(mut o) => {
                    let current = o.get_mut();
                    if current.host != broker.host.0 || current.port != broker.port.0 {
                        let new = Broker::from(broker);
                        debug!(
                            broker = broker.node_id.0,
                            current = %current,
                            new = %new,
                            "Broker update",
                        );
                        *current = new;
                    }
                }
                Entry::Vacant(v) => {
                    let new = Broker::from(broker);
                    debug!(broker = broker.node_id.0, new = %new, "New broker");
                    v.insert(new);
                }
            }
        }
    }
}
