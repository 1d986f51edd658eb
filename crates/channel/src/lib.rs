#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]
//! The bilateral channel fabric (§4.4): point-to-point message delivery
//! between entities, with no global router.
//!
//! `ChannelTransport` is the seam a real network transport plugs into,
//! mirroring the reference kernel's split between a trait (`BlockSync` /
//! `MempoolGossip`) and a concrete sync engine. [`InMemoryTransport`] is
//! the only implementation this crate ships: synchronous, single-process
//! delivery, exactly what §4.4 describes as the in-memory variant.

use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;
use tracing::trace;
use xln_types::{EntityId, EntityTx, SignerId};

/// A channel's transport-level connection state (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// One directional relationship between a local entity and a remote one
/// (§4.4). `next_outgoing_seq` and `last_incoming_seq` are per-channel, so
/// ordering is only promised within a single `(source, destination)` pair.
#[derive(Debug, Clone)]
pub struct Channel {
    pub local_entity_id: EntityId,
    pub remote_entity_id: EntityId,
    pub outgoing: Vec<Message>,
    pub incoming: Vec<Message>,
    pub next_outgoing_seq: u64,
    pub last_incoming_seq: u64,
    pub connection_status: ConnectionStatus,
}

impl Channel {
    fn new(local_entity_id: EntityId, remote_entity_id: EntityId) -> Self {
        Channel {
            local_entity_id,
            remote_entity_id,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            next_outgoing_seq: 0,
            last_incoming_seq: 0,
            connection_status: ConnectionStatus::Connected,
        }
    }
}

/// The bilateral message on-wire format (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from_entity_id: EntityId,
    pub to_entity_id: EntityId,
    pub signer_id: SignerId,
    pub entity_txs: Vec<EntityTx>,
    pub timestamp: u64,
    pub message_id: String,
    pub sequence_number: u64,
}

/// One entity's registered presence on the fabric: its channels to every
/// counterparty it has sent to or received from, plus the in-queue the
/// Runtime Kernel drains once per tick (§4.4).
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub channels: BTreeMap<EntityId, Channel>,
    pub in_queue: VecDeque<Message>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("send from unregistered entity {0}")]
    UnknownSender(EntityId),
}

/// The seam a real network transport (libp2p, QUIC, ...) would implement;
/// [`InMemoryTransport`] is the single-process reference implementation.
pub trait ChannelTransport: Send + Sync {
    fn register(&mut self, entity_id: EntityId);
    fn send(
        &mut self,
        from: EntityId,
        to: EntityId,
        signer_id: SignerId,
        txs: Vec<EntityTx>,
        timestamp: u64,
    ) -> Result<Message, ChannelError>;
    fn broadcast(
        &mut self,
        from: EntityId,
        to: &[EntityId],
        signer_id: SignerId,
        txs: Vec<EntityTx>,
        timestamp: u64,
    ) -> Vec<Result<Message, ChannelError>>;
    fn get_pending(&mut self, entity_id: EntityId) -> Vec<Message>;
}

/// Synchronous, in-process delivery: `send` both enqueues on the sender's
/// outgoing channel and appends directly to the recipient's in-queue,
/// since there is no real network hop to wait on (§4.4).
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    nodes: BTreeMap<EntityId, Node>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelTransport for InMemoryTransport {
    fn register(&mut self, entity_id: EntityId) {
        self.nodes.entry(entity_id).or_default();
    }

    fn send(
        &mut self,
        from: EntityId,
        to: EntityId,
        signer_id: SignerId,
        txs: Vec<EntityTx>,
        timestamp: u64,
    ) -> Result<Message, ChannelError> {
        let seq = {
            let sender = self
                .nodes
                .get_mut(&from)
                .ok_or(ChannelError::UnknownSender(from))?;
            let channel = sender
                .channels
                .entry(to)
                .or_insert_with(|| Channel::new(from, to));
            let seq = channel.next_outgoing_seq;
            channel.next_outgoing_seq += 1;
            seq
        };

        let message = Message {
            from_entity_id: from,
            to_entity_id: to,
            signer_id,
            entity_txs: txs,
            timestamp,
            message_id: format!("{from}:{to}:{seq}"),
            sequence_number: seq,
        };

        if let Some(sender) = self.nodes.get_mut(&from) {
            if let Some(channel) = sender.channels.get_mut(&to) {
                channel.outgoing.push(message.clone());
            }
        }

        let recipient = self.nodes.entry(to).or_default();
        let recipient_channel = recipient
            .channels
            .entry(from)
            .or_insert_with(|| Channel::new(to, from));
        recipient_channel.last_incoming_seq = seq;
        recipient_channel.incoming.push(message.clone());
        recipient.in_queue.push_back(message.clone());

        trace!(%from, %to, seq, "delivered message");
        Ok(message)
    }

    fn broadcast(
        &mut self,
        from: EntityId,
        to: &[EntityId],
        signer_id: SignerId,
        txs: Vec<EntityTx>,
        timestamp: u64,
    ) -> Vec<Result<Message, ChannelError>> {
        to.iter()
            .map(|target| self.send(from, *target, signer_id.clone(), txs.clone(), timestamp))
            .collect()
    }

    fn get_pending(&mut self, entity_id: EntityId) -> Vec<Message> {
        match self.nodes.get_mut(&entity_id) {
            Some(node) => node.in_queue.drain(..).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(byte: u8) -> EntityId {
        EntityId::from_bytes([byte; 32])
    }

    #[test]
    fn send_from_unregistered_entity_fails() {
        let mut transport = InMemoryTransport::new();
        transport.register(entity(2));
        let err = transport
            .send(entity(1), entity(2), SignerId::new("s1"), vec![], 0)
            .unwrap_err();
        assert_eq!(err, ChannelError::UnknownSender(entity(1)));
    }

    #[test]
    fn send_delivers_to_recipient_in_queue() {
        let mut transport = InMemoryTransport::new();
        transport.register(entity(1));
        transport.register(entity(2));
        transport
            .send(entity(1), entity(2), SignerId::new("s1"), vec![], 100)
            .unwrap();
        let pending = transport.get_pending(entity(2));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].from_entity_id, entity(1));
        assert_eq!(pending[0].message_id, format!("{}:{}:0", entity(1), entity(2)));
    }

    #[test]
    fn ordering_preserved_per_source_destination_pair() {
        let mut transport = InMemoryTransport::new();
        transport.register(entity(1));
        transport.register(entity(2));
        for _ in 0..3 {
            transport
                .send(entity(1), entity(2), SignerId::new("s1"), vec![], 0)
                .unwrap();
        }
        let pending = transport.get_pending(entity(2));
        let seqs: Vec<u64> = pending.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn get_pending_drains_the_queue() {
        let mut transport = InMemoryTransport::new();
        transport.register(entity(1));
        transport.register(entity(2));
        transport
            .send(entity(1), entity(2), SignerId::new("s1"), vec![], 0)
            .unwrap();
        assert_eq!(transport.get_pending(entity(2)).len(), 1);
        assert_eq!(transport.get_pending(entity(2)).len(), 0);
    }

    #[test]
    fn broadcast_sends_to_every_target() {
        let mut transport = InMemoryTransport::new();
        transport.register(entity(1));
        transport.register(entity(2));
        transport.register(entity(3));
        let results = transport.broadcast(
            entity(1),
            &[entity(2), entity(3)],
            SignerId::new("s1"),
            vec![],
            0,
        );
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(transport.get_pending(entity(2)).len(), 1);
        assert_eq!(transport.get_pending(entity(3)).len(), 1);
    }
}
