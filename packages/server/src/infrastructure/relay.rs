//! Realtime room relay.
//!
//! Owns the registry of live connections and room membership, and fans
//! events out to room members. Each connection has an unbounded FIFO
//! channel and fan-out happens under the registry lock, so events from one
//! sender reach every member in the order they were broadcast.
//!
//! The registry is constructor-scoped: every `RoomRelay` is independent.

use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::{
    domain::{
        ConnectionId, DisplayName, Participant, Presence, Room, RoomError, RoomId, Timestamp,
        UserId, entity::DEFAULT_PARTICIPANT_CAPACITY,
    },
    infrastructure::dto::websocket::ServerEvent,
};

/// Live connection registered with the relay
struct Connection {
    user_id: UserId,
    display_name: DisplayName,
    sender: UnboundedSender<ServerEvent>,
    /// A connection is in at most one room at a time
    room: Option<RoomId>,
}

#[derive(Default)]
struct RelayState {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomId, Room>,
}

pub struct RoomRelay {
    state: Mutex<RelayState>,
    next_connection_id: AtomicU64,
    room_capacity: usize,
}

impl Default for RoomRelay {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICIPANT_CAPACITY)
    }
}

impl RoomRelay {
    pub fn new(room_capacity: usize) -> Self {
        Self {
            state: Mutex::new(RelayState::default()),
            next_connection_id: AtomicU64::new(1),
            room_capacity,
        }
    }

    /// Register a connection. It starts out joined to no room.
    pub async fn connect(
        &self,
        user_id: UserId,
        display_name: DisplayName,
        sender: UnboundedSender<ServerEvent>,
    ) -> ConnectionId {
        let connection_id =
            ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let mut state = self.state.lock().await;
        state.connections.insert(
            connection_id,
            Connection {
                user_id,
                display_name,
                sender,
                room: None,
            },
        );
        connection_id
    }

    /// Drop a connection, leaving its room if any. Returns the room it was in.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Option<RoomId> {
        let mut state = self.state.lock().await;
        let RelayState { connections, rooms } = &mut *state;
        let connection = connections.remove(&connection_id)?;
        let room_id = connection.room?;
        remove_from_room(rooms, &room_id, connection_id);
        Some(room_id)
    }

    /// Join `room_id`, leaving the connection's previous room first.
    ///
    /// Silent to other members. Returns the participants after joining.
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        display_name: Option<DisplayName>,
    ) -> Result<Vec<Participant>, RoomError> {
        let mut state = self.state.lock().await;
        let RelayState { connections, rooms } = &mut *state;
        let connection = connections
            .get_mut(&connection_id)
            .ok_or(RoomError::ConnectionNotFound(connection_id.value()))?;

        // Check capacity before touching the previous room
        if let Some(room) = rooms.get(&room_id)
            && room.get_participant(connection_id).is_none()
            && room.participants.len() >= room.participant_capacity
        {
            return Err(RoomError::CapacityExceeded {
                capacity: room.participant_capacity,
                current: room.participants.len(),
            });
        }

        if let Some(previous) = connection.room.take()
            && previous != room_id
        {
            remove_from_room(rooms, &previous, connection_id);
        }

        let now = Timestamp::now();
        let room = rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::with_capacity(room_id.clone(), now, self.room_capacity));
        room.add_participant(Participant::new(
            connection_id,
            connection.user_id.clone(),
            display_name.unwrap_or_else(|| connection.display_name.clone()),
            now,
        ))?;
        connection.room = Some(room_id);

        Ok(room.participants.clone())
    }

    /// Leave `room_id`. Silent to other members.
    pub async fn leave(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        let RelayState { connections, rooms } = &mut *state;
        let connection = connections
            .get_mut(&connection_id)
            .ok_or(RoomError::ConnectionNotFound(connection_id.value()))?;
        if connection.room.as_ref() != Some(room_id) {
            return Err(RoomError::NotJoined(room_id.to_string()));
        }
        connection.room = None;
        remove_from_room(rooms, room_id, connection_id);
        Ok(())
    }

    /// The participant record of a connection joined to `room_id`.
    pub async fn member(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<Participant, RoomError> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .and_then(|room| room.get_participant(connection_id))
            .cloned()
            .ok_or_else(|| RoomError::NotJoined(room_id.to_string()))
    }

    /// Set presence and broadcast the typing indicator to the other members.
    pub async fn set_typing(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        typing: bool,
    ) -> Result<usize, RoomError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotJoined(room_id.to_string()))?;
        let presence = if typing {
            Presence::Typing
        } else {
            Presence::Idle
        };
        if !room.set_presence(connection_id, presence) {
            return Err(RoomError::NotJoined(room_id.to_string()));
        }
        let Some(sender) = room.get_participant(connection_id).cloned() else {
            return Err(RoomError::NotJoined(room_id.to_string()));
        };

        let event = if typing {
            ServerEvent::UserTyping {
                room_id: room_id.to_string(),
                sender_id: sender.user_id.to_string(),
                display_name: sender.display_name.to_string(),
            }
        } else {
            ServerEvent::StopTyping {
                room_id: room_id.to_string(),
                sender_id: sender.user_id.to_string(),
            }
        };
        Ok(fan_out(&state, room_id, Some(connection_id), &event))
    }

    /// Broadcast an accepted message from `connection_id` to the other
    /// members present right now, resetting the sender to idle if it is
    /// still joined.
    pub async fn broadcast_from(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        event: &ServerEvent,
    ) -> usize {
        let mut state = self.state.lock().await;
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.set_presence(connection_id, Presence::Idle);
        }
        fan_out(&state, room_id, Some(connection_id), event)
    }

    /// Broadcast to every member of `room_id`.
    pub async fn broadcast(&self, room_id: &RoomId, event: &ServerEvent) -> usize {
        let state = self.state.lock().await;
        fan_out(&state, room_id, None, event)
    }

    /// Send directly to one connection. False if it is gone.
    pub async fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        let state = self.state.lock().await;
        state
            .connections
            .get(&connection_id)
            .is_some_and(|c| c.sender.send(event).is_ok())
    }

    /// Send to every open connection of `user_id`, joined to a room or not.
    pub async fn notify_user(&self, user_id: &UserId, event: &ServerEvent) -> usize {
        let state = self.state.lock().await;
        state
            .connections
            .values()
            .filter(|c| &c.user_id == user_id)
            .filter(|c| c.sender.send(event.clone()).is_ok())
            .count()
    }

    /// Send once to every member of `room_id` and every open connection of
    /// `users`, even when a connection is both.
    pub async fn notify_room_and_users(
        &self,
        room_id: &RoomId,
        users: &[UserId],
        event: &ServerEvent,
    ) -> usize {
        let state = self.state.lock().await;
        let mut targets: HashSet<ConnectionId> = state
            .rooms
            .get(room_id)
            .map(|room| room.connections_except(None).into_iter().collect())
            .unwrap_or_default();
        targets.extend(
            state
                .connections
                .iter()
                .filter(|(_, c)| users.contains(&c.user_id))
                .map(|(id, _)| *id),
        );

        targets
            .into_iter()
            .filter_map(|id| state.connections.get(&id))
            .filter(|c| c.sender.send(event.clone()).is_ok())
            .count()
    }

    /// Deliver something `sender` posted without a connection of its own:
    /// to every member of `room_id` that is not `sender`, plus every open
    /// connection of `recipient`. Each target gets the event once.
    pub async fn deliver_from_user(
        &self,
        room_id: &RoomId,
        sender: &UserId,
        recipient: Option<&UserId>,
        event: &ServerEvent,
    ) -> usize {
        let state = self.state.lock().await;
        let mut targets: HashSet<ConnectionId> = state
            .rooms
            .get(room_id)
            .map(|room| room.connections_except(None).into_iter().collect())
            .unwrap_or_default();
        if let Some(recipient) = recipient {
            targets.extend(
                state
                    .connections
                    .iter()
                    .filter(|(_, c)| &c.user_id == recipient)
                    .map(|(id, _)| *id),
            );
        }

        targets
            .into_iter()
            .filter_map(|id| state.connections.get(&id))
            .filter(|c| &c.user_id != sender)
            .filter(|c| c.sender.send(event.clone()).is_ok())
            .count()
    }

    /// Name `user_id` goes by in `room_id`, or on any open connection.
    pub async fn display_name_of(&self, room_id: &RoomId, user_id: &UserId) -> Option<DisplayName> {
        let state = self.state.lock().await;
        let joined = state.rooms.get(room_id).and_then(|room| {
            room.participants
                .iter()
                .find(|p| &p.user_id == user_id)
                .map(|p| p.display_name.clone())
        });
        joined.or_else(|| {
            state
                .connections
                .values()
                .find(|c| &c.user_id == user_id)
                .map(|c| c.display_name.clone())
        })
    }

    /// Snapshot of the current rooms
    pub async fn rooms(&self) -> Vec<Room> {
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state.rooms.values().cloned().collect();
        rooms.sort_by_key(|r| r.created_at);
        rooms
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }
}

fn remove_from_room(rooms: &mut HashMap<RoomId, Room>, room_id: &RoomId, connection_id: ConnectionId) {
    if let Some(room) = rooms.get_mut(room_id) {
        room.remove_participant(connection_id);
        if room.is_empty() {
            rooms.remove(room_id);
        }
    }
}

fn fan_out(
    state: &RelayState,
    room_id: &RoomId,
    exclude: Option<ConnectionId>,
    event: &ServerEvent,
) -> usize {
    let Some(room) = state.rooms.get(room_id) else {
        return 0;
    };
    let mut delivered = 0;
    for target in room.connections_except(exclude) {
        match state.connections.get(&target) {
            Some(connection) if connection.sender.send(event.clone()).is_ok() => delivered += 1,
            _ => tracing::warn!("Failed to deliver event to connection {}", target),
        }
    }
    delivered
}
