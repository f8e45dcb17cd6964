//! The `Session` aggregate: membership, presence, and the embedded prompt
//! queue, all mutated under a single per-session lock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use conclave_core::{Client, ClientId, Priority, Prompt, PromptId, SessionId, SessionState, User, UserId};

use crate::error::{SessionError, SessionResult};

/// Root aggregate for one collaborative session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Internal identifier.
    pub id: SessionId,
    /// Client-visible identifier; may equal `id`.
    pub external_session_id: String,
    /// Execution-environment identifier, set once the sandbox is ready.
    pub sandbox_id: Option<String>,
    /// Members, keyed by user id. Insertion order is not observable.
    pub(crate) users: HashMap<UserId, User>,
    /// Connections, keyed by client id.
    pub(crate) clients: HashMap<ClientId, Client>,
    /// Ordered prompt queue (not including the executing prompt).
    pub(crate) prompt_queue: Vec<Prompt>,
    /// The single currently-executing prompt, if any.
    pub executing: Option<Prompt>,
    /// Versioned conflict-resolved state.
    pub state: SessionState,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new, empty session.
    #[must_use]
    pub fn new(external_session_id: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            external_session_id: external_session_id.into(),
            sandbox_id: None,
            users: HashMap::new(),
            clients: HashMap::new(),
            prompt_queue: Vec::new(),
            executing: None,
            state: SessionState::default(),
            created_at: Utc::now(),
        }
    }

    /// All members, in unspecified order.
    #[must_use]
    pub fn users(&self) -> Vec<&User> {
        self.users.values().collect()
    }

    /// All connections, in unspecified order.
    #[must_use]
    pub fn clients(&self) -> Vec<&Client> {
        self.clients.values().collect()
    }

    /// Look up one member.
    #[must_use]
    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.users.get(&user_id)
    }

    /// The full prompt queue, head first, not including the executing
    /// prompt.
    #[must_use]
    pub fn prompt_queue(&self) -> &[Prompt] {
        &self.prompt_queue
    }

    fn assigned_color(&self) -> String {
        let taken: std::collections::HashSet<&str> =
            self.users.values().map(|u| u.color.as_str()).collect();
        conclave_core::COLOR_PALETTE
            .iter()
            .find(|c| !taken.contains(*c))
            .copied()
            .unwrap_or(conclave_core::COLOR_PALETTE[0])
            .to_string()
    }

    /// `join` — idempotent for an already-present user, who always succeeds
    /// regardless of capacity.
    pub fn join(
        &mut self,
        user_id: UserId,
        name: impl Into<String>,
        email: Option<String>,
        avatar: Option<String>,
        color: Option<String>,
        max_users_per_session: usize,
    ) -> SessionResult<User> {
        if let Some(existing) = self.users.get(&user_id) {
            return Ok(existing.clone());
        }
        if self.users.len() >= max_users_per_session {
            return Err(SessionError::SessionFull(self.id));
        }
        let user = User {
            user_id,
            name: name.into(),
            email,
            avatar,
            color: color.unwrap_or_else(|| self.assigned_color()),
            joined_at: Utc::now(),
            cursor: None,
        };
        self.users.insert(user_id, user.clone());
        Ok(user)
    }

    /// `leave` — removes the user, their clients, and any held lock.
    /// Returns the ids of clients that were disconnected, and whether the
    /// lock was released, in the order the caller should emit events:
    /// `client.disconnected`* → `lock.released`? → `user.left`.
    pub fn leave(&mut self, user_id: UserId) -> SessionResult<(Vec<ClientId>, bool)> {
        if self.users.remove(&user_id).is_none() {
            return Err(SessionError::UserNotInSession {
                session: self.id,
                user: user_id,
            });
        }
        let disconnected: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|(_, c)| c.user_id == user_id)
            .map(|(id, _)| *id)
            .collect();
        for client_id in &disconnected {
            self.clients.remove(client_id);
        }
        let lock_released = if self.state.edit_lock == Some(user_id) {
            self.state.edit_lock = None;
            true
        } else {
            false
        };
        Ok((disconnected, lock_released))
    }

    /// `connect` — fails if the user isn't a member or is at the per-user
    /// client limit.
    pub fn connect(
        &mut self,
        user_id: UserId,
        client_type: conclave_core::ClientType,
        max_clients_per_user: usize,
    ) -> SessionResult<Client> {
        if !self.users.contains_key(&user_id) {
            return Err(SessionError::UserNotInSession {
                session: self.id,
                user: user_id,
            });
        }
        let current = self.clients.values().filter(|c| c.user_id == user_id).count();
        if current >= max_clients_per_user {
            return Err(SessionError::ClientLimitReached {
                session: self.id,
                user: user_id,
            });
        }
        let now = Utc::now();
        let client = Client {
            client_id: ClientId::new(),
            user_id,
            client_type,
            connected_at: now,
            last_activity: now,
        };
        self.clients.insert(client.client_id, client.clone());
        Ok(client)
    }

    /// `disconnect`.
    pub fn disconnect(&mut self, client_id: ClientId) -> SessionResult<()> {
        self.clients
            .remove(&client_id)
            .map(|_| ())
            .ok_or(SessionError::ClientNotFound(client_id))
    }

    /// `updateCursor` — does not change `state.version`.
    pub fn update_cursor(
        &mut self,
        user_id: UserId,
        cursor: conclave_core::Cursor,
    ) -> SessionResult<()> {
        let user = self
            .users
            .get_mut(&user_id)
            .ok_or(SessionError::UserNotInSession {
                session: self.id,
                user: user_id,
            })?;
        user.cursor = Some(cursor);
        Ok(())
    }

    /// `acquireLock` — succeeds only if unset.
    pub fn acquire_lock(&mut self, user_id: UserId) -> SessionResult<bool> {
        if !self.users.contains_key(&user_id) {
            return Err(SessionError::UserNotInSession {
                session: self.id,
                user: user_id,
            });
        }
        match self.state.edit_lock {
            Some(holder) if holder == user_id => Ok(false),
            Some(_) => Err(SessionError::LockAlreadyHeld(self.id)),
            None => {
                self.state.edit_lock = Some(user_id);
                self.state.version = self.state.version.saturating_add(1);
                Ok(true)
            }
        }
    }

    /// `releaseLock` — only the holder may release.
    pub fn release_lock(&mut self, user_id: UserId) -> SessionResult<()> {
        match self.state.edit_lock {
            Some(holder) if holder == user_id => {
                self.state.edit_lock = None;
                self.state.version = self.state.version.saturating_add(1);
                Ok(())
            }
            _ => Err(SessionError::NotLockHolder {
                session: self.id,
                user: user_id,
            }),
        }
    }

    /// `canEdit`.
    #[must_use]
    pub fn can_edit(&self, user_id: UserId) -> bool {
        self.state.edit_lock.is_none() || self.state.edit_lock == Some(user_id)
    }

    /// `enqueue` — fails if the user isn't a member or the queue is full.
    /// Maintains priority-class ordering: urgent before high before normal,
    /// FIFO within a class.
    pub fn enqueue(
        &mut self,
        user_id: UserId,
        content: impl Into<String>,
        priority: Priority,
        max_queue_size: usize,
    ) -> SessionResult<Prompt> {
        if !self.users.contains_key(&user_id) {
            return Err(SessionError::UserNotInSession {
                session: self.id,
                user: user_id,
            });
        }
        if self.prompt_queue.len() >= max_queue_size {
            return Err(SessionError::QueueFull(self.id));
        }
        let prompt = Prompt::new(user_id, content, priority);
        let insert_at = self
            .prompt_queue
            .iter()
            .position(|p| p.priority.rank() > priority.rank())
            .unwrap_or(self.prompt_queue.len());
        self.prompt_queue.insert(insert_at, prompt.clone());
        Ok(prompt)
    }

    /// `startNext` — requires no prompt currently executing and a
    /// non-empty queue.
    pub fn start_next(&mut self) -> Option<Prompt> {
        if self.executing.is_some() || self.prompt_queue.is_empty() {
            return None;
        }
        let mut prompt = self.prompt_queue.remove(0);
        prompt.started_at = Some(Utc::now());
        self.executing = Some(prompt.clone());
        Some(prompt)
    }

    /// `complete` — clears `executing`.
    pub fn complete(&mut self) -> Option<Prompt> {
        let mut prompt = self.executing.take()?;
        prompt.completed_at = Some(Utc::now());
        Some(prompt)
    }

    /// `cancel` — fails if not found, executing, or not owned by `user_id`.
    pub fn cancel(&mut self, prompt_id: PromptId, user_id: UserId) -> SessionResult<()> {
        if let Some(executing) = &self.executing {
            if executing.prompt_id == prompt_id {
                return Err(SessionError::PromptExecuting(prompt_id));
            }
        }
        let index = self
            .prompt_queue
            .iter()
            .position(|p| p.prompt_id == prompt_id)
            .ok_or(SessionError::PromptNotFound(prompt_id))?;
        if self.prompt_queue[index].user_id != user_id {
            return Err(SessionError::NotPromptOwner {
                prompt: prompt_id,
                user: user_id,
            });
        }
        self.prompt_queue.remove(index);
        Ok(())
    }

    /// `reorder` — clamps `new_index`, refusing to cross a priority-class
    /// boundary.
    pub fn reorder(
        &mut self,
        prompt_id: PromptId,
        user_id: UserId,
        new_index: usize,
    ) -> SessionResult<()> {
        let current_index = self
            .prompt_queue
            .iter()
            .position(|p| p.prompt_id == prompt_id)
            .ok_or(SessionError::PromptNotFound(prompt_id))?;
        if self.prompt_queue[current_index].user_id != user_id {
            return Err(SessionError::NotPromptOwner {
                prompt: prompt_id,
                user: user_id,
            });
        }
        let clamped = new_index.min(self.prompt_queue.len().saturating_sub(1));
        let class = self.prompt_queue[current_index].priority;
        let (class_start, class_end) = self.priority_class_bounds(class);
        if clamped < class_start || clamped >= class_end {
            return Err(SessionError::CrossPriorityReorder(prompt_id));
        }
        let prompt = self.prompt_queue.remove(current_index);
        self.prompt_queue.insert(clamped, prompt);
        Ok(())
    }

    fn priority_class_bounds(&self, class: Priority) -> (usize, usize) {
        let start = self
            .prompt_queue
            .iter()
            .position(|p| p.priority == class)
            .unwrap_or(0);
        let end = self
            .prompt_queue
            .iter()
            .rposition(|p| p.priority == class)
            .map_or(start, |i| i + 1);
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::ClientType;

    #[test]
    fn join_is_idempotent_for_an_existing_user() {
        let mut session = Session::new("ext-1");
        let user_id = UserId::new();
        let first = session.join(user_id, "ana", None, None, None, 10).unwrap();
        let second = session.join(user_id, "ana", None, None, None, 10).unwrap();
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(session.users.len(), 1);
    }

    #[test]
    fn join_rejects_new_users_once_full_but_not_existing_ones() {
        let mut session = Session::new("ext-1");
        let existing = UserId::new();
        session.join(existing, "ana", None, None, None, 1).unwrap();
        assert!(session.join(existing, "ana", None, None, None, 1).is_ok());
        let newcomer = UserId::new();
        assert!(matches!(
            session.join(newcomer, "bo", None, None, None, 1),
            Err(SessionError::SessionFull(_))
        ));
    }

    #[test]
    fn leave_releases_lock_and_removes_clients() {
        let mut session = Session::new("ext-1");
        let user_id = UserId::new();
        session.join(user_id, "ana", None, None, None, 10).unwrap();
        session.connect(user_id, ClientType::Web, 10).unwrap();
        session.acquire_lock(user_id).unwrap();

        let (disconnected, lock_released) = session.leave(user_id).unwrap();
        assert_eq!(disconnected.len(), 1);
        assert!(lock_released);
        assert!(session.state.edit_lock.is_none());
    }

    #[test]
    fn connect_respects_per_user_client_limit() {
        let mut session = Session::new("ext-1");
        let user_id = UserId::new();
        session.join(user_id, "ana", None, None, None, 10).unwrap();
        session.connect(user_id, ClientType::Web, 1).unwrap();
        assert!(matches!(
            session.connect(user_id, ClientType::Web, 1),
            Err(SessionError::ClientLimitReached { .. })
        ));
    }

    #[test]
    fn acquire_lock_is_exclusive() {
        let mut session = Session::new("ext-1");
        let a = UserId::new();
        let b = UserId::new();
        session.join(a, "a", None, None, None, 10).unwrap();
        session.join(b, "b", None, None, None, 10).unwrap();

        assert!(session.acquire_lock(a).unwrap());
        assert!(matches!(
            session.acquire_lock(b),
            Err(SessionError::LockAlreadyHeld(_))
        ));
        assert!(matches!(
            session.release_lock(b),
            Err(SessionError::NotLockHolder { .. })
        ));
        session.release_lock(a).unwrap();
        assert!(session.acquire_lock(b).unwrap());
    }

    #[test]
    fn enqueue_orders_urgent_before_high_before_normal() {
        let mut session = Session::new("ext-1");
        let user_id = UserId::new();
        session.join(user_id, "ana", None, None, None, 10).unwrap();

        session.enqueue(user_id, "normal-1", Priority::Normal, 10).unwrap();
        session.enqueue(user_id, "high-1", Priority::High, 10).unwrap();
        session.enqueue(user_id, "urgent-1", Priority::Urgent, 10).unwrap();
        session.enqueue(user_id, "normal-2", Priority::Normal, 10).unwrap();

        let contents: Vec<&str> = session
            .prompt_queue()
            .iter()
            .map(|p| p.content.as_str())
            .collect();
        assert_eq!(contents, vec!["urgent-1", "high-1", "normal-1", "normal-2"]);
    }

    #[test]
    fn start_next_requires_nothing_already_executing() {
        let mut session = Session::new("ext-1");
        let user_id = UserId::new();
        session.join(user_id, "ana", None, None, None, 10).unwrap();
        session.enqueue(user_id, "p1", Priority::Normal, 10).unwrap();
        session.enqueue(user_id, "p2", Priority::Normal, 10).unwrap();

        let started = session.start_next().unwrap();
        assert_eq!(started.content, "p1");
        assert!(session.start_next().is_none());

        session.complete().unwrap();
        let started2 = session.start_next().unwrap();
        assert_eq!(started2.content, "p2");
    }

    #[test]
    fn cancel_refuses_the_executing_prompt_and_non_owners() {
        let mut session = Session::new("ext-1");
        let owner = UserId::new();
        let other = UserId::new();
        session.join(owner, "owner", None, None, None, 10).unwrap();
        session.join(other, "other", None, None, None, 10).unwrap();
        let p1 = session.enqueue(owner, "p1", Priority::Normal, 10).unwrap();
        let p2 = session.enqueue(owner, "p2", Priority::Normal, 10).unwrap();
        session.start_next().unwrap();

        assert!(matches!(
            session.cancel(p1.prompt_id, owner),
            Err(SessionError::PromptExecuting(_))
        ));
        assert!(matches!(
            session.cancel(p2.prompt_id, other),
            Err(SessionError::NotPromptOwner { .. })
        ));
        session.cancel(p2.prompt_id, owner).unwrap();
        assert!(session.prompt_queue().is_empty());
    }

    #[test]
    fn reorder_refuses_to_cross_a_priority_class_boundary() {
        let mut session = Session::new("ext-1");
        let user_id = UserId::new();
        session.join(user_id, "ana", None, None, None, 10).unwrap();
        let urgent = session.enqueue(user_id, "u1", Priority::Urgent, 10).unwrap();
        session.enqueue(user_id, "n1", Priority::Normal, 10).unwrap();
        session.enqueue(user_id, "n2", Priority::Normal, 10).unwrap();

        assert!(matches!(
            session.reorder(urgent.prompt_id, user_id, 2),
            Err(SessionError::CrossPriorityReorder(_))
        ));
    }
}
