//! Audit trail and soft-delete contract
//!
//! Customers, products, orders, invoices and payments all carry an
//! [`AuditEnvelope`] (who created the record, who touched it last, who owns it)
//! and a [`Deletion`] marker. Services stamp both explicitly through the
//! [`Auditable`] and [`SoftDeletable`] traits, always passing the acting
//! [`Actor`], immediately before handing the aggregate to its port.
//!
//! Line items and payment applications are not audited beyond their own
//! `created_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identifiers::UserId;

/// The authenticated identity performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

impl From<UserId> for Actor {
    fn from(user_id: UserId) -> Self {
        Self::new(user_id)
    }
}

/// Creation, modification and ownership stamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEnvelope {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: UserId,
    pub last_modified_by: UserId,
    /// Defaults to the creator; transferable
    pub owner: UserId,
    /// Incremented on every stamped change. Carried for optimistic locking,
    /// not compared on write.
    pub version: i32,
}

impl AuditEnvelope {
    /// Stamps a freshly created record; the creator owns it unless `owner` is given
    pub fn new(actor: &Actor, owner: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            created_by: actor.user_id,
            last_modified_by: actor.user_id,
            owner: owner.unwrap_or(actor.user_id),
            version: 1,
        }
    }

    /// Records a modification by `actor`
    pub fn touch(&mut self, actor: &Actor) {
        self.updated_at = Utc::now();
        self.last_modified_by = actor.user_id;
        self.version += 1;
    }
}

/// Soft-delete marker; all three fields are set together or cleared together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<UserId>,
}

impl Deletion {
    fn mark(&mut self, actor: &Actor) {
        self.is_deleted = true;
        self.deleted_at = Some(Utc::now());
        self.deleted_by = Some(actor.user_id);
    }

    fn clear(&mut self) {
        *self = Deletion::default();
    }
}

/// An aggregate that carries an [`AuditEnvelope`]
pub trait Auditable {
    fn audit(&self) -> &AuditEnvelope;

    fn audit_mut(&mut self) -> &mut AuditEnvelope;

    /// Pre-commit hook: call before every save of a modified aggregate
    fn stamp_update(&mut self, actor: &Actor) {
        self.audit_mut().touch(actor);
    }

    fn transfer_ownership(&mut self, actor: &Actor, new_owner: UserId) {
        let audit = self.audit_mut();
        audit.owner = new_owner;
        audit.touch(actor);
    }
}

/// An aggregate that can be hidden without being removed
pub trait SoftDeletable: Auditable {
    /// Human-readable entity name used in rejection messages
    const ENTITY: &'static str;

    fn deletion(&self) -> &Deletion;

    fn deletion_mut(&mut self) -> &mut Deletion;

    fn is_deleted(&self) -> bool {
        self.deletion().is_deleted
    }

    /// Rejects mutation of a soft-deleted record
    fn ensure_not_deleted(&self) -> Result<(), CoreError> {
        if self.is_deleted() {
            return Err(CoreError::invariant(format!(
                "Cannot modify a deleted {}",
                Self::ENTITY
            )));
        }
        Ok(())
    }

    fn soft_delete(&mut self, actor: &Actor) -> Result<(), CoreError> {
        if self.is_deleted() {
            return Err(CoreError::invariant(format!(
                "{} is already deleted",
                Self::ENTITY
            )));
        }
        self.deletion_mut().mark(actor);
        self.stamp_update(actor);
        Ok(())
    }

    fn restore(&mut self, actor: &Actor) -> Result<(), CoreError> {
        if !self.is_deleted() {
            return Err(CoreError::invariant(format!(
                "{} is not deleted",
                Self::ENTITY
            )));
        }
        self.deletion_mut().clear();
        self.stamp_update(actor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug, Clone)]
    struct Note {
        body: String,
        audit: AuditEnvelope,
        deletion: Deletion,
    }

    impl Auditable for Note {
        fn audit(&self) -> &AuditEnvelope {
            &self.audit
        }
        fn audit_mut(&mut self) -> &mut AuditEnvelope {
            &mut self.audit
        }
    }

    impl SoftDeletable for Note {
        const ENTITY: &'static str = "note";

        fn deletion(&self) -> &Deletion {
            &self.deletion
        }
        fn deletion_mut(&mut self) -> &mut Deletion {
            &mut self.deletion
        }
    }

    fn note(actor: &Actor) -> Note {
        Note {
            body: "hello".to_string(),
            audit: AuditEnvelope::new(actor, None),
            deletion: Deletion::default(),
        }
    }

    #[test]
    fn test_creator_owns_by_default() {
        let actor = Actor::new(UserId::new());
        let n = note(&actor);
        assert_eq!(n.audit.created_by, actor.user_id);
        assert_eq!(n.audit.last_modified_by, actor.user_id);
        assert_eq!(n.audit.owner, actor.user_id);
        assert_eq!(n.audit.version, 1);
    }

    #[test]
    fn test_explicit_owner() {
        let actor = Actor::new(UserId::new());
        let owner = UserId::new();
        let envelope = AuditEnvelope::new(&actor, Some(owner));
        assert_eq!(envelope.owner, owner);
        assert_eq!(envelope.created_by, actor.user_id);
    }

    #[test]
    fn test_stamp_update_records_modifier() {
        let creator = Actor::new(UserId::new());
        let editor = Actor::new(UserId::new());
        let mut n = note(&creator);
        n.stamp_update(&editor);
        assert_eq!(n.audit.created_by, creator.user_id);
        assert_eq!(n.audit.last_modified_by, editor.user_id);
        assert_eq!(n.audit.version, 2);
        assert!(n.audit.updated_at >= n.audit.created_at);
    }

    #[test]
    fn test_soft_delete_and_restore_round_trip() {
        let actor = Actor::new(UserId::new());
        let mut n = note(&actor);

        n.soft_delete(&actor).unwrap();
        assert!(n.is_deleted());
        assert!(n.deletion.deleted_at.is_some());
        assert_eq!(n.deletion.deleted_by, Some(actor.user_id));
        assert_eq!(
            n.ensure_not_deleted().unwrap_err().kind(),
            ErrorKind::InvariantViolation
        );

        n.restore(&actor).unwrap();
        assert_eq!(n.deletion, Deletion::default());
        assert_eq!(n.body, "hello");
        assert!(n.ensure_not_deleted().is_ok());
    }

    #[test]
    fn test_double_delete_and_spurious_restore_rejected() {
        let actor = Actor::new(UserId::new());
        let mut n = note(&actor);
        assert!(n.restore(&actor).is_err());
        n.soft_delete(&actor).unwrap();
        assert!(n.soft_delete(&actor).is_err());
    }

    #[test]
    fn test_transfer_ownership() {
        let actor = Actor::new(UserId::new());
        let heir = UserId::new();
        let mut n = note(&actor);
        n.transfer_ownership(&actor, heir);
        assert_eq!(n.audit.owner, heir);
        assert_eq!(n.audit.created_by, actor.user_id);
    }
}
