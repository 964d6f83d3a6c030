//! Contact table: the set of currently-tracked input contacts.
//!
//! One entry per live pointer id. Entries are created by `entered`,
//! mutated by `moved`/`pressed`/`released`, and removed by `exited`.
//! The table is owned and mutated exclusively by the render thread, so
//! it needs no internal locking.

use std::collections::HashMap;

use crate::error::ProtocolViolation;
use crate::geometry::Point;

/// Kind of input device behind a contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    Mouse,
    Pen,
    Touch,
}

/// One tracked pointer interaction point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Stable id assigned by the input stack for the contact's lifetime.
    pub id: u32,
    pub device: DeviceKind,
    /// True while the contact is in physical or simulated contact.
    pub pressed: bool,
    /// Last known position in panel logical units.
    pub position: Point,
}

/// In-memory map of active contacts keyed by pointer id.
#[derive(Debug, Default)]
pub struct ContactTable {
    contacts: HashMap<u32, Contact>,
}

impl ContactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new contact.
    ///
    /// A duplicate id means the input stack delivered two entered events
    /// without an exited in between. That is a stack invariant violation,
    /// not recoverable here.
    pub fn entered(
        &mut self,
        id: u32,
        device: DeviceKind,
        in_contact: bool,
        position: Point,
    ) -> Result<(), ProtocolViolation> {
        if self.contacts.contains_key(&id) {
            return Err(ProtocolViolation::DuplicateContact { id });
        }

        self.contacts.insert(
            id,
            Contact {
                id,
                device,
                pressed: in_contact,
                position,
            },
        );
        Ok(())
    }

    /// Remove a contact.
    ///
    /// An exit for an untracked id can legitimately race renderer startup
    /// or teardown, so it is logged and tolerated. Returns whether an
    /// entry was actually removed.
    pub fn exited(&mut self, id: u32) -> bool {
        if self.contacts.remove(&id).is_some() {
            true
        } else {
            log::warn!("[ContactTable] Untracked pointer {} exit", id);
            false
        }
    }

    /// Update a contact's position.
    pub fn moved(&mut self, id: u32, position: Point) -> Result<(), ProtocolViolation> {
        let contact = self
            .contacts
            .get_mut(&id)
            .ok_or(ProtocolViolation::UntrackedContact { id, event: "moved" })?;

        contact.position = position;
        Ok(())
    }

    /// Mark a contact as pressed.
    ///
    /// The event must report the pointer as in contact; anything else
    /// contradicts the event kind.
    pub fn pressed(&mut self, id: u32, in_contact: bool) -> Result<(), ProtocolViolation> {
        if !in_contact {
            return Err(ProtocolViolation::NotInContact { id });
        }

        let contact = self.contacts.get_mut(&id).ok_or(
            ProtocolViolation::UntrackedContact {
                id,
                event: "pressed",
            },
        )?;

        contact.pressed = true;
        Ok(())
    }

    /// Mark a contact as released.
    ///
    /// The event must report the pointer as no longer in contact.
    pub fn released(&mut self, id: u32, in_contact: bool) -> Result<(), ProtocolViolation> {
        if in_contact {
            return Err(ProtocolViolation::StillInContact { id });
        }

        let contact = self.contacts.get_mut(&id).ok_or(
            ProtocolViolation::UntrackedContact {
                id,
                event: "released",
            },
        )?;

        contact.pressed = false;
        Ok(())
    }

    /// Number of contacts currently pressed.
    pub fn pressed_count(&self) -> usize {
        self.contacts.values().filter(|c| c.pressed).count()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    /// Iterate over all tracked contacts. Order is unspecified and must
    /// not affect rendering correctness.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }
}
