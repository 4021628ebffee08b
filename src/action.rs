//! External action hook.
//!
//! The controller does not know what an action is (an attack, an interaction,
//! an emote). It only decides when one may fire: the action button is held and
//! the character is not climbing.

use bevy::prelude::*;

/// Something the character can do when the action button is held.
pub trait CharacterAction: Send + Sync + 'static {
    /// Fire the action for `character`. Called once per tick while held.
    fn perform(&mut self, character: Entity);
}

impl<F> CharacterAction for F
where
    F: FnMut(Entity) + Send + Sync + 'static,
{
    fn perform(&mut self, character: Entity) {
        self(character)
    }
}

/// Holds the character's current action, if any. An empty slot is inert.
#[derive(Component, Default)]
pub struct ActionSlot {
    action: Option<Box<dyn CharacterAction>>,
}

impl std::fmt::Debug for ActionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSlot")
            .field("equipped", &self.action.is_some())
            .finish()
    }
}

impl ActionSlot {
    /// Create a slot holding `action`.
    pub fn new(action: impl CharacterAction) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// Replace the current action.
    pub fn set_action(&mut self, action: impl CharacterAction) {
        self.action = Some(Box::new(action));
    }

    /// Remove the current action.
    pub fn clear(&mut self) {
        self.action = None;
    }

    pub fn is_equipped(&self) -> bool {
        self.action.is_some()
    }

    /// Fire the action if one is equipped. Returns whether anything fired.
    pub fn perform(&mut self, character: Entity) -> bool {
        match self.action.as_mut() {
            Some(action) => {
                action.perform(character);
                true
            }
            None => false,
        }
    }
}
