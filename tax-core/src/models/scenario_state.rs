//! Caller-owned scenario state.
//!
//! This is the record a front end persists between sessions. The engine
//! only ever reads it; every edit goes through the methods here and is
//! followed by a full recompute.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{NewProperty, PersonalProfile, Property, PropertyId, TaxYear};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("no property ids left to assign")]
    IdsExhausted,
}

/// Profile plus the ordered property list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioState {
    pub profile: PersonalProfile,
    pub properties: Vec<Property>,
    /// Id handed to the next property added. Never reused after removal.
    pub next_property_id: u32,
}

impl ScenarioState {
    pub fn new(selected_year: TaxYear) -> Self {
        Self {
            profile: PersonalProfile::new(selected_year),
            properties: Vec::new(),
            next_property_id: 1,
        }
    }

    pub fn selected_year(&self) -> TaxYear {
        self.profile.selected_year
    }

    /// Raises the id counter above every id already in use, so a state
    /// edited by hand cannot hand out a duplicate.
    pub fn normalize_ids(&mut self) {
        let floor = self
            .properties
            .iter()
            .map(|p| p.id.0.saturating_add(1))
            .max()
            .unwrap_or(1);
        self.next_property_id = self.next_property_id.max(floor);
    }

    /// Appends a property and returns its newly assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::IdsExhausted`] once the counter reaches
    /// `u32::MAX`; ids are never wrapped or reused.
    pub fn add_property(
        &mut self,
        property: NewProperty,
    ) -> Result<PropertyId, ScenarioError> {
        self.normalize_ids();
        let id = PropertyId(self.next_property_id);
        self.next_property_id = id.0.checked_add(1).ok_or(ScenarioError::IdsExhausted)?;
        self.properties.push(property.with_id(id));
        Ok(id)
    }

    /// Replaces the property with the same id. Returns `false` if no such
    /// property exists.
    pub fn update_property(
        &mut self,
        property: Property,
    ) -> bool {
        match self.properties.iter_mut().find(|p| p.id == property.id) {
            Some(slot) => {
                *slot = property;
                true
            }
            None => false,
        }
    }

    pub fn remove_property(
        &mut self,
        id: PropertyId,
    ) -> Option<Property> {
        let index = self.properties.iter().position(|p| p.id == id)?;
        Some(self.properties.remove(index))
    }

    pub fn property(
        &self,
        id: PropertyId,
    ) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }
}
