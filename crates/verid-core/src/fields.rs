//! Identity fields extracted from a document.
//!
//! Every field is best-effort: absence is a valid terminal state.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The logical fields the interpreter looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum IdentityField {
  Name,
  Surname,
  IdNumber,
  DateOfBirth,
  Nationality,
  DocumentType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIdentityFields {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub surname:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id_number:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date_of_birth: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub nationality:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub document_type: Option<String>,
}

impl ExtractedIdentityFields {
  pub fn get(&self, field: IdentityField) -> Option<&str> {
    self.slot(field).as_deref()
  }

  pub fn set(&mut self, field: IdentityField, value: String) {
    *self.slot_mut(field) = Some(value);
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.surname.is_none()
      && self.id_number.is_none()
      && self.date_of_birth.is_none()
      && self.nationality.is_none()
      && self.document_type.is_none()
  }

  fn slot(&self, field: IdentityField) -> &Option<String> {
    match field {
      IdentityField::Name => &self.name,
      IdentityField::Surname => &self.surname,
      IdentityField::IdNumber => &self.id_number,
      IdentityField::DateOfBirth => &self.date_of_birth,
      IdentityField::Nationality => &self.nationality,
      IdentityField::DocumentType => &self.document_type,
    }
  }

  fn slot_mut(&mut self, field: IdentityField) -> &mut Option<String> {
    match field {
      IdentityField::Name => &mut self.name,
      IdentityField::Surname => &mut self.surname,
      IdentityField::IdNumber => &mut self.id_number,
      IdentityField::DateOfBirth => &mut self.date_of_birth,
      IdentityField::Nationality => &mut self.nationality,
      IdentityField::DocumentType => &mut self.document_type,
    }
  }
}
