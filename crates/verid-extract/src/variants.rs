//! Ordered key and label variants per identity field.
//!
//! Order is the contract: the first variant present wins. Lists cover
//! English plus a few Romance-language and Dutch labels and nothing else.

use verid_core::fields::IdentityField;

/// JSON object keys tried, in order, for `field`.
pub fn key_variants(field: IdentityField) -> &'static [&'static str] {
  match field {
    IdentityField::Name => &[
      "Name", "name", "full_name", "fullName", "Full Name", "firstName",
      "first_name", "First Name", "given_name", "givenName", "Given Name",
      "nom", "nombre", "nome", "naam",
    ],
    IdentityField::Surname => &[
      "Surname", "surname", "lastName", "last_name", "Last Name",
      "family_name", "familyName", "Family Name", "apellido", "apellidos",
      "cognome", "sobrenome", "achternaam",
    ],
    IdentityField::IdNumber => &[
      "ID Number", "id_number", "idNumber", "documentNumber",
      "document_number", "Document Number", "ID No", "numero",
      "numero_documento", "documentnummer",
    ],
    IdentityField::DateOfBirth => &[
      "Date of Birth", "date_of_birth", "dateOfBirth", "dob", "DOB",
      "birth_date", "birthDate", "Birth Date", "date_de_naissance",
      "fecha_de_nacimiento", "data_di_nascita", "geboortedatum",
    ],
    IdentityField::Nationality => &[
      "Nationality", "nationality", "nationalite", "nacionalidad",
      "nazionalita", "nationaliteit",
    ],
    IdentityField::DocumentType => &[
      "Document Type", "document_type", "documentType", "doc_type", "docType",
      "type_de_document", "tipo_de_documento", "tipo_documento",
    ],
  }
}

/// Free-text labels (matched case-insensitively before a `:`) tried, in
/// order, for `field`.
pub fn label_variants(field: IdentityField) -> &'static [&'static str] {
  match field {
    IdentityField::Name => &[
      "Name", "Full Name", "First Name", "Given Name", "Nom", "Nombre",
    ],
    IdentityField::Surname => &[
      "Surname", "Last Name", "Family Name", "Apellido", "Apellidos",
    ],
    IdentityField::IdNumber => &[
      "ID Number", "ID No", "Document Number", "Document No", "Card Number",
    ],
    IdentityField::DateOfBirth => &[
      "Date of Birth", "DOB", "Birth Date", "Fecha de Nacimiento",
      "Date de Naissance",
    ],
    IdentityField::Nationality => &["Nationality", "Nacionalidad", "Nationalité"],
    IdentityField::DocumentType => &[
      "Document Type", "Type of Document", "Tipo de Documento",
    ],
  }
}
