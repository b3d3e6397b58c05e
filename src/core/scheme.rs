//! Scheme-qualified identifiers and the tax category lookup key.

use serde::Serialize;

use super::error::ConversionError;

/// An identifier value with an optional identification scheme,
/// e.g. `TaxCategory/ID schemeID="UNCL5305"` → `(Some("UNCL5305"), "S")`.
///
/// Equality, ordering and hashing are structural. An absent scheme is a
/// value of its own and never matches a present one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SchemedId {
    scheme: Option<String>,
    id: String,
}

impl SchemedId {
    /// Create an identifier. Fails if `id` is empty or whitespace.
    /// An empty scheme is treated as absent.
    pub fn new(scheme: Option<&str>, id: &str) -> Result<Self, ConversionError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ConversionError::invalid("identifier value must not be empty"));
        }
        let scheme = scheme
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        Ok(Self {
            scheme,
            id: id.to_string(),
        })
    }

    /// Identifier without a scheme.
    pub fn plain(id: &str) -> Result<Self, ConversionError> {
        Self::new(None, id)
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for SchemedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scheme {
            Some(scheme) => write!(f, "{scheme}:{}", self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// Compound key of a tax category: the tax scheme (`TaxScheme/ID`, usually
/// "VAT") and the category code (`TaxCategory/ID`, e.g. "S", "AA", "E").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TaxCategoryKey {
    category_scheme: SchemedId,
    category_id: SchemedId,
}

impl TaxCategoryKey {
    pub fn new(category_scheme: SchemedId, category_id: SchemedId) -> Self {
        Self {
            category_scheme,
            category_id,
        }
    }

    /// Shorthand for keys without schemes, e.g. `("VAT", "S")`.
    pub fn from_codes(scheme: &str, category: &str) -> Result<Self, ConversionError> {
        Ok(Self::new(
            SchemedId::plain(scheme)?,
            SchemedId::plain(category)?,
        ))
    }

    pub fn category_scheme(&self) -> &SchemedId {
        &self.category_scheme
    }

    pub fn category_id(&self) -> &SchemedId {
        &self.category_id
    }

    /// Bare category code (UNCL 5305), used for the target `TaxCategoryCode`.
    pub fn category_code(&self) -> &str {
        self.category_id.id()
    }
}

impl std::fmt::Display for TaxCategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category_scheme, self.category_id)
    }
}
