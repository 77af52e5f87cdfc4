//! Requested products and the product list grammar.
//!
//! A product list is a comma-separated sequence of `id[:quantity[:maxPrice]]`
//! entries. Quantity defaults to 1 and must be at least 1; the price ceiling
//! defaults to unbounded and must be non-negative. Any malformed entry rejects
//! the whole list so that no network call is made on bad input.

use std::fmt;

use thiserror::Error;

/// One item the user wants to buy. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedProduct {
    /// Storefront product (SKU) identifier.
    pub id: String,
    /// Quantity to place in the cart (at least 1).
    pub quantity: u32,
    /// Highest acceptable unit price; `f64::INFINITY` when unbounded.
    pub max_price: f64,
}

impl ExpectedProduct {
    /// Creates a product request with quantity 1 and no price ceiling.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            quantity: 1,
            max_price: f64::INFINITY,
        }
    }

    /// Sets the requested quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the price ceiling.
    #[must_use]
    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = max_price;
        self
    }
}

impl fmt::Display for ExpectedProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max_price.is_finite() {
            write!(f, "{} x{} (<= {:.2})", self.id, self.quantity, self.max_price)
        } else {
            write!(f, "{} x{}", self.id, self.quantity)
        }
    }
}

/// Errors produced while parsing a product list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductListError {
    /// The entry has no product ID.
    #[error("entry {index} ('{entry}'): missing product ID\n  Suggestion: use id[:quantity[:maxPrice]]")]
    MissingId {
        /// 1-based entry position.
        index: usize,
        /// The raw entry text.
        entry: String,
    },

    /// The quantity is not an integer of at least 1.
    #[error("entry {index} ('{entry}'): invalid quantity '{value}'\n  Suggestion: quantity must be a whole number >= 1")]
    InvalidQuantity {
        /// 1-based entry position.
        index: usize,
        /// The raw entry text.
        entry: String,
        /// The offending field.
        value: String,
    },

    /// The price ceiling is not a non-negative number.
    #[error("entry {index} ('{entry}'): invalid max price '{value}'\n  Suggestion: max price must be a number >= 0")]
    InvalidPrice {
        /// 1-based entry position.
        index: usize,
        /// The raw entry text.
        entry: String,
        /// The offending field.
        value: String,
    },

    /// The entry has more than three `:`-separated fields.
    #[error("entry {index} ('{entry}'): too many fields\n  Suggestion: use id[:quantity[:maxPrice]]")]
    TooManyFields {
        /// 1-based entry position.
        index: usize,
        /// The raw entry text.
        entry: String,
    },
}

/// Parses a product list such as `"111:2:300,222"`.
///
/// An empty (or all-whitespace) list yields no products. Order is preserved.
///
/// # Errors
///
/// Returns the first [`ProductListError`] encountered; nothing is returned
/// for the remaining entries.
pub fn parse_product_list(input: &str) -> Result<Vec<ExpectedProduct>, ProductListError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    input
        .split(',')
        .enumerate()
        .map(|(idx, entry)| parse_entry(idx + 1, entry))
        .collect()
}

fn parse_entry(index: usize, entry: &str) -> Result<ExpectedProduct, ProductListError> {
    let fields: Vec<&str> = entry.split(':').map(str::trim).collect();
    if fields.len() > 3 {
        return Err(ProductListError::TooManyFields {
            index,
            entry: entry.to_string(),
        });
    }

    let id = fields[0];
    if id.is_empty() {
        return Err(ProductListError::MissingId {
            index,
            entry: entry.to_string(),
        });
    }

    let quantity = match fields.get(1) {
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|quantity| *quantity >= 1)
            .ok_or_else(|| ProductListError::InvalidQuantity {
                index,
                entry: entry.to_string(),
                value: (*value).to_string(),
            })?,
        None => 1,
    };

    let max_price = match fields.get(2) {
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|price| !price.is_nan() && *price >= 0.0)
            .ok_or_else(|| ProductListError::InvalidPrice {
                index,
                entry: entry.to_string(),
                value: (*value).to_string(),
            })?,
        None => f64::INFINITY,
    };

    Ok(ExpectedProduct {
        id: id.to_string(),
        quantity,
        max_price,
    })
}
