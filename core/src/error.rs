//! Error types for promo-code validation.
//!
//! Business-rule rejections (expired, over the limit, wrong event...) are not
//! errors; they are [`crate::promo::Rejection`] values. This module only covers
//! bad input and infrastructure failures.

use thiserror::Error;

/// Result type alias for promo operations.
pub type Result<T> = std::result::Result<T, PromoError>;

/// Failures that prevent a promo code from being evaluated at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromoError {
    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════

    /// Ticket quantity was zero or negative.
    #[error("Ticket quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    /// Unknown discount type in a catalog record.
    #[error("Unknown discount type: {0}")]
    UnknownDiscountType(String),

    /// Unknown membership tier.
    #[error("Unknown membership tier: {0}")]
    UnknownTier(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Order total does not fit in the money representation.
    #[error("Order total overflows")]
    PriceOverflow,

    /// Catalog store failed (unreachable, malformed row, poisoned lock).
    #[error("Catalog store error: {0}")]
    Store(String),
}

impl PromoError {
    /// Whether the error was caused by the caller's input rather than the system.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidQuantity(_) | Self::UnknownTier(_))
    }
}
