//! Price perception - finds checkout-total candidates in a rendered document
//!
//! This crate implements the deterministic half of total extraction:
//! - A read-only document query interface with an HTML implementation
//! - Keyword + currency filtering of short text fragments
//! - Selector generation and re-resolution
//! - Currency amount parsing with sanity bounds
//! - Checkout page detection and the opt-in keyword-selector heuristic

pub mod currency;
pub mod document;
pub mod errors;
pub mod heuristics;
pub mod keywords;
pub mod scanner;
pub mod selector;

pub use currency::{extract_amount, has_currency, parse_amount};
pub use document::{DocumentQuery, HtmlDocument, NodeRef};
pub use errors::DomError;
pub use heuristics::{extract_price_manually, is_checkout_page};
pub use keywords::{contains_price_indicators, PRICE_KEYWORDS};
pub use scanner::{CandidateScanner, ScannerConfig};
pub use selector::{build_selector, css_escape, resolve_selector};
