//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: links from upstream content and configured API endpoints
//! - **Text processing**: character-aware truncation, HTML tag stripping, control
//!   character removal, `<img src>` discovery
//!
//! # Examples
//!
//! ```
//! use glean::util::{strip_html_tags, truncate_chars, validate_link};
//!
//! let url = validate_link("https://medium.com/@devpicon/post").unwrap();
//! assert_eq!(url.host_str(), Some("medium.com"));
//!
//! let plain = strip_html_tags("<p>Hola <em>mundo</em></p>");
//! assert_eq!(truncate_chars(&plain, 4), "Hola");
//! ```

mod text;
mod url_validator;

pub use text::{first_img_src, strip_control_chars, strip_html_tags, truncate_chars};
pub use url_validator::{validate_endpoint, validate_link, UrlValidationError};

/// Maximum description length, in characters, for items built from free-form text.
pub const MAX_DESCRIPTION_CHARS: usize = 200;
