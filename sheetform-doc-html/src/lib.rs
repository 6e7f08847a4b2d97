//! # sheetform-doc-html
//!
//! Render sheetform questions as a fillable HTML form.
//!
//! Sections become `<section>` blocks with a heading. Each question gets the
//! control [`sheetform::Control`] selects for it, prefilled from the current
//! answers, with inline messages for fields that failed validation.
//!
//! ```rust,ignore
//! use sheetform_doc_html::{HtmlOptions, to_html_with_options};
//!
//! let html = to_html_with_options(&form, &HtmlOptions::new().with_title("Tenant survey"));
//! std::fs::write("tenant.html", html)?;
//! ```

mod generator;

pub use generator::{HtmlOptions, render, to_html, to_html_with_options};
