//! essaymark-report: page rendering for essay evaluations.
//!
//! Turns a [`ViewState`](essaymark_core::view::ViewState) into a
//! self-contained HTML page with the annotated essay, the score summary and
//! the sentence-by-sentence analysis.

pub mod html;

pub use html::{render_page, write_html_report, SESSION_HEADER};
