//! PDF renderer for laid-out documents.
//!
//! [`LopdfRenderer`] turns a [`client_report_types::LaidOutDocument`] into PDF
//! bytes. Objects are assembled by [`PdfWriter`], a small writer that emits
//! the cross-reference table itself so page content can be produced one page
//! at a time.

mod error;
mod images;
mod page;
mod renderer;
mod writer;

pub use error::RenderError;
pub use images::decode_image;
pub use renderer::LopdfRenderer;
pub use writer::PdfWriter;
