// Adapters layer: concrete renderers and external systems (chart, PDF, HubSpot forms).

pub mod chart;
pub mod hubspot;
pub mod pdf;

pub use chart::{render_break_even_svg, ChartGeometry};
pub use hubspot::{resolve_url_field, HubSpotClient, HubSpotConfig, SubmissionReceipt};
pub use pdf::render_estimate_pdf;
