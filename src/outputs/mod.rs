//! Output generation for stage results.
//!
//! - [`json`]: envelopes results and writes them to dated JSON files
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── search-dragon.json
//!     ├── detail-dragons-path.json
//!     └── content-1.json
//! ```

pub mod json;
