//! # carbonfmt-types
//!
//! Wire records for fetched metric series. These are the protocol buffer
//! messages exchanged between graphite-compatible storage backends and
//! render frontends (the carbonapi v3 fetch schema).
//!
//! The records are plain `prost` messages: they can be decoded from what a
//! storage backend returned and encoded back without any transformation.
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` derives for the records
//!
//! ## Example
//!
//! ```rust
//! use carbonfmt_types::{FetchResponse, MultiFetchResponse};
//! use prost::Message;
//!
//! let response = MultiFetchResponse {
//!     metrics: vec![FetchResponse {
//!         name: "servers.web01.cpu".to_string(),
//!         start_time: 0,
//!         stop_time: 30,
//!         step_time: 10,
//!         values: vec![1.0, f64::NAN, 3.0],
//!         ..Default::default()
//!     }],
//! };
//!
//! let bytes = response.encode_to_vec();
//! let decoded = MultiFetchResponse::decode(bytes.as_slice()).unwrap();
//! assert_eq!(decoded.metrics[0].name, "servers.web01.cpu");
//! ```

mod fetch;

pub use fetch::*;
