//! carbonapi v3 protocol buffers.
//!
//! Each series becomes a [`FetchResponse`](carbonfmt_types::FetchResponse)
//! built from its raw data, wrapped in a
//! [`MultiFetchResponse`](carbonfmt_types::MultiFetchResponse). Values pass
//! through unchanged, NaN included.

use carbonfmt_types::MultiFetchResponse;
use prost::Message;

use crate::error::EncodeError;
use crate::series::MetricData;

/// Encode a batch as a `MultiFetchResponse`. An empty batch yields no bytes.
pub fn marshal_protobuf(results: &[MetricData]) -> Result<Vec<u8>, EncodeError> {
    let response = MultiFetchResponse {
        metrics: results.iter().map(MetricData::to_fetch_response).collect(),
    };

    let mut buf = Vec::with_capacity(response.encoded_len());
    response.encode(&mut buf)?;
    Ok(buf)
}
