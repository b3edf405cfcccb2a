//! Plain-data messages exchanged with decimation workers.
//!
//! Everything crossing the thread boundary is serialized to JSON first, so a
//! request can only carry data: the decimator key, scale snapshots, the
//! visible window and a copy of the buffer contents.

use serde::{Deserialize, Serialize};

use crate::core::{Buffer, DataPoint, SeriesBuffer, TraceBuffer, TraceInterval};
use crate::decimation::{DecimatedValues, DecimatorKey, DecimatorScales, SeriesValues};
use crate::error::ChartResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum PayloadValues {
    Points(Vec<DataPoint>),
    Intervals(Vec<TraceInterval>),
}

impl From<&SeriesValues> for PayloadValues {
    fn from(values: &SeriesValues) -> Self {
        match values {
            SeriesValues::Points(buffer) => Self::Points(buffer.data()),
            SeriesValues::Intervals(buffer) => Self::Intervals(buffer.data()),
        }
    }
}

impl From<PayloadValues> for SeriesValues {
    fn from(values: PayloadValues) -> Self {
        match values {
            PayloadValues::Points(points) => Self::Points(SeriesBuffer::from(points)),
            PayloadValues::Intervals(intervals) => Self::Intervals(TraceBuffer::from(intervals)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub request_id: u64,
    pub key: DecimatorKey,
    pub scales: DecimatorScales,
    pub x_start: Option<f64>,
    pub x_end: Option<f64>,
    pub values: PayloadValues,
}

impl WorkerRequest {
    pub fn to_message(&self) -> ChartResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_message(message: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(message)?)
    }

    /// Rebuilds the decimator named by `key` and runs it on the payload.
    pub fn execute(self) -> ChartResult<DecimatedValues> {
        let mut decimator = self.key.create();
        decimator.initialize(self.scales);
        decimator.decimate_values(self.x_start, self.x_end, &self.values.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerResponse {
    Done {
        #[serde(rename = "requestId")]
        request_id: u64,
        values: DecimatedValues,
    },
    Failed {
        #[serde(rename = "requestId")]
        request_id: u64,
        message: String,
    },
}

impl WorkerResponse {
    #[must_use]
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Done { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }

    pub fn to_message(&self) -> ChartResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_message(message: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(message)?)
    }
}

/// Worker-side entry point: one request message in, one response message out.
#[must_use]
pub fn handle_request_message(message: &str) -> String {
    let response = match WorkerRequest::from_message(message) {
        Ok(request) => {
            let request_id = request.request_id;
            match request.execute() {
                Ok(values) => WorkerResponse::Done { request_id, values },
                Err(err) => WorkerResponse::Failed {
                    request_id,
                    message: err.to_string(),
                },
            }
        }
        Err(err) => WorkerResponse::Failed {
            request_id: 0,
            message: err.to_string(),
        },
    };
    response.to_message().unwrap_or_else(|err| {
        format!("{{\"status\":\"failed\",\"requestId\":0,\"message\":\"{err}\"}}")
    })
}
