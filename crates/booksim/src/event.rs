use serde::Serialize;

use crate::request::RequestId;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum BookingEvent {
    Arrival,
    ServiceComplete { request: RequestId },
    AbandonTimeout { request: RequestId },
    AutoscaleCheck,
}
