use std::sync::Arc;

use axum::{extract::State, Json};

use crate::endpoint::EndpointRecord;
use crate::manager::{RpcManager, StatusReport};
use crate::queue::QueueStatus;

pub async fn get_status(State(manager): State<Arc<RpcManager>>) -> Json<StatusReport> {
    Json(manager.status())
}

pub async fn get_endpoints(State(manager): State<Arc<RpcManager>>) -> Json<Vec<EndpointRecord>> {
    Json(manager.endpoint_stats())
}

pub async fn get_queue(State(manager): State<Arc<RpcManager>>) -> Json<QueueStatus> {
    Json(manager.queue_status())
}
