#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use serde_json::{Value, json};
use switchbot_meter_database::{
    error::StorageError,
    sink::StorageSink,
    switchbot::{ApiError, SensorReading, SwitchBotApi},
};

#[derive(Debug, Clone)]
pub enum StatusReply {
    Ok(Value),
    HttpError(u16),
    Hang,
}

pub fn meter_status(device_id: &str) -> StatusReply {
    StatusReply::Ok(json!({
        "device_id": device_id,
        "device_type": "Meter",
        "temperature": 22.4,
        "humidity": 48,
        "battery": 100
    }))
}

pub fn hub2_status(device_id: &str) -> StatusReply {
    StatusReply::Ok(json!({
        "device_id": device_id,
        "device_type": "Hub 2",
        "temperature": "19.5",
        "humidity": "55",
        "light_level": 9
    }))
}

/// In-memory SwitchBot API with per-device scripted status replies.
#[derive(Default)]
pub struct MockApi {
    devices: Mutex<Vec<(String, String)>>,
    replies: Mutex<HashMap<String, StatusReply>>,
    fail_listing: AtomicBool,
    list_calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, device_id: &str, device_type: &str, reply: StatusReply) {
        self.devices
            .lock()
            .unwrap()
            .push((device_id.to_string(), device_type.to_string()));
        self.replies
            .lock()
            .unwrap()
            .insert(device_id.to_string(), reply);
    }

    pub fn remove_device(&self, device_id: &str) {
        self.devices.lock().unwrap().retain(|(id, _)| id != device_id);
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl SwitchBotApi for MockApi {
    async fn list_devices(&self) -> Result<Value, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ApiError::Http { status: 503 });
        }

        let device_list: Vec<Value> = self
            .devices
            .lock()
            .unwrap()
            .iter()
            .map(|(id, t)| json!({"device_id": id, "device_type": t, "device_name": id}))
            .collect();

        Ok(json!({ "device_list": device_list, "infrared_remote_list": [] }))
    }

    async fn device_status(&self, device_id: &str) -> Result<Value, ApiError> {
        self.fetched.lock().unwrap().push(device_id.to_string());
        let reply = self.replies.lock().unwrap().get(device_id).cloned();

        match reply {
            Some(StatusReply::Ok(body)) => Ok(body),
            Some(StatusReply::HttpError(status)) => Err(ApiError::Http { status }),
            Some(StatusReply::Hang) => std::future::pending().await,
            None => Err(ApiError::Api {
                status_code: 190,
                message: "device not found".to_string(),
            }),
        }
    }
}

/// Sink that keeps every accepted reading and rejects writes for selected devices.
#[derive(Default)]
pub struct RecordingSink {
    written: Mutex<Vec<SensorReading>>,
    rejecting: Mutex<HashSet<String>>,
    write_calls: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&self, device_id: &str) {
        self.rejecting.lock().unwrap().insert(device_id.to_string());
    }

    pub fn written(&self) -> Vec<SensorReading> {
        self.written.lock().unwrap().clone()
    }

    pub fn written_ids(&self) -> Vec<String> {
        self.written()
            .into_iter()
            .map(|r| r.device_id)
            .collect()
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }
}

impl StorageSink for RecordingSink {
    async fn write(&self, reading: &SensorReading) -> Result<(), StorageError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        if self.rejecting.lock().unwrap().contains(&reading.device_id) {
            return Err(StorageError::InfluxRejected {
                status: 503,
                body: "backend unreachable".to_string(),
            });
        }

        self.written.lock().unwrap().push(reading.clone());
        Ok(())
    }
}
