//! Scripted in-memory transport for tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use view_session_core::{Payload, Response, Transport, TransportError, protocol::JOB_ID_KEY};

/// Scripted reply: a JSON body or a transport failure.
pub type Reply = Result<Value, ()>;

pub fn ok(value: Value) -> Reply {
    Ok(value)
}

pub fn fail() -> Reply {
    Err(())
}

/// A recorded exchange.
#[derive(Debug, Clone)]
pub struct Call {
    pub address: String,
    pub payload: Payload,
    /// Time since the transport was created.
    pub at: Duration,
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<Reply>>,
    jobs: HashMap<String, VecDeque<Reply>>,
    fallback: HashMap<String, Reply>,
    calls: Vec<Call>,
}

/// Transport answering from per-address reply queues.
///
/// Replies queued for the payload's job id are used first, then those
/// queued for the address, then the address's fallback. An address with
/// none of these fails with `TransportError::Closed`.
pub struct ScriptedTransport {
    started: Instant,
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            script: Mutex::new(Script::default()),
        })
    }

    /// Queue a one-shot reply for `address`.
    pub fn reply(&self, address: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(address.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Queue a one-shot reply for a status poll of `job_id`.
    pub fn reply_for_job(&self, job_id: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .jobs
            .entry(job_id.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Reply used for `address` once its queue is empty.
    pub fn always(&self, address: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .fallback
            .insert(address.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, address: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.address == address)
            .collect()
    }

    pub fn call_times(&self, address: &str) -> Vec<Duration> {
        self.calls_to(address).into_iter().map(|call| call.at).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(&self, address: &str, payload: &Payload) -> Result<Response, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call {
            address: address.to_string(),
            payload: payload.clone(),
            at: self.started.elapsed(),
        });

        let for_job = match payload.get(JOB_ID_KEY).and_then(Value::as_str) {
            Some(job_id) => script.jobs.get_mut(job_id).and_then(VecDeque::pop_front),
            None => None,
        };
        let queued = for_job.or_else(|| script.queued.get_mut(address).and_then(VecDeque::pop_front));
        let reply = queued.or_else(|| script.fallback.get(address).cloned());

        match reply {
            Some(Ok(value)) => Ok(Response::new(value)),
            Some(Err(())) => Err(TransportError::Request(format!("{address} unreachable"))),
            None => Err(TransportError::Closed),
        }
    }
}
