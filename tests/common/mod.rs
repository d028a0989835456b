//! Scripted collaborators for engine tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use novel_files::transport::{MultipartBody, Transport, TransportError};
use novel_files::{Notice, Notifier};
use serde_json::{json, Value};
use tokio::sync::oneshot;

pub type Reply = Result<Bytes, TransportError>;

pub enum Scripted {
    Now(Reply),
    /// Resolves when the test sends on the paired channel.
    Deferred(oneshot::Receiver<Reply>),
}

impl Scripted {
    async fn resolve(self) -> Reply {
        match self {
            Scripted::Now(reply) => reply,
            Scripted::Deferred(rx) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Request("reply dropped".into()))),
        }
    }
}

/// In-memory transport that replays queued replies and records requests.
/// GET replies registered for a specific query string take precedence over
/// the queue.
#[derive(Default)]
pub struct ScriptedTransport {
    gets: Mutex<VecDeque<Scripted>>,
    gets_by_query: Mutex<HashMap<String, Scripted>>,
    posts: Mutex<VecDeque<Scripted>>,
    pub get_calls: Mutex<Vec<(String, String)>>,
    pub post_calls: Mutex<Vec<(String, MultipartBody)>>,
}

impl ScriptedTransport {
    pub fn push_get(&self, reply: Reply) {
        self.gets.lock().unwrap().push_back(Scripted::Now(reply));
    }

    pub fn defer_get(&self, query: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gets_by_query
            .lock()
            .unwrap()
            .insert(query.to_string(), Scripted::Deferred(rx));
        tx
    }

    pub fn push_post(&self, reply: Reply) {
        self.posts.lock().unwrap().push_back(Scripted::Now(reply));
    }

    pub fn defer_post(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.posts
            .lock()
            .unwrap()
            .push_back(Scripted::Deferred(rx));
        tx
    }

    pub fn get_queries(&self) -> Vec<String> {
        self.get_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, q)| q.clone())
            .collect()
    }

    pub fn last_post(&self) -> Option<MultipartBody> {
        self.post_calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, endpoint: &str, query: &str) -> Result<Bytes, TransportError> {
        self.get_calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), query.to_string()));

        let keyed = self.gets_by_query.lock().unwrap().remove(query);
        let scripted = keyed.or_else(|| self.gets.lock().unwrap().pop_front());
        match scripted {
            Some(s) => s.resolve().await,
            None => Err(TransportError::Request("no scripted GET reply".into())),
        }
    }

    async fn post_multipart(
        &self,
        endpoint: &str,
        body: MultipartBody,
    ) -> Result<Bytes, TransportError> {
        self.post_calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body));

        let scripted = self.posts.lock().unwrap().pop_front();
        match scripted {
            Some(s) => s.resolve().await,
            None => Err(TransportError::Request("no scripted POST reply".into())),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

// ============================================================================
// Response builders
// ============================================================================

pub fn file_json(id: &str, name: &str, mime: &str, category: Option<&str>) -> Value {
    json!({
        "id": id,
        "fileName": name,
        "fileType": mime,
        "fileSize": 1024,
        "category": category,
        "createdAt": "2024-05-01T08:30:00Z",
    })
}

pub fn page_body(files: Vec<Value>, total: u64) -> Reply {
    Ok(Bytes::from(
        json!({ "files": files, "pagination": { "total": total } }).to_string(),
    ))
}

pub fn upload_body(file: Value) -> Reply {
    Ok(Bytes::from(json!({ "file": file }).to_string()))
}

pub fn server_error(status: u16, message: Option<&str>) -> Reply {
    Err(TransportError::Status {
        status,
        message: message.map(str::to_string),
    })
}
