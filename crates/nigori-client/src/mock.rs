//! In-memory stores for tests.
//!
//! [`MockStore`] answers the four store routes for any number of endpoints,
//! checking token signatures and rejecting replayed `t` values the way a
//! real server does.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use nigori_crypto::{base64url_decode, base64url_encode, SchnorrSigner, SignaturePair, Signer};
use parking_lot::Mutex;

use crate::config::Endpoint;
use crate::error::ClientError;
use crate::transport::{
    Method, Request, Response, Transport, ADD_RESOURCE_PATH, AUTHENTICATE_PATH,
    LIST_RESOURCE_PATH, REGISTER_PATH,
};
use crate::types::WireRecord;

#[derive(Default)]
struct ServerState {
    users: HashMap<String, Vec<u8>>,
    seen: HashSet<(String, String)>,
    resources: HashMap<(String, String), Vec<WireRecord>>,
    unreachable: bool,
}

/// A set of in-memory stores, one per endpoint, created on first use.
pub struct MockStore<S = SchnorrSigner> {
    verifier: S,
    servers: Mutex<HashMap<Endpoint, ServerState>>,
}

impl MockStore<SchnorrSigner> {
    pub fn new() -> Self {
        Self::with_signer(SchnorrSigner)
    }
}

impl Default for MockStore<SchnorrSigner> {
    fn default() -> Self {
        Self::new()
    }
}

fn respond(status: u16, reason: &str, body: impl Into<String>) -> Response {
    Response {
        status,
        reason: reason.to_string(),
        body: body.into(),
    }
}

fn unauthorized(body: &str) -> Response {
    respond(401, "Unauthorized", body)
}

fn bad_request(body: &str) -> Response {
    respond(400, "Bad Request", body)
}

impl<S: Signer> MockStore<S> {
    /// Stores that verify tokens with `verifier`.
    pub fn with_signer(verifier: S) -> Self {
        Self {
            verifier,
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Make `endpoint` fail every request with a transport error.
    pub fn set_unreachable(&self, endpoint: &Endpoint, unreachable: bool) {
        self.servers
            .lock()
            .entry(endpoint.clone())
            .or_default()
            .unreachable = unreachable;
    }

    /// Obscured names held by `endpoint`, as the server sees them.
    pub fn raw_names(&self, endpoint: &Endpoint) -> Vec<String> {
        self.servers
            .lock()
            .get(endpoint)
            .map(|server| server.resources.keys().map(|(_, name)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of records `endpoint` holds across all users and names.
    pub fn record_count(&self, endpoint: &Endpoint) -> usize {
        self.servers
            .lock()
            .get(endpoint)
            .map(|server| server.resources.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Flip the last byte of every stored value on `endpoint`.
    pub fn corrupt_values(&self, endpoint: &Endpoint) {
        let mut servers = self.servers.lock();
        let Some(server) = servers.get_mut(endpoint) else {
            return;
        };
        for record in server.resources.values_mut().flatten() {
            if let Ok(mut bytes) = base64url_decode(&record.value) {
                if let Some(last) = bytes.last_mut() {
                    *last ^= 0x01;
                }
                record.value = base64url_encode(&bytes);
            }
        }
    }

    fn verify_token(&self, server: &mut ServerState, request: &Request<'_>) -> Result<String, Response> {
        let (Some(user), Some(t), Some(e), Some(s)) = (
            request.param("user"),
            request.param("t"),
            request.param("e"),
            request.param("s"),
        ) else {
            return Err(bad_request("missing authentication parameters"));
        };
        let Some(public_key) = server.users.get(user) else {
            return Err(unauthorized("unknown user"));
        };
        let (Ok(e), Ok(s)) = (base64url_decode(e), base64url_decode(s)) else {
            return Err(bad_request("malformed signature"));
        };
        if !self
            .verifier
            .verify(public_key, t.as_bytes(), &SignaturePair { e, s })
        {
            return Err(unauthorized("invalid signature"));
        }
        if !server.seen.insert((user.to_string(), t.to_string())) {
            return Err(unauthorized("replayed token"));
        }
        Ok(user.to_string())
    }

    fn handle(&self, server: &mut ServerState, request: &Request<'_>) -> Response {
        match (request.method, request.path) {
            (Method::Post, REGISTER_PATH) => {
                let (Some(user), Some(public_key)) =
                    (request.param("user"), request.param("publicKey"))
                else {
                    return bad_request("missing user or publicKey");
                };
                let Ok(public_key) = base64url_decode(public_key) else {
                    return bad_request("malformed publicKey");
                };
                if server.users.contains_key(user) {
                    return respond(409, "Conflict", "user already registered");
                }
                server.users.insert(user.to_string(), public_key);
                respond(200, "OK", "registered")
            }
            (Method::Post, AUTHENTICATE_PATH) => match self.verify_token(server, request) {
                Ok(_) => respond(200, "OK", "authenticated"),
                Err(response) => response,
            },
            (Method::Get, LIST_RESOURCE_PATH) => {
                let user = match self.verify_token(server, request) {
                    Ok(user) => user,
                    Err(response) => return response,
                };
                let Some(name) = request.param("name") else {
                    return bad_request("missing name");
                };
                let records = server
                    .resources
                    .get(&(user, name.to_string()))
                    .cloned()
                    .unwrap_or_default();
                match serde_json::to_string(&records) {
                    Ok(body) => respond(200, "OK", body),
                    Err(e) => respond(500, "Internal Server Error", e.to_string()),
                }
            }
            (Method::Post, ADD_RESOURCE_PATH) => {
                let user = match self.verify_token(server, request) {
                    Ok(user) => user,
                    Err(response) => return response,
                };
                let (Some(name), Some(value)) = (request.param("name"), request.param("value"))
                else {
                    return bad_request("missing name or value");
                };
                let creation_time = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or_default();
                let records = server
                    .resources
                    .entry((user, name.to_string()))
                    .or_default();
                records.push(WireRecord {
                    version: records.len() as i64 + 1,
                    creation_time,
                    value: value.to_string(),
                });
                respond(200, "OK", "added")
            }
            _ => respond(404, "Not Found", ""),
        }
    }
}

impl<S: Signer> Transport for MockStore<S> {
    fn send(&self, request: &Request<'_>) -> Result<Response, ClientError> {
        let mut servers = self.servers.lock();
        let server = servers.entry(request.endpoint.clone()).or_default();
        if server.unreachable {
            return Err(ClientError::Transport(format!(
                "connection refused: {}",
                request.endpoint
            )));
        }
        Ok(self.handle(server, request))
    }
}
