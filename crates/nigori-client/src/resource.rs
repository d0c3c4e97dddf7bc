//! Typed, named, encrypted resources on a remote store.
//!
//! add:  derive keys → permute(type, name) → encrypt(value) → sign token → POST
//! list: derive keys → permute(type, name) → sign token → GET → decrypt each

use nigori_crypto::{
    base64url_encode, decrypt_base64url, encrypt, permute, PasswordKeys, SchnorrSigner, Signer,
};

use crate::auth::AuthToken;
use crate::codec::resource_name;
use crate::config::{ClientConfig, Endpoint};
use crate::error::ClientError;
use crate::transport::{
    Method, Request, Response, Transport, ADD_RESOURCE_PATH, AUTHENTICATE_PATH,
    LIST_RESOURCE_PATH, REGISTER_PATH,
};
use crate::types::{StoredRecord, WireRecord};

/// Client for one user's resources, talking through a [`Transport`].
pub struct ResourceClient<T, S = SchnorrSigner> {
    config: ClientConfig,
    transport: T,
    signer: S,
}

impl<T: Transport> ResourceClient<T, SchnorrSigner> {
    /// Client using the default Schnorr signer.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self::with_signer(config, transport, SchnorrSigner)
    }
}

impl<T: Transport, S: Signer> ResourceClient<T, S> {
    pub fn with_signer(config: ClientConfig, transport: T, signer: S) -> Self {
        Self {
            config,
            transport,
            signer,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Derive this client's keys for `password`.
    pub fn derive_keys(&self, password: &str) -> PasswordKeys {
        PasswordKeys::derive(password.as_bytes(), self.config.cipher)
    }

    /// Publish the public verification key for `user`.
    ///
    /// One-time bootstrap; carries no token, so it is not replay-protected.
    pub fn register(&self, user: &str, password: &str) -> Result<String, ClientError> {
        self.register_at(&self.config.endpoint, user, password)
    }

    /// [`ResourceClient::register`] against a specific endpoint.
    pub fn register_at(
        &self,
        endpoint: &Endpoint,
        user: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let keys = self.derive_keys(password);
        let public_key = self.signer.public_key(&keys.signer())?;
        let request = Request {
            method: Method::Post,
            endpoint,
            path: REGISTER_PATH,
            params: vec![
                ("user", user.to_string()),
                ("publicKey", base64url_encode(&public_key)),
            ],
        };
        let response = self.exchange(&request)?;
        tracing::info!(user, endpoint = %endpoint, "registered");
        Ok(response.body)
    }

    /// Prove possession of the signing key with a fresh token.
    pub fn authenticate(&self, user: &str, password: &str) -> Result<String, ClientError> {
        let keys = self.derive_keys(password);
        let token = AuthToken::build(user, &keys, &self.signer)?;
        self.authenticate_with(&token)
    }

    /// Send a prebuilt token to `/authenticate`.
    ///
    /// Sending the same token twice must fail on the second attempt; this
    /// exists to exercise that.
    pub fn authenticate_with(&self, token: &AuthToken) -> Result<String, ClientError> {
        let request = Request {
            method: Method::Post,
            endpoint: &self.config.endpoint,
            path: AUTHENTICATE_PATH,
            params: token.params(),
        };
        Ok(self.exchange(&request)?.body)
    }

    /// Append `value` under `(resource_type, name)`.
    pub fn add(
        &self,
        user: &str,
        password: &str,
        resource_type: u32,
        name: &[u8],
        value: &[u8],
    ) -> Result<String, ClientError> {
        let keys = self.derive_keys(password);
        self.add_with_keys(&self.config.endpoint, user, &keys, resource_type, name, value)
    }

    /// List every record under `(resource_type, name)`, decrypted, in
    /// server order.
    pub fn list(
        &self,
        user: &str,
        password: &str,
        resource_type: u32,
        name: &[u8],
    ) -> Result<Vec<StoredRecord>, ClientError> {
        let keys = self.derive_keys(password);
        self.list_with_keys(&self.config.endpoint, user, &keys, resource_type, name)
    }

    /// The current value: the last record `list` returns.
    pub fn current(
        &self,
        user: &str,
        password: &str,
        resource_type: u32,
        name: &[u8],
    ) -> Result<StoredRecord, ClientError> {
        self.list(user, password, resource_type, name)?
            .pop()
            .ok_or(ClientError::NoRecords)
    }

    pub(crate) fn add_with_keys(
        &self,
        endpoint: &Endpoint,
        user: &str,
        keys: &PasswordKeys,
        resource_type: u32,
        name: &[u8],
        value: &[u8],
    ) -> Result<String, ClientError> {
        let mut params = self.signed_params(user, keys, resource_type, name)?;
        params.push(("value", encrypt(keys, value)?.to_base64url()));

        let request = Request {
            method: Method::Post,
            endpoint,
            path: ADD_RESOURCE_PATH,
            params,
        };
        let response = self.exchange(&request)?;
        tracing::info!(user, resource_type, endpoint = %endpoint, "added resource");
        Ok(response.body)
    }

    pub(crate) fn list_with_keys(
        &self,
        endpoint: &Endpoint,
        user: &str,
        keys: &PasswordKeys,
        resource_type: u32,
        name: &[u8],
    ) -> Result<Vec<StoredRecord>, ClientError> {
        let request = Request {
            method: Method::Get,
            endpoint,
            path: LIST_RESOURCE_PATH,
            params: self.signed_params(user, keys, resource_type, name)?,
        };
        let response = self.exchange(&request)?;

        let wire: Vec<WireRecord> = serde_json::from_str(&response.body)?;
        wire.into_iter()
            .map(|record| {
                Ok(StoredRecord {
                    version: record.version,
                    creation_time: record.creation_time,
                    value: decrypt_base64url(keys, &record.value)?,
                })
            })
            .collect()
    }

    pub(crate) fn current_with_keys(
        &self,
        endpoint: &Endpoint,
        user: &str,
        keys: &PasswordKeys,
        resource_type: u32,
        name: &[u8],
    ) -> Result<StoredRecord, ClientError> {
        self.list_with_keys(endpoint, user, keys, resource_type, name)?
            .pop()
            .ok_or(ClientError::NoRecords)
    }

    /// Fresh token parameters plus the obscured `name`.
    fn signed_params(
        &self,
        user: &str,
        keys: &PasswordKeys,
        resource_type: u32,
        name: &[u8],
    ) -> Result<Vec<(&'static str, String)>, ClientError> {
        let mut params = AuthToken::build(user, keys, &self.signer)?.params();
        let obscured = permute(keys, &resource_name(resource_type, name))?;
        params.push(("name", obscured.to_base64url()));
        Ok(params)
    }

    fn exchange(&self, request: &Request<'_>) -> Result<Response, ClientError> {
        self.transport.send(request)?.error_for_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStore;
    use crate::types::TYPE_NAMED_VALUE;
    use nigori_crypto::{BlockCipher, CryptoError, EcdsaSigner};

    fn client(store: &MockStore) -> ResourceClient<&MockStore> {
        ResourceClient::new(ClientConfig::default(), store)
    }

    #[test]
    fn register_add_list_end_to_end() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "password").unwrap();
        client
            .add("alice", "password", TYPE_NAMED_VALUE, b"secret", b"hello world")
            .unwrap();

        let records = client
            .list("alice", "password", TYPE_NAMED_VALUE, b"secret")
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, b"hello world");
        assert_eq!(records[0].version, 1);
    }

    #[test]
    fn add_appends_versions() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "pw").unwrap();
        client.add("alice", "pw", 1, b"note", b"v1").unwrap();
        client.add("alice", "pw", 1, b"note", b"v2").unwrap();

        let records = client.list("alice", "pw", 1, b"note").unwrap();
        let versions: Vec<i64> = records.iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(client.current("alice", "pw", 1, b"note").unwrap().value, b"v2");
    }

    #[test]
    fn names_are_scoped_by_type() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "pw").unwrap();
        client.add("alice", "pw", 1, b"same", b"typed one").unwrap();
        client.add("alice", "pw", 2, b"same", b"typed two").unwrap();
        assert_eq!(client.current("alice", "pw", 1, b"same").unwrap().value, b"typed one");
        assert_eq!(client.current("alice", "pw", 2, b"same").unwrap().value, b"typed two");
    }

    #[test]
    fn server_never_sees_plaintext_name_or_value() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "pw").unwrap();
        client.add("alice", "pw", 1, b"bank pin", b"1234").unwrap();
        let stored = store.raw_names(&ClientConfig::default().endpoint);
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].contains("bank"));
    }

    #[test]
    fn empty_list_and_missing_current() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "pw").unwrap();
        assert!(client.list("alice", "pw", 1, b"nothing").unwrap().is_empty());
        assert!(matches!(
            client.current("alice", "pw", 1, b"nothing"),
            Err(ClientError::NoRecords)
        ));
    }

    #[test]
    fn unregistered_user_gets_protocol_error() {
        let store = MockStore::new();
        let client = client(&store);
        let err = client.add("mallory", "pw", 1, b"x", b"y").unwrap_err();
        assert!(matches!(err, ClientError::Protocol { status: 401, .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "pw").unwrap();
        assert!(matches!(
            client.register("alice", "pw"),
            Err(ClientError::Protocol { status: 409, .. })
        ));
    }

    #[test]
    fn wrong_password_cannot_authenticate() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "right").unwrap();
        assert!(matches!(
            client.authenticate("alice", "wrong"),
            Err(ClientError::Protocol { status: 401, .. })
        ));
    }

    #[test]
    fn replayed_token_is_rejected() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "pw").unwrap();

        let keys = client.derive_keys("pw");
        let token = AuthToken::build("alice", &keys, client.signer()).unwrap();
        client.authenticate_with(&token).unwrap();
        assert!(matches!(
            client.authenticate_with(&token),
            Err(ClientError::Protocol { status: 401, .. })
        ));
        // A fresh token still works.
        client.authenticate("alice", "pw").unwrap();
    }

    #[test]
    fn tampered_value_surfaces_authentication_error() {
        let store = MockStore::new();
        let client = client(&store);
        client.register("alice", "pw").unwrap();
        client.add("alice", "pw", 1, b"name", b"value").unwrap();
        store.corrupt_values(&ClientConfig::default().endpoint);

        let err = client.list("alice", "pw", 1, b"name").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Crypto(CryptoError::Authentication)
        ));
    }

    #[test]
    fn unreachable_store_is_transport_error() {
        let store = MockStore::new();
        store.set_unreachable(&ClientConfig::default().endpoint, true);
        let client = client(&store);
        assert!(matches!(
            client.register("alice", "pw"),
            Err(ClientError::Transport(_))
        ));
    }

    /// Answers every request with one fixed body.
    struct FixedBody(String);

    impl Transport for FixedBody {
        fn send(&self, _request: &Request<'_>) -> Result<Response, ClientError> {
            Ok(Response {
                status: 200,
                reason: "OK".into(),
                body: self.0.clone(),
            })
        }
    }

    #[test]
    fn parses_list_body_from_server() {
        let config = ClientConfig::default();
        let keys = PasswordKeys::derive(b"pw", config.cipher);
        let first = encrypt(&keys, b"first").unwrap().to_base64url();
        let second = encrypt(&keys, b"second").unwrap().to_base64url();
        let body = format!(
            r#"[{{"version":1,"creationTime":1.5,"value":"{first}"}},
                {{"version":7,"creationTime":1300000000.25,"value":"{second}"}}]"#
        );
        let client = ResourceClient::new(config, FixedBody(body));

        let records = client.list("alice", "pw", 1, b"name").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].version, 1);
        assert_eq!(records[0].creation_time, 1.5);
        assert_eq!(records[0].value, b"first");
        assert_eq!(records[1].version, 7);
        assert_eq!(records[1].creation_time, 1300000000.25);
        assert_eq!(client.current("alice", "pw", 1, b"name").unwrap().value, b"second");
    }

    #[test]
    fn list_body_missing_creation_time_is_json_error() {
        let body = r#"[{"version":1,"value":"AAAA"}]"#.to_string();
        let client = ResourceClient::new(ClientConfig::default(), FixedBody(body));
        assert!(matches!(
            client.list("alice", "pw", 1, b"name"),
            Err(ClientError::Json(_))
        ));
    }

    #[test]
    fn des_and_ecdsa_configuration() {
        let store = MockStore::with_signer(EcdsaSigner);
        let config = ClientConfig::default().with_cipher(BlockCipher::Des);
        let client = ResourceClient::with_signer(config, &store, EcdsaSigner);
        client.register("bob", "pw").unwrap();
        client.add("bob", "pw", 1, b"k", b"legacy").unwrap();
        assert_eq!(client.current("bob", "pw", 1, b"k").unwrap().value, b"legacy");
    }
}
