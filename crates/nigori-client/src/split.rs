//! Threshold distribution of secrets across several stores.
//!
//! The topology (threshold `k` and the ordered list of split servers) is an
//! ordinary encrypted resource on the home store, type
//! [`TYPE_SPLIT_SERVERS`] named [`SPLIT_SERVERS_NAME`]. Each share is a
//! [`TYPE_NAMED_VALUE`] resource on its own server, holding
//! `[index][share bytes]`.

use nigori_crypto::{PasswordKeys, SchnorrSigner, ShamirSharer, Share, Signer, ThresholdSharer};

use crate::codec::{decode_fields, decode_u32, encode_fields, encode_u32};
use crate::config::Endpoint;
use crate::error::ClientError;
use crate::resource::ResourceClient;
use crate::transport::Transport;
use crate::types::{SPLIT_SERVERS_NAME, TYPE_NAMED_VALUE, TYPE_SPLIT_SERVERS};

/// Largest number of split servers; share indices are single bytes.
pub const MAX_SPLIT_SERVERS: usize = u8::MAX as usize;

/// Threshold and ordered servers for split storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitTopology {
    pub k: u32,
    pub servers: Vec<Endpoint>,
}

impl SplitTopology {
    pub fn new(k: u32, servers: Vec<Endpoint>) -> Self {
        Self { k, servers }
    }

    pub fn n(&self) -> usize {
        self.servers.len()
    }

    /// Check `1 <= k <= n <= 255`.
    pub fn validate(&self) -> Result<(), ClientError> {
        let n = self.n();
        if n == 0 || n > MAX_SPLIT_SERVERS {
            return Err(ClientError::Topology(format!(
                "need between 1 and {MAX_SPLIT_SERVERS} servers, got {n}"
            )));
        }
        if self.k == 0 || self.k as usize > n {
            return Err(ClientError::Topology(format!(
                "threshold must satisfy 1 <= k <= n, got k={} n={n}",
                self.k
            )));
        }
        Ok(())
    }

    /// `[k][host1][port1]...[hostN][portN]`, every field ASCII text.
    pub fn encode(&self) -> Vec<u8> {
        let mut fields = Vec::with_capacity(1 + 2 * self.n());
        fields.push(self.k.to_string());
        for server in &self.servers {
            fields.push(server.host.clone());
            fields.push(server.port.to_string());
        }
        encode_fields(&fields)
    }

    /// Parse a stored topology. Does not check the threshold against `n`.
    pub fn decode(data: &[u8]) -> Result<Self, ClientError> {
        let fields = decode_fields(data)?;
        let Some((k, rest)) = fields.split_first() else {
            return Err(ClientError::Topology("empty topology record".into()));
        };
        if rest.len() % 2 != 0 {
            return Err(ClientError::Topology(format!(
                "{} host/port fields do not form whole pairs",
                rest.len()
            )));
        }

        let k = parse_ascii::<u32>(k, "threshold")?;
        let servers = rest
            .chunks_exact(2)
            .map(|pair| {
                let host = String::from_utf8(pair[0].clone())
                    .map_err(|_| ClientError::Topology("host is not UTF-8".into()))?;
                let port = parse_ascii::<u16>(&pair[1], "port")?;
                Ok(Endpoint::new(host, port))
            })
            .collect::<Result<Vec<_>, ClientError>>()?;
        Ok(Self { k, servers })
    }
}

fn parse_ascii<N: std::str::FromStr>(field: &[u8], what: &str) -> Result<N, ClientError> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            ClientError::Topology(format!(
                "invalid {what}: {:?}",
                String::from_utf8_lossy(field)
            ))
        })
}

fn encode_share(share: &Share) -> Vec<u8> {
    encode_fields(&[&encode_u32(u32::from(share.index))[..], &share.value[..]])
}

fn decode_share(data: &[u8]) -> Result<Share, ClientError> {
    let fields = decode_fields(data)?;
    let [index, value] = fields.as_slice() else {
        return Err(ClientError::Codec(format!(
            "share record has {} fields, expected 2",
            fields.len()
        )));
    };
    let index = u8::try_from(decode_u32(index)?)
        .map_err(|_| ClientError::Codec("share index out of range".into()))?;
    Ok(Share {
        index,
        value: value.clone(),
    })
}

/// Splits secrets across the servers named in a user's topology.
pub struct SplitCoordinator<T, S = SchnorrSigner, H = ShamirSharer> {
    client: ResourceClient<T, S>,
    sharer: H,
}

impl<T: Transport, S: Signer> SplitCoordinator<T, S, ShamirSharer> {
    pub fn new(client: ResourceClient<T, S>) -> Self {
        Self::with_sharer(client, ShamirSharer)
    }
}

impl<T: Transport, S: Signer, H: ThresholdSharer> SplitCoordinator<T, S, H> {
    pub fn with_sharer(client: ResourceClient<T, S>, sharer: H) -> Self {
        Self { client, sharer }
    }

    pub fn client(&self) -> &ResourceClient<T, S> {
        &self.client
    }

    /// Store the topology on the home store.
    pub fn init_split(
        &self,
        user: &str,
        password: &str,
        k: u32,
        servers: Vec<Endpoint>,
    ) -> Result<SplitTopology, ClientError> {
        let topology = SplitTopology::new(k, servers);
        if topology.servers.is_empty() || topology.n() > MAX_SPLIT_SERVERS {
            return Err(ClientError::Topology(format!(
                "need between 1 and {MAX_SPLIT_SERVERS} servers, got {}",
                topology.n()
            )));
        }

        self.client.add(
            user,
            password,
            TYPE_SPLIT_SERVERS,
            SPLIT_SERVERS_NAME,
            &topology.encode(),
        )?;
        tracing::info!(user, k, n = topology.n(), "stored split topology");
        Ok(topology)
    }

    /// The current topology, as last stored.
    pub fn topology(&self, user: &str, password: &str) -> Result<SplitTopology, ClientError> {
        let keys = self.client.derive_keys(password);
        self.topology_with_keys(user, &keys)
    }

    /// Split `value` into one share per server and store each.
    ///
    /// The value is length-framed before sharing, so it may be empty.
    ///
    /// Shares go out in topology order; the first failure aborts and is
    /// returned. Servers already written keep their shares.
    pub fn split_add(
        &self,
        user: &str,
        password: &str,
        name: &[u8],
        value: &[u8],
    ) -> Result<(), ClientError> {
        let keys = self.client.derive_keys(password);
        let topology = self.validated_topology(user, &keys)?;
        let n = topology.n() as u8;
        let shares = self
            .sharer
            .split(&encode_fields(&[value]), topology.k as u8, n)?;

        for (share, server) in shares.iter().zip(&topology.servers) {
            tracing::debug!(index = share.index, server = %server, "sending share");
            self.client.add_with_keys(
                server,
                user,
                &keys,
                TYPE_NAMED_VALUE,
                name,
                &encode_share(share),
            )?;
        }
        tracing::info!(user, k = topology.k, n, "distributed split value");
        Ok(())
    }

    /// Recover a value from the first `k` servers that answer.
    ///
    /// Servers are tried in topology order. A server that cannot be reached,
    /// rejects the request, or holds no share is skipped. A share that fails
    /// to decrypt or decode aborts recovery.
    pub fn split_get(
        &self,
        user: &str,
        password: &str,
        name: &[u8],
    ) -> Result<Vec<u8>, ClientError> {
        let keys = self.client.derive_keys(password);
        let topology = self.validated_topology(user, &keys)?;
        let needed = topology.k as usize;

        let mut shares: Vec<Share> = Vec::with_capacity(needed);
        let mut last_error = None;
        for server in &topology.servers {
            if shares.len() == needed {
                break;
            }
            let share = self
                .client
                .current_with_keys(server, user, &keys, TYPE_NAMED_VALUE, name)
                .and_then(|record| decode_share(&record.value));
            match share {
                Ok(share) if shares.iter().any(|s| s.index == share.index) => {
                    tracing::warn!(server = %server, index = share.index, "duplicate share index");
                }
                Ok(share) => {
                    tracing::debug!(server = %server, index = share.index, "collected share");
                    shares.push(share);
                }
                Err(
                    e @ (ClientError::Transport(_)
                    | ClientError::Protocol { .. }
                    | ClientError::NoRecords),
                ) => {
                    tracing::warn!(server = %server, error = %e, "split server failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        if shares.len() < needed {
            return Err(last_error.unwrap_or(ClientError::InsufficientShares {
                needed,
                got: shares.len(),
            }));
        }
        let framed = self.sharer.recover(topology.k as u8, &shares)?;
        let secret = match <[Vec<u8>; 1]>::try_from(decode_fields(&framed)?) {
            Ok([secret]) => secret,
            Err(fields) => {
                return Err(ClientError::Codec(format!(
                    "recovered value has {} fields, expected 1",
                    fields.len()
                )))
            }
        };
        tracing::info!(user, k = topology.k, "recovered split value");
        Ok(secret)
    }

    fn topology_with_keys(&self, user: &str, keys: &PasswordKeys) -> Result<SplitTopology, ClientError> {
        let home = &self.client.config().endpoint;
        let record = self.client.current_with_keys(
            home,
            user,
            keys,
            TYPE_SPLIT_SERVERS,
            SPLIT_SERVERS_NAME,
        )?;
        SplitTopology::decode(&record.value)
    }

    fn validated_topology(&self, user: &str, keys: &PasswordKeys) -> Result<SplitTopology, ClientError> {
        let topology = self.topology_with_keys(user, keys)?;
        topology.validate()?;
        Ok(topology)
    }
}
