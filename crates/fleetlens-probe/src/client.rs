//! Member-cluster API client.
//!
//! The probe talks to member clusters only through [`MemberClusterClient`].
//! [`HttpClusterClient`] implements it over a plain HTTP/1 connection per
//! request; tests substitute in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use fleetlens_core::ClusterEndpoint;
use http::header::{ACCEPT, AUTHORIZATION, HOST, USER_AGENT};
use http_body_util::{BodyExt, Empty};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ProbeError, ProbeResult};
use crate::objects::{NodeObject, ObjectList, PodObject};

/// Boxed future returned by client calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read access to one member cluster's nodes and pods.
pub trait MemberClusterClient: Send + Sync {
    /// List every node in the cluster.
    fn list_nodes(&self) -> BoxFuture<'_, ProbeResult<Vec<NodeObject>>>;

    /// List pods scheduled to `node`, across all namespaces.
    fn list_pods_on_node<'a>(&'a self, node: &'a str)
    -> BoxFuture<'a, ProbeResult<Vec<PodObject>>>;
}

/// Client for a Kubernetes-style API reachable over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpClusterClient {
    cluster: String,
    endpoint: String,
    path_prefix: String,
    token: Option<String>,
}

impl HttpClusterClient {
    pub fn new(endpoint: &ClusterEndpoint) -> Self {
        Self {
            cluster: endpoint.name.clone(),
            endpoint: endpoint.endpoint.clone(),
            path_prefix: endpoint.path_prefix.trim_end_matches('/').to_string(),
            token: endpoint.token.clone(),
        }
    }

    fn nodes_path(&self) -> String {
        format!("{}/api/v1/nodes", self.path_prefix)
    }

    fn pods_path(&self, node: &str) -> String {
        format!(
            "{}/api/v1/pods?fieldSelector=spec.nodeName%3D{}",
            self.path_prefix,
            encode_query_value(node)
        )
    }

    /// Issue a GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ProbeResult<T> {
        let stream = tokio::net::TcpStream::connect(&self.endpoint)
            .await
            .map_err(|e| ProbeError::Connect {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ProbeError::Handshake {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        // Drive the connection in the background.
        let cluster = self.cluster.clone();
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(%cluster, error = %e, "member cluster connection closed");
            }
        });

        let mut builder = http::Request::builder()
            .method("GET")
            .uri(path)
            .header(HOST, &self.endpoint)
            .header(USER_AGENT, "fleetlens-probe/0.1")
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = builder
            .body(Empty::<Bytes>::new())
            .map_err(|e| ProbeError::Request {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ProbeError::Request {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ProbeError::Status {
                path: path.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ProbeError::Request {
                path: path.to_string(),
                reason: e.to_string(),
            })?
            .to_bytes();

        debug!(cluster = %self.cluster, %path, bytes = body.len(), "member cluster response");

        serde_json::from_slice(&body).map_err(|e| ProbeError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

impl MemberClusterClient for HttpClusterClient {
    fn list_nodes(&self) -> BoxFuture<'_, ProbeResult<Vec<NodeObject>>> {
        Box::pin(async move {
            let list: ObjectList<NodeObject> = self.get_json(&self.nodes_path()).await?;
            Ok(list.items)
        })
    }

    fn list_pods_on_node<'a>(
        &'a self,
        node: &'a str,
    ) -> BoxFuture<'a, ProbeResult<Vec<PodObject>>> {
        Box::pin(async move {
            let list: ObjectList<PodObject> = self.get_json(&self.pods_path(node)).await?;
            Ok(list.items)
        })
    }
}

/// Percent-encode a query value. Node names are DNS labels, so only the
/// handful of reserved characters that could appear need escaping.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
