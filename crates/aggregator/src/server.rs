// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{setup_routes, AggregatorError, AggregatorStore, AppData, PublicContextWriter};
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// JSON extractor settings: the body limit, and malformed bodies answered as 400 with a
/// `{"status":"error","msg":..}` body.
pub fn json_config(max_body_bytes: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_body_bytes)
        .error_handler(|err, _req| AggregatorError::BadRequest(err.to_string()).into())
}

#[derive(Clone, Debug, Default)]
pub struct AggregatorServerBuilder {
    store: Option<AggregatorStore>,
    port: Option<u16>,
    host: Option<String>,
    max_body_bytes: Option<usize>,
    public_context_write_path: Option<PathBuf>,
}

impl AggregatorServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the port number (default: 5000). Port 0 picks a free port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the host address (default: "0.0.0.0")
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the largest accepted request body (default: 20 MiB)
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = Some(max_body_bytes);
        self
    }

    /// Also write every stored public context to `path`
    pub fn with_public_context_write_path<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.public_context_write_path = path.map(Into::into);
        self
    }

    /// Serve an existing store instead of a fresh one
    pub fn with_store(mut self, store: AggregatorStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> AggregatorServer {
        AggregatorServer {
            store: self.store.unwrap_or_default(),
            port: self.port.unwrap_or(DEFAULT_PORT),
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            max_body_bytes: self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
            public_context_write_path: self.public_context_write_path,
        }
    }
}

/// A server bound to its sockets. Await `server` to serve.
pub struct BoundServer {
    pub server: Server,
    pub addrs: Vec<SocketAddr>,
}

#[derive(Clone, Debug)]
pub struct AggregatorServer {
    store: AggregatorStore,
    port: u16,
    host: String,
    max_body_bytes: usize,
    public_context_write_path: Option<PathBuf>,
}

impl AggregatorServer {
    pub fn builder() -> AggregatorServerBuilder {
        AggregatorServerBuilder::new()
    }

    pub fn store(&self) -> &AggregatorStore {
        &self.store
    }

    /// Get the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bind the listening sockets without serving yet
    pub fn bind(&self) -> Result<BoundServer> {
        let bind_addr = self.bind_address();
        let data = AppData::new(
            self.store.clone(),
            self.public_context_write_path
                .clone()
                .map(PublicContextWriter::new),
        );
        let max_body_bytes = self.max_body_bytes;

        let server = HttpServer::new(move || {
            App::new()
                .wrap(Logger::new(r#"%a "%r" %s %b %T"#))
                .app_data(web::Data::new(data.clone()))
                .app_data(json_config(max_body_bytes))
                .configure(setup_routes)
        })
        .bind(&bind_addr)?;

        let addrs = server.addrs();
        for addr in &addrs {
            info!("Aggregator listening on http://{}", addr);
        }
        Ok(BoundServer {
            server: server.run(),
            addrs,
        })
    }

    /// Run the HTTP server until it is stopped
    pub async fn run(&self) -> Result<()> {
        self.bind()?.server.await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let server = AggregatorServer::builder().build();
        assert_eq!(server.bind_address(), "0.0.0.0:5000");
        assert_eq!(server.max_body_bytes, 20 * 1024 * 1024);
        assert!(server.public_context_write_path.is_none());

        let server = AggregatorServer::builder()
            .with_host("127.0.0.1")
            .with_port(0)
            .with_public_context_write_path(Some("ctx.bin"))
            .build();
        assert_eq!(server.bind_address(), "127.0.0.1:0");
        assert_eq!(
            server.public_context_write_path,
            Some(PathBuf::from("ctx.bin"))
        );
    }

    #[actix_web::test]
    async fn binding_port_zero_reports_the_real_port() {
        let server = AggregatorServer::builder()
            .with_host("127.0.0.1")
            .with_port(0)
            .build();
        let bound = server.bind().unwrap();
        assert_eq!(bound.addrs.len(), 1);
        assert_ne!(bound.addrs[0].port(), 0);

        let handle = bound.server.handle();
        actix_web::rt::spawn(bound.server);
        handle.stop(false).await;
    }
}
