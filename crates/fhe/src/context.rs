// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::wire::{decode_body, encode_body, open, seal};
use crate::{ContextId, Result, SchemeKind, WireKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Everything needed to encrypt under a context, and nothing that allows decryption.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicContext {
    scheme: SchemeKind,
    body: Vec<u8>,
    id: ContextId,
}

impl PublicContext {
    pub(crate) fn new(scheme: SchemeKind, body: Vec<u8>) -> Self {
        let id = ContextId::derive(scheme, &body);
        Self { scheme, body, id }
    }

    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub(crate) fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        seal(WireKind::PublicContext, self.scheme, &self.body)
    }

    /// The id is always recomputed from the decoded body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (scheme, body) = open(bytes, WireKind::PublicContext)?;
        Ok(Self::new(scheme, body))
    }
}

impl fmt::Debug for PublicContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicContext")
            .field("scheme", &self.scheme)
            .field("id", &self.id)
            .finish()
    }
}

#[derive(Serialize)]
struct SecretBodyRef<'a> {
    public: &'a [u8],
    secret: &'a [u8],
}

#[derive(Deserialize)]
struct SecretBody {
    public: Vec<u8>,
    secret: Vec<u8>,
}

/// A public context paired with the key material that decrypts under it.
#[derive(Clone)]
pub struct SecretContext {
    public: PublicContext,
    secret: Zeroizing<Vec<u8>>,
}

impl SecretContext {
    pub(crate) fn new(public: PublicContext, secret: Zeroizing<Vec<u8>>) -> Self {
        Self { public, secret }
    }

    pub fn public(&self) -> &PublicContext {
        &self.public
    }

    pub fn scheme(&self) -> SchemeKind {
        self.public.scheme
    }

    pub fn id(&self) -> ContextId {
        self.public.id
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        let body = Zeroizing::new(encode_body(&SecretBodyRef {
            public: &self.public.body,
            secret: &self.secret,
        })?);
        Ok(Zeroizing::new(seal(
            WireKind::SecretContext,
            self.public.scheme,
            &body,
        )?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (scheme, body) = open(bytes, WireKind::SecretContext)?;
        let body = Zeroizing::new(body);
        let SecretBody { public, secret } = decode_body(&body, "secret context")?;
        Ok(Self {
            public: PublicContext::new(scheme, public),
            secret: Zeroizing::new(secret),
        })
    }
}

impl fmt::Debug for SecretContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretContext")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}
