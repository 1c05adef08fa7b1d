//! Scripted `RemoteService` for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, RemoteOperation, Result};
use crate::wallet::WalletIdentity;

use super::{PingResult, RemoteService};

/// How a wallet's calls behave
#[derive(Debug, Clone)]
pub struct Script {
    pub running: Outcome<bool>,
    pub activate: Outcome<bool>,
    pub ping: Outcome<Option<u64>>,
}

#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Ok(T),
    Fail(&'static str),
    /// Never completes
    Hang,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            running: Outcome::Ok(true),
            activate: Outcome::Ok(true),
            ping: Outcome::Ok(None),
        }
    }
}

#[derive(Default)]
pub struct ScriptedRemote {
    scripts: HashMap<String, Script>,
    fallback: Script,
    calls: Mutex<Vec<(RemoteOperation, String)>>,
}

impl ScriptedRemote {
    pub fn new(fallback: Script) -> Self {
        Self {
            fallback,
            ..Default::default()
        }
    }

    pub fn with_script(mut self, address: &str, script: Script) -> Self {
        self.scripts.insert(address.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<(RemoteOperation, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: RemoteOperation, address: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(o, a)| *o == op && a == address)
            .count()
    }

    fn script(&self, address: &str) -> &Script {
        self.scripts.get(address).unwrap_or(&self.fallback)
    }

    async fn play<T: Clone>(
        &self,
        op: RemoteOperation,
        address: &str,
        outcome: &Outcome<T>,
    ) -> Result<T> {
        self.calls.lock().unwrap().push((op, address.to_string()));
        match outcome {
            Outcome::Ok(value) => Ok(value.clone()),
            Outcome::Fail(message) => Err(Error::remote(address, op, message)),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl RemoteService for ScriptedRemote {
    async fn node_status(&self, address: &str) -> Result<bool> {
        let outcome = self.script(address).running.clone();
        self.play(RemoteOperation::NodeStatus, address, &outcome).await
    }

    async fn activate(&self, identity: &WalletIdentity) -> Result<bool> {
        let outcome = self.script(identity.address()).activate.clone();
        self.play(RemoteOperation::Activate, identity.address(), &outcome)
            .await
    }

    async fn ping(&self, address: &str) -> Result<PingResult> {
        let outcome = self.script(address).ping.clone();
        let points = self.play(RemoteOperation::Ping, address, &outcome).await?;
        Ok(PingResult { points })
    }
}
