//! Remote bridge
//!
//! Cross-process delivery over the TCP transport:
//! - [`RemoteSender`]: outbound, one cached connection per destination
//! - [`RemoteReceiver`]: inbound, one listener per process, run as an actor
//! - [`InboundRouter`]: resolution and the reject protocol

pub mod receiver;
pub mod sender;

pub use receiver::{Delivery, InboundRouter, RemoteReceiver};
pub use sender::RemoteSender;

use crate::manager::Manager;
use crate::registry::MessageRegistry;
use crate::{ActorError, Result};
use std::sync::Arc;
use switchyard_config::{RemoteSettings, RuntimeConfig};
use switchyard_network::Endpoint;
use tracing::info;

/// Name the inbound receiver is managed under
pub const RECEIVER_NAME: &str = "remote-receiver";

/// Wire a manager up for remote traffic.
///
/// Binds `bind`, registers the receiver actor with the manager and returns
/// the sender used to build [`crate::RemoteRef`]s. If the manager has no
/// endpoint yet, the bound address becomes its advertised endpoint; a
/// wildcard bind cannot be advertised and is refused in that case.
pub fn attach(
    manager: &mut Manager,
    bind: &Endpoint,
    registry: MessageRegistry,
    settings: &RemoteSettings,
) -> Result<RemoteSender> {
    if manager.get_endpoint().is_none() && bind.is_wildcard() {
        return Err(ActorError::configuration(format!(
            "wildcard bind {bind} needs an advertised endpoint"
        )));
    }

    let sender = RemoteSender::new(manager.get_endpoint().cloned(), settings)?;
    let receiver = RemoteReceiver::bind(
        bind,
        manager.directory(),
        Arc::new(registry),
        sender.clone(),
        settings,
    )?;

    if manager.get_endpoint().is_none() {
        let advertised = receiver.local_endpoint().clone();
        sender.set_local_endpoint(Some(advertised.clone()));
        manager.set_endpoint(advertised);
    }

    info!(
        bind = %receiver.local_endpoint(),
        advertised = ?manager.get_endpoint(),
        "Remote bridge attached"
    );

    manager.manage(RECEIVER_NAME, receiver);
    Ok(sender)
}

/// [`attach`] driven by the `remote` section of a loaded config.
///
/// `remote.endpoint` becomes the advertised endpoint unless the manager
/// already has one. The listener binds `remote.bind`, falling back to
/// `remote.endpoint` when no separate bind address is configured.
pub fn attach_from_config(
    manager: &mut Manager,
    config: &RuntimeConfig,
    registry: MessageRegistry,
) -> Result<RemoteSender> {
    let remote = &config.remote;

    if manager.get_endpoint().is_none() {
        if let Some(endpoint) = &remote.endpoint {
            manager.set_endpoint(parse_setting("remote.endpoint", endpoint)?);
        }
    }

    let bind = match (&remote.bind, &remote.endpoint) {
        (Some(bind), _) => parse_setting("remote.bind", bind)?,
        (None, Some(endpoint)) => parse_setting("remote.endpoint", endpoint)?,
        (None, None) => {
            return Err(ActorError::configuration(
                "remote.bind or remote.endpoint must be set to attach the remote bridge",
            ))
        }
    };

    attach(manager, &bind, registry, remote)
}

fn parse_setting(key: &str, value: &str) -> Result<Endpoint> {
    Endpoint::parse(value).map_err(|e| ActorError::configuration(format!("{key}: {e}")))
}
