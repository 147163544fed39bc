//! Radio provisioning sequences
//!
//! Network join at boot and identity rotation on request from the
//! coordinator. Both are straight-line sequences of engine calls that abort
//! on the first failure.

use crate::config::{
    COMMAND_SPACING_MS, JOIN_ANY_PAN_ID, JOIN_POLL_ATTEMPTS, LEAVE_PAN_ID, OI_NOT_JOINED,
    SERIAL_HIGH_LEN, SERIAL_LOW_LEN,
};
use crate::error::{Error, Result};
use crate::link::receive::RxDma;
use crate::link::transmit::SerialTx;
use crate::radio::command::{AtCommand, AtRequest, CommandOptions};
use crate::radio::engine::RadioCommandEngine;
use crate::timing::Clock;
use crate::types::{NodeAddress, RadioIdentity};

/// Join polling policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinPolicy {
    /// Number of `ATOI` reads before giving up
    pub poll_attempts: u32,
    /// Pause after each command
    pub spacing_ms: u32,
}

impl Default for JoinPolicy {
    fn default() -> Self {
        Self {
            poll_attempts: JOIN_POLL_ATTEMPTS,
            spacing_ms: COMMAND_SPACING_MS,
        }
    }
}

/// Encryption enable value written before the link key
const ENCRYPTION_ON: &[u8] = b"1";

/// Reset the module, force a fresh network join and read the node address
///
/// # Errors
///
/// Returns the first engine failure, or [`Error::ProtocolTimeout`] if the
/// module has not joined a network after `policy.poll_attempts` reads.
pub async fn join_network<D, T, C>(
    engine: &mut RadioCommandEngine<'_, D, T, C>,
    policy: &JoinPolicy,
) -> Result<NodeAddress>
where
    D: RxDma,
    T: SerialTx,
    C: Clock,
{
    info!("join: restoring module defaults");
    let restore = AtRequest::bare(AtCommand::Restore, CommandOptions::NONE.persist().apply())?;
    engine.execute(&restore).await?;
    engine.pause_ms(policy.spacing_ms).await;

    // Leave whatever network the module remembers, then join any
    for pan in [LEAVE_PAN_ID, JOIN_ANY_PAN_ID] {
        let request = AtRequest::write_apply(AtCommand::PanId, pan)?;
        engine.execute(&request).await?;
        engine.pause_ms(policy.spacing_ms).await;
    }

    wait_for_join(engine, policy).await?;

    let mut high = [0u8; SERIAL_HIGH_LEN];
    engine
        .query(&AtRequest::read(AtCommand::SerialHigh)?, &mut high)
        .await?;
    engine.pause_ms(policy.spacing_ms).await;

    let mut low = [0u8; SERIAL_LOW_LEN];
    engine
        .query(&AtRequest::read(AtCommand::SerialLow)?, &mut low)
        .await?;
    engine.pause_ms(policy.spacing_ms).await;

    let address = NodeAddress { high, low };
    info!("join: node address {}", address);
    Ok(address)
}

async fn wait_for_join<D, T, C>(
    engine: &mut RadioCommandEngine<'_, D, T, C>,
    policy: &JoinPolicy,
) -> Result<()>
where
    D: RxDma,
    T: SerialTx,
    C: Clock,
{
    let request = AtRequest::read(AtCommand::OperatingPanId)?;
    let mut operating = [0u8; 4];

    for attempt in 0..policy.poll_attempts {
        engine.query(&request, &mut operating).await?;
        engine.pause_ms(policy.spacing_ms).await;

        if &operating != OI_NOT_JOINED {
            info!("join: joined after {} polls", attempt + 1);
            return Ok(());
        }
    }

    warn!("join: no network after {} polls", policy.poll_attempts);
    Err(Error::ProtocolTimeout)
}

/// Push a new PAN id and link key into the module
///
/// Writes the PAN id, enables encryption, then writes the link key, each
/// persisted and applied. Stops at the first failure; earlier writes are not
/// rolled back.
///
/// # Errors
///
/// Returns the first engine failure.
pub async fn apply_identity<D, T, C>(
    engine: &mut RadioCommandEngine<'_, D, T, C>,
    identity: &RadioIdentity,
    spacing_ms: u32,
) -> Result<()>
where
    D: RxDma,
    T: SerialTx,
    C: Clock,
{
    let steps = [
        AtRequest::write_apply(AtCommand::PanId, identity.pan_id.as_bytes())?,
        AtRequest::write_apply(AtCommand::EncryptionEnable, ENCRYPTION_ON)?,
        AtRequest::write_apply(AtCommand::LinkKey, identity.session_key.as_bytes())?,
    ];

    for request in &steps {
        engine.execute(request).await?;
        engine.pause_ms(spacing_ms).await;
    }

    info!("identity applied: {}", identity.pan_id);
    Ok(())
}
