//! Per-neighbor BGP peering state machine (RFC 4271 Section 8)
//!
//! [`Session::run`] takes over once a TCP stream exists -- the collector
//! owns ConnectRetry and the Idle/Connect/Active decision of whether and how
//! to dial out, the same split GoBGP's peer manager and most collector
//! implementations use between "getting a socket" and "speaking BGP over
//! it". From OpenSent onward this runs the full three-timer FSM body: send
//! OPEN, validate the peer's OPEN, exchange KEEPALIVE, then loop in
//! Established tracking the Hold and Keepalive timers until something ends
//! the session.

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::capability::CapabilitiesBuilder;
use crate::collector::CollectorConfig;
use crate::error::FsmError;
use crate::event::{Event, NeighborConfig};
use crate::{Codec, Message, Notification, Open};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tokio_util::codec::Framed;

/// BGP FSM states (RFC 4271 Section 8.2.1)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    Connect,
    Active,
    OpenSent,
    OpenConfirm,
    Established,
}

impl State {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connect => "Connect",
            Self::Active => "Active",
            Self::OpenSent => "OpenSent",
            Self::OpenConfirm => "OpenConfirm",
            Self::Established => "Established",
        }
    }
}

/// The fixed ConnectRetry timer (RFC 4271 Section 8, not configurable here)
pub const CONNECT_RETRY_TIME: Duration = Duration::from_secs(120);

/// RFC 4271 Section 8.2.2's fixed "large hold time", armed on entry to
/// OpenSent before any hold time has been negotiated with the peer.
const INITIAL_OPEN_HOLD: Duration = Duration::from_secs(240);

/// One neighbor's running session
pub struct Session {
    collector: CollectorConfig,
    neighbor: NeighborConfig,
    events: mpsc::Sender<Event>,
    state: State,
    stop: watch::Receiver<bool>,
}

impl Session {
    #[must_use]
    pub fn new(
        collector: CollectorConfig,
        neighbor: NeighborConfig,
        events: mpsc::Sender<Event>,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            collector,
            neighbor,
            events,
            state: State::Idle,
            stop,
        }
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    async fn transition(&mut self, to: State) {
        let from = self.state;
        self.state = to;
        log::debug!("{}: {} -> {}", self.neighbor.address, from.name(), to.name());
        let _ = self
            .events
            .send(Event::StateTransition {
                address: self.neighbor.address,
                from,
                to,
            })
            .await;
    }

    /// Drive the session to completion over an already-connected `stream`.
    ///
    /// On any error this sends a NOTIFICATION (when [`FsmError::to_notification`]
    /// says to) before returning, closing the TCP stream by drop. A stop
    /// requested through the collector surfaces as [`FsmError::Stopped`], whose
    /// NOTIFICATION is Cease -- it is not reported as an [`Event::Error`] since
    /// it isn't one.
    pub async fn run(mut self, stream: TcpStream) -> Result<(), FsmError> {
        self.transition(State::Connect).await;
        let mut framed = Framed::new(stream, Codec::default());
        let result = self.negotiate_and_serve(&mut framed).await;
        if let Err(ref e) = result {
            if let Some((code, subcode, data)) = e.to_notification() {
                let _ = framed
                    .send(Message::Notification(Notification::new(code, subcode, data)))
                    .await;
            }
            if !matches!(e, FsmError::Stopped) {
                let _ = self
                    .events
                    .send(Event::Error {
                        address: self.neighbor.address,
                        message: e.to_string(),
                    })
                    .await;
            }
        }
        result
    }

    async fn negotiate_and_serve(
        &mut self,
        framed: &mut Framed<TcpStream, Codec>,
    ) -> Result<(), FsmError> {
        self.transition(State::OpenSent).await;
        let open = Open::new_easy(
            self.collector.asn,
            self.neighbor.hold_time,
            self.collector.router_id,
            CapabilitiesBuilder::new()
                .mp_bgp_ls()
                .four_octet_as_number(self.collector.asn)
                .build(),
        );
        framed.send(Message::Open(open)).await?;

        let peer_open = self.await_open(framed).await?;
        self.validate_open(&peer_open)?;

        let negotiated_hold = self.neighbor.hold_time.min(peer_open.hold_time);
        let hold_duration = Duration::from_secs(u64::from(negotiated_hold));
        let keepalive_interval = if negotiated_hold == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(negotiated_hold) / 3))
        };

        framed.send(Message::Keepalive).await?;
        self.transition(State::OpenConfirm).await;
        self.await_keepalive(framed, hold_duration).await?;

        self.transition(State::Established).await;
        self.established_loop(framed, hold_duration, keepalive_interval)
            .await
    }

    /// Wait for the peer's OPEN, racing the 240s initial large hold time and a
    /// stop request from the collector (RFC 4271 Section 8.2.2, Section 8.2.1
    /// OpenSent "Stop").
    async fn await_open(
        &mut self,
        framed: &mut Framed<TcpStream, Codec>,
    ) -> Result<Open, FsmError> {
        tokio::select! {
            biased;
            _ = self.stop.changed() => Err(FsmError::Stopped),
            () = time::sleep(INITIAL_OPEN_HOLD) => Err(FsmError::HoldTimerExpired),
            msg = framed.next() => match msg {
                Some(Ok(Message::Open(open))) => Ok(open),
                Some(Ok(Message::Notification(n))) => {
                    Err(FsmError::PeerNotification(n.error_code, n.error_subcode))
                }
                Some(Ok(other)) => Err(FsmError::UnexpectedMessage(
                    message_name(&other),
                    State::OpenSent.name(),
                )),
                Some(Err(e)) => Err(FsmError::Codec(e)),
                None => Err(FsmError::ConnectionClosed),
            },
        }
    }

    fn validate_open(&self, open: &Open) -> Result<(), FsmError> {
        if open.version != crate::BGP_VERSION {
            return Err(FsmError::UnsupportedVersion(open.version));
        }
        let actual = open.real_asn();
        if actual != self.neighbor.asn {
            return Err(FsmError::BadPeerAs {
                expected: self.neighbor.asn,
                actual,
            });
        }
        if open.hold_time != 0 && open.hold_time < 3 {
            return Err(FsmError::UnacceptableHoldTime(open.hold_time));
        }
        if open.bgp_id.is_unspecified() {
            return Err(FsmError::BadBgpId);
        }
        let caps = open.opt_params.iter().find_map(|p| {
            let crate::capability::OptionalParameterValue::Capabilities(c) = p;
            Some(c)
        });
        if !caps.is_some_and(crate::capability::Capabilities::has_mp_bgp_ls) {
            return Err(FsmError::UnsupportedCapability);
        }
        Ok(())
    }

    async fn await_keepalive(
        &mut self,
        framed: &mut Framed<TcpStream, Codec>,
        hold_duration: Duration,
    ) -> Result<(), FsmError> {
        let hold_expired = async {
            if hold_duration.is_zero() {
                std::future::pending::<()>().await;
            } else {
                time::sleep(hold_duration).await;
            }
        };
        tokio::select! {
            biased;
            _ = self.stop.changed() => Err(FsmError::Stopped),
            () = hold_expired => Err(FsmError::HoldTimerExpired),
            msg = framed.next() => match msg {
                Some(Ok(Message::Keepalive)) => Ok(()),
                Some(Ok(Message::Notification(n))) => {
                    Err(FsmError::PeerNotification(n.error_code, n.error_subcode))
                }
                Some(Ok(other)) => Err(FsmError::UnexpectedMessage(
                    message_name(&other),
                    State::OpenConfirm.name(),
                )),
                Some(Err(e)) => Err(FsmError::Codec(e)),
                None => Err(FsmError::ConnectionClosed),
            },
        }
    }

    async fn established_loop(
        &mut self,
        framed: &mut Framed<TcpStream, Codec>,
        hold_duration: Duration,
        keepalive_interval: Option<Duration>,
    ) -> Result<(), FsmError> {
        let mut keepalive_timer = keepalive_interval.map(time::interval);
        loop {
            let hold_expired = async {
                if hold_duration.is_zero() {
                    std::future::pending::<()>().await;
                } else {
                    time::sleep(hold_duration).await;
                }
            };
            tokio::select! {
                biased;
                _ = self.stop.changed() => return Err(FsmError::Stopped),
                msg = framed.next() => {
                    match msg {
                        Some(Ok(Message::Update(update))) => {
                            let _ = self.events.send(Event::UpdateReceived {
                                address: self.neighbor.address,
                                update,
                            }).await;
                        }
                        Some(Ok(Message::Keepalive)) => {}
                        Some(Ok(Message::Notification(n))) => {
                            let (code, subcode) = (n.error_code, n.error_subcode);
                            let _ = self.events.send(Event::NotificationReceived {
                                address: self.neighbor.address,
                                notification: n,
                            }).await;
                            return Err(FsmError::PeerNotification(code, subcode));
                        }
                        Some(Ok(other)) => {
                            return Err(FsmError::UnexpectedMessage(
                                message_name(&other),
                                State::Established.name(),
                            ));
                        }
                        Some(Err(e)) => return Err(FsmError::Codec(e)),
                        None => return Err(FsmError::ConnectionClosed),
                    }
                }
                Some(_) = conditional_tick(&mut keepalive_timer) => {
                    framed.send(Message::Keepalive).await?;
                }
                () = hold_expired => {
                    let _ = self.events.send(Event::HoldTimerExpired {
                        address: self.neighbor.address,
                    }).await;
                    return Err(FsmError::HoldTimerExpired);
                }
            }
        }
    }
}

async fn conditional_tick(timer: &mut Option<time::Interval>) -> Option<time::Instant> {
    match timer {
        Some(t) => Some(t.tick().await),
        None => std::future::pending().await,
    }
}

const fn message_name(msg: &Message) -> &'static str {
    match msg {
        Message::Open(_) => "OPEN",
        Message::Update(_) => "UPDATE",
        Message::Notification(_) => "NOTIFICATION",
        Message::Keepalive => "KEEPALIVE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names_are_distinct() {
        let states = [
            State::Idle,
            State::Connect,
            State::Active,
            State::OpenSent,
            State::OpenConfirm,
            State::Established,
        ];
        let names: std::collections::HashSet<_> = states.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), states.len());
    }
}
