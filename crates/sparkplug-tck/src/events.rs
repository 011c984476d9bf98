//! Broker event shapes consumed by the harness, and the hook trait a host
//! broker calls to deliver them.

use crate::types::{ProtocolVersion, QoS};
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Will message announced in a CONNECT packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WillInfo {
    pub topic: Arc<str>,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
}

/// A client has opened a network connection, before CONNECT is processed.
#[derive(Debug, Clone)]
pub struct ConnectionStartEvent {
    pub client_id: Arc<str>,
    pub protocol_version: ProtocolVersion,
}

/// The broker accepted the client's credentials.
#[derive(Debug, Clone)]
pub struct AuthenticationSuccessEvent {
    pub client_id: Arc<str>,
}

#[derive(Debug, Clone)]
pub struct ClientConnectEvent {
    pub client_id: Arc<str>,
    pub protocol_version: ProtocolVersion,
    pub clean_start: bool,
    pub session_expiry_interval: u32,
    pub will: Option<WillInfo>,
}

impl ClientConnectEvent {
    #[must_use]
    pub fn new(client_id: impl Into<Arc<str>>) -> Self {
        Self {
            client_id: client_id.into(),
            protocol_version: ProtocolVersion::V5,
            clean_start: true,
            session_expiry_interval: 0,
            will: None,
        }
    }

    #[must_use]
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    #[must_use]
    pub fn with_clean_start(mut self, clean_start: bool) -> Self {
        self.clean_start = clean_start;
        self
    }

    #[must_use]
    pub fn with_session_expiry_interval(mut self, interval: u32) -> Self {
        self.session_expiry_interval = interval;
        self
    }

    #[must_use]
    pub fn with_will(mut self, will: WillInfo) -> Self {
        self.will = Some(will);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ClientDisconnectEvent {
    pub client_id: Arc<str>,
    /// MQTT reason code carried by DISCONNECT, `0x00` for a normal disconnection.
    pub reason_code: u8,
    /// Set when the network connection dropped without a DISCONNECT packet.
    pub unexpected: bool,
}

impl ClientDisconnectEvent {
    #[must_use]
    pub fn normal(client_id: impl Into<Arc<str>>) -> Self {
        Self {
            client_id: client_id.into(),
            reason_code: 0x00,
            unexpected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionInfo {
    pub topic_filter: Arc<str>,
    pub qos: QoS,
}

#[derive(Debug, Clone)]
pub struct ClientSubscribeEvent {
    pub client_id: Arc<str>,
    pub subscriptions: Vec<SubscriptionInfo>,
}

impl ClientSubscribeEvent {
    #[must_use]
    pub fn single(client_id: impl Into<Arc<str>>, topic_filter: &str, qos: QoS) -> Self {
        Self {
            client_id: client_id.into(),
            subscriptions: vec![SubscriptionInfo {
                topic_filter: topic_filter.into(),
                qos,
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientPublishEvent {
    pub client_id: Arc<str>,
    pub topic: Arc<str>,
    /// `None` when the PUBLISH carried no payload at all.
    pub payload: Option<Bytes>,
    pub qos: QoS,
    pub retain: bool,
}

impl ClientPublishEvent {
    #[must_use]
    pub fn new(
        client_id: impl Into<Arc<str>>,
        topic: impl Into<Arc<str>>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            topic: topic.into(),
            payload: Some(payload.into()),
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }

    #[must_use]
    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    #[must_use]
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    #[must_use]
    pub fn without_payload(mut self) -> Self {
        self.payload = None;
        self
    }

    /// Payload decoded as UTF-8, if present and valid.
    #[must_use]
    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|p| std::str::from_utf8(p).ok())
    }
}

/// Hooks a host broker calls for every client event.
///
/// Every hook defaults to a no-op so an implementation only overrides the
/// events it cares about.
pub trait BrokerEventHandler: Send + Sync {
    fn on_connection_start<'a>(
        &'a self,
        _event: ConnectionStartEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    fn on_authentication_success<'a>(
        &'a self,
        _event: AuthenticationSuccessEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    fn on_client_connect<'a>(
        &'a self,
        _event: ClientConnectEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    fn on_client_subscribe<'a>(
        &'a self,
        _event: ClientSubscribeEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    fn on_client_publish<'a>(
        &'a self,
        _event: ClientPublishEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    fn on_client_disconnect<'a>(
        &'a self,
        _event: ClientDisconnectEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}
