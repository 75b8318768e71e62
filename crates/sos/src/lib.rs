//! Emergency SOS Notifier
//!
//! Out-of-band escalation for sustained critical drowsiness:
//! - Fixed message template with a best-effort maps link
//! - MQTT-based dispatch to the fleet emergency topic
//! - Logging fallback for headless/offline runs
//!
//! Dispatch is fire-and-forget from the monitor's point of view: a failed
//! send is surfaced to the host and never retried automatically.

use chrono::{DateTime, Utc};
use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// SOS dispatch error types
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("no emergency contact configured")]
    MissingContact,

    #[error("notifier not connected")]
    NotConnected,

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Emergency notifier. One call sends one alert; retry policy belongs to
/// the caller (the monitor deliberately has none).
pub trait EmergencyNotifier: Send + Sync {
    fn send_sos(
        &self,
        contact: &str,
        message: &str,
        location: Option<(f64, f64)>,
    ) -> Result<(), NotifyError>;
}

/// Compose the fixed SOS message. Unknown location degrades to a statement
/// in the message body rather than a failure.
pub fn compose_sos_message(location: Option<(f64, f64)>) -> String {
    let maps_link = match location {
        Some((lat, lon)) => format!("https://maps.google.com/?q={lat},{lon}"),
        None => "Location unavailable".to_string(),
    };
    format!("EMERGENCY: Driver is unresponsive! Last known location: {maps_link}")
}

/// MQTT notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosConfig {
    /// MQTT broker host
    pub broker_url: String,
    /// MQTT port
    pub broker_port: u16,
    /// Vehicle ID (topic segment + client id)
    pub vehicle_id: String,
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            broker_url: "localhost".to_string(),
            broker_port: 1883,
            vehicle_id: "unknown".to_string(),
        }
    }
}

/// SOS envelope published to the emergency topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosMessage {
    pub alert_id: Uuid,
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub contact: String,
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// MQTT-backed emergency notifier
pub struct MqttNotifier {
    config: SosConfig,
    client: Option<AsyncClient>,
}

impl MqttNotifier {
    pub fn new(config: SosConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Connect to the broker and spawn the event loop task
    pub async fn connect(&mut self) -> Result<(), NotifyError> {
        let mut options = MqttOptions::new(
            format!("drivesafe-{}", self.config.vehicle_id),
            &self.config.broker_url,
            self.config.broker_port,
        );
        options.set_keep_alive(std::time::Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                    _ => {}
                }
            }
        });

        self.client = Some(client);
        info!("connected to MQTT broker: {}", self.config.broker_url);
        Ok(())
    }
}

impl EmergencyNotifier for MqttNotifier {
    fn send_sos(
        &self,
        contact: &str,
        message: &str,
        location: Option<(f64, f64)>,
    ) -> Result<(), NotifyError> {
        if contact.is_empty() {
            return Err(NotifyError::MissingContact);
        }

        let client = self.client.as_ref().ok_or(NotifyError::NotConnected)?;

        let envelope = SosMessage {
            alert_id: Uuid::new_v4(),
            vehicle_id: self.config.vehicle_id.clone(),
            timestamp: Utc::now(),
            contact: contact.to_string(),
            message: message.to_string(),
            latitude: location.map(|(lat, _)| lat),
            longitude: location.map(|(_, lon)| lon),
        };

        let payload = serde_json::to_vec(&envelope)
            .map_err(|e| NotifyError::Serialization(e.to_string()))?;

        let topic = format!("vehicles/{}/sos", self.config.vehicle_id);
        client
            .try_publish(&topic, QoS::AtLeastOnce, false, payload)
            .map_err(|e| NotifyError::Dispatch(e.to_string()))?;

        warn!(alert_id = %envelope.alert_id, contact, "SOS dispatched");
        Ok(())
    }
}

/// Logging-only notifier for runs without a broker
#[derive(Debug, Default)]
pub struct LogNotifier;

impl EmergencyNotifier for LogNotifier {
    fn send_sos(
        &self,
        contact: &str,
        message: &str,
        location: Option<(f64, f64)>,
    ) -> Result<(), NotifyError> {
        if contact.is_empty() {
            return Err(NotifyError::MissingContact);
        }
        warn!(contact, ?location, "SOS (log-only): {}", message);
        Ok(())
    }
}
