// ESP-NOW Transport
//
// Broadcast an alle Knoten im selben WiFi-Kanal. Der esp-radio Treiber legt
// empfangene Pakete im Interrupt in seine eigene Queue; `receive()` holt
// höchstens eins davon ab und blockiert nie.

use defmt::{Debug2Format, warn};
use embassy_time::Instant;
use esp_radio::esp_now::{BROADCAST_ADDRESS, EspNow, EspNowError};
use show_core::{Frame, NullTransport, ReceiveMeta, Received, SendError, Transport};

/// ESP-NOW Broadcast-Transport
pub struct EspNowTransport<'a> {
    esp_now: EspNow<'a>,
}

impl<'a> EspNowTransport<'a> {
    pub fn new(esp_now: EspNow<'a>) -> Self {
        Self { esp_now }
    }
}

impl Transport for EspNowTransport<'_> {
    fn send(&mut self, frame: &[u8]) -> Result<(), SendError> {
        // Der SendWaiter wird sofort verworfen. Sein Drop wartet aktiv auf den
        // Sende-Callback des Treibers (kurz, ein Frame); das ist im Loop akzeptiert.
        match self.esp_now.send(&BROADCAST_ADDRESS, frame) {
            Ok(_waiter) => Ok(()),
            Err(EspNowError::SendFailed) => Err(SendError::TransportBusy),
            Err(e) => {
                warn!("ESP-NOW: send error {}", Debug2Format(&e));
                Err(SendError::NoPeer)
            }
        }
    }

    fn poll_receive(&mut self) -> Option<Received> {
        let received = self.esp_now.receive()?;

        let Some(frame) = Frame::from_slice(received.data()) else {
            warn!("ESP-NOW: dropping oversized packet ({} bytes)", received.data().len());
            return None;
        };

        Some(Received {
            frame,
            meta: ReceiveMeta {
                received_at_ms: Instant::now().as_millis(),
                sender: Some(received.info.src_address),
                rssi_dbm: i16::try_from(received.info.rx_control.rssi).ok(),
                snr_db: None,
            },
        })
    }
}

/// Funk-Link eines Knotens
///
/// Standalone-Knoten starten den Funk gar nicht erst.
pub enum RadioLink<'a> {
    EspNow(EspNowTransport<'a>),
    Offline(NullTransport),
}

impl Transport for RadioLink<'_> {
    fn send(&mut self, frame: &[u8]) -> Result<(), SendError> {
        match self {
            RadioLink::EspNow(link) => link.send(frame),
            RadioLink::Offline(link) => link.send(frame),
        }
    }

    fn poll_receive(&mut self) -> Option<Received> {
        match self {
            RadioLink::EspNow(link) => link.poll_receive(),
            RadioLink::Offline(link) => link.poll_receive(),
        }
    }
}
